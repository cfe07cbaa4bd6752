//! Scene nodes and their local transforms

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use smallvec::SmallVec;

use super::material::Material;
use crate::procedural::Mesh;

/// Handle to a node in a [`SceneGraph`](super::SceneGraph).
///
/// Freed slots are reused with a bumped generation, so a handle to a removed
/// node stays invalid even after its slot holds a new node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}v{}", self.index, self.generation)
        }
    }
}

/// Translation, rotation and scale relative to the parent node
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decompose an affine matrix. Shear is lost.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }
}

/// Role of a node in the monster scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    /// Scene root (camera space owner)
    Root,
    /// Group holding the body and every attached part
    MonsterRoot,
    Body,
    /// Placement transform of a part
    PartOuter,
    /// Rotate/scale transform of a part
    PartInner,
    /// Visible geometry belonging to a part
    PartMesh,
    /// Drag preview, outside the monster hierarchy
    Ghost,
    Ground,
}

/// Geometry and material drawn at a node
#[derive(Clone, Debug)]
pub struct MeshInstance {
    pub mesh: Arc<Mesh>,
    pub material: Material,
    /// Cached local-space bounding sphere for ray rejection
    pub bounds: (Vec3, f32),
}

impl MeshInstance {
    pub fn new(mesh: Arc<Mesh>, material: Material) -> Self {
        let bounds = mesh.bounding_sphere();
        Self {
            mesh,
            material,
            bounds,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
    pub mesh: Option<MeshInstance>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
}

impl Node {
    pub fn group(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::IDENTITY,
            visible: true,
            mesh: None,
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn mesh(
        name: impl Into<String>,
        kind: NodeKind,
        mesh: Arc<Mesh>,
        material: Material,
    ) -> Self {
        Self {
            mesh: Some(MeshInstance::new(mesh, material)),
            ..Self::group(name, kind)
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn material(&self) -> Option<&Material> {
        self.mesh.as_ref().map(|m| &m.material)
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        self.mesh.as_mut().map(|m| &mut m.material)
    }
}
