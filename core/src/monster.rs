//! Monster model
//!
//! Owns the scene graph: a scene root holding the monster root group (body
//! plus attached parts), the ground shadow and, while dragging, a ghost part.
//! Per-part bookkeeping lives in a side table keyed by the part's outer node.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use glam::{EulerRot, Quat, Vec2, Vec3};
use hashbrown::HashMap;
use tracing::{debug, info};

use crate::capture::{DEFAULT_REPEAT, SkinTexture};
use crate::parts::{MONSTER_COLOR, MouthStyle, PartKind, PartNodes, PartsRepository, TOY_ROUGHNESS};
use crate::procedural::{Mesh, deform, generate_disc, generate_rounded_box, generate_sphere};
use crate::scene::{Material, Node, NodeId, NodeKind, Rgb, SceneGraph, Transform};

/// Body colour once a skin is applied, so the photo shows through
pub const SKIN_BASE_COLOR: u32 = 0xeeeeee;
/// Height of the ground shadow
pub const GROUND_Y: f32 = -1.3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyShape {
    #[default]
    Waterdrop,
    Peanut,
    Cube,
}

impl BodyShape {
    pub const ALL: [BodyShape; 3] = [BodyShape::Waterdrop, BodyShape::Peanut, BodyShape::Cube];

    pub fn label(self) -> &'static str {
        match self {
            BodyShape::Waterdrop => "Waterdrop",
            BodyShape::Peanut => "Peanut",
            BodyShape::Cube => "Cube",
        }
    }

    /// Deformed body mesh with recomputed normals
    pub fn generate(self) -> Mesh {
        match self {
            BodyShape::Waterdrop => {
                let mut mesh = generate_sphere(1.2, 64, 64);
                mesh.deform(deform::waterdrop);
                mesh
            }
            BodyShape::Peanut => {
                let mut mesh = generate_sphere(1.1, 64, 64);
                mesh.deform(deform::peanut);
                mesh
            }
            BodyShape::Cube => {
                let mut mesh = generate_rounded_box(1.6, 2.2, 1.0, 16, 0.4);
                mesh.deform(deform::tapered_box);
                mesh
            }
        }
    }
}

impl fmt::Display for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_ascii_lowercase())
    }
}

impl FromStr for BodyShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waterdrop" => Ok(BodyShape::Waterdrop),
            "peanut" => Ok(BodyShape::Peanut),
            "cube" => Ok(BodyShape::Cube),
            other => Err(format!(
                "unknown body shape '{other}' (expected waterdrop, peanut or cube)"
            )),
        }
    }
}

/// Something a part can be attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The body; parts attach to the monster root
    Body,
    /// Another part (its outer node); parts attach to its inner node
    Part(NodeId),
}

/// Local rotate/scale controls of a part, in slider units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartAdjustment {
    pub yaw_deg: f32,
    pub roll_deg: f32,
    pub scale: f32,
}

impl Default for PartAdjustment {
    fn default() -> Self {
        Self {
            yaw_deg: 0.0,
            roll_deg: 0.0,
            scale: 1.0,
        }
    }
}

impl PartAdjustment {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            0.0,
            self.yaw_deg.to_radians(),
            self.roll_deg.to_radians(),
        )
    }

    /// Degrees rounded to whole numbers, as shown on the sliders
    pub fn rounded(&self) -> Self {
        Self {
            yaw_deg: self.yaw_deg.round(),
            roll_deg: self.roll_deg.round(),
            scale: self.scale,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartInfo {
    pub kind: PartKind,
    pub inner: NodeId,
    /// False for drag previews
    pub attached: bool,
    pub adjustment: PartAdjustment,
}

/// Skin panel values
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkinSettings {
    pub brightness: f32,
    pub offset_y: f32,
    pub repeat: f32,
}

impl Default for SkinSettings {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            offset_y: 0.0,
            repeat: DEFAULT_REPEAT,
        }
    }
}

pub struct Monster {
    graph: SceneGraph,
    shape: BodyShape,
    root: NodeId,
    body: NodeId,
    ground: NodeId,
    repository: PartsRepository,
    parts: HashMap<NodeId, PartInfo>,
    skin: SkinSettings,
    /// Idle breathing animation
    pub breathing: bool,
}

impl Monster {
    pub fn new(shape: BodyShape) -> Self {
        let mut graph = SceneGraph::new();
        let scene = graph.root();

        let root = graph.add_node(scene, Node::group("Monster", NodeKind::MonsterRoot));
        let body = graph.add_node(
            root,
            Node::mesh(
                "Body",
                NodeKind::Body,
                Arc::new(shape.generate()),
                Material::standard(Rgb::from_hex(MONSTER_COLOR), TOY_ROUGHNESS),
            ),
        );

        // Flat disc on the floor, outside the monster so it never breathes or gets hit
        let ground = graph.add_node(
            scene,
            Node::mesh(
                "Shadow",
                NodeKind::Ground,
                Arc::new(generate_disc(5.0, 64)),
                Material::basic(Rgb::BLACK, 0.1),
            )
            .with_transform(
                Transform::from_translation(Vec3::new(0.0, GROUND_Y, 0.0))
                    .with_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
            ),
        );

        info!("Created {shape} monster");
        Self {
            graph,
            shape,
            root,
            body,
            ground,
            repository: PartsRepository::new(),
            parts: HashMap::new(),
            skin: SkinSettings::default(),
            breathing: true,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn shape(&self) -> BodyShape {
        self.shape
    }

    /// Monster root group (body and attached parts)
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn ground(&self) -> NodeId {
        self.ground
    }

    pub fn penetration_depth(&self) -> f32 {
        self.repository.penetration_depth()
    }

    pub fn mouth_style(&self) -> MouthStyle {
        self.repository.style()
    }

    /// Style used for mouths created from now on
    pub fn set_mouth_style(&mut self, style: MouthStyle) {
        self.repository.set_style(style);
    }

    // =============================================================
    // Parts
    // =============================================================

    /// Create a hidden drag preview under the scene root
    pub fn spawn_ghost(&mut self, kind: PartKind) -> NodeId {
        let scene = self.graph.root();
        let nodes = self.repository.build(&mut self.graph, scene, kind, true);
        self.graph.set_visible(nodes.outer, false);
        self.register(kind, nodes, false);
        nodes.outer
    }

    /// Remove a drag preview. Attached parts are left alone.
    pub fn discard_ghost(&mut self, ghost: NodeId) {
        if self.parts.get(&ghost).is_some_and(|info| !info.attached) {
            self.remove_tracked(ghost);
        }
    }

    /// Create an attached part on `surface`
    pub fn spawn_part(&mut self, kind: PartKind, surface: Surface) -> Option<NodeId> {
        let parent = self.surface_node(surface)?;
        let nodes = self.repository.build(&mut self.graph, parent, kind, false);
        self.register(kind, nodes, true);
        Some(nodes.outer)
    }

    fn register(&mut self, kind: PartKind, nodes: PartNodes, attached: bool) {
        self.parts.insert(
            nodes.outer,
            PartInfo {
                kind,
                inner: nodes.inner,
                attached,
                adjustment: PartAdjustment::default(),
            },
        );
    }

    /// Remove a part and everything attached to it. Returns false if `part`
    /// is not an attached part.
    pub fn remove_part(&mut self, part: NodeId) -> bool {
        if !self.is_attached_part(part) {
            return false;
        }
        self.remove_tracked(part);
        true
    }

    fn remove_tracked(&mut self, outer: NodeId) {
        for node in self.graph.descendants(outer) {
            self.parts.remove(&node);
        }
        let removed = self.graph.remove_subtree(outer);
        debug!("removed part {outer} ({removed} nodes)");
    }

    pub fn is_attached_part(&self, id: NodeId) -> bool {
        self.parts.get(&id).is_some_and(|info| info.attached)
    }

    /// Attached parts in hierarchy order
    pub fn parts(&self) -> Vec<NodeId> {
        self.graph
            .descendants(self.root)
            .into_iter()
            .filter(|id| self.is_attached_part(*id))
            .collect()
    }

    pub fn part_info(&self, part: NodeId) -> Option<&PartInfo> {
        self.parts.get(&part)
    }

    /// Nearest part outer node at or above `node` (ghosts included)
    pub fn part_owning(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.parts.contains_key(&id) {
                return Some(id);
            }
            if id == self.root {
                return None;
            }
            current = self.graph.parent(id);
        }
        None
    }

    /// Surface a part dropped on `node` would attach to
    pub fn surface_of(&self, node: NodeId) -> Option<Surface> {
        if node == self.body {
            return Some(Surface::Body);
        }
        let part = self.part_owning(node)?;
        self.is_attached_part(part).then_some(Surface::Part(part))
    }

    /// Node that owns parts attached to `surface`
    pub fn surface_node(&self, surface: Surface) -> Option<NodeId> {
        match surface {
            Surface::Body => Some(self.root),
            Surface::Part(part) => self
                .parts
                .get(&part)
                .filter(|info| info.attached)
                .map(|info| info.inner),
        }
    }

    /// Surface currently holding `part`
    pub fn owner_of(&self, part: NodeId) -> Option<Surface> {
        if !self.is_attached_part(part) {
            return None;
        }
        let parent = self.graph.parent(part)?;
        if parent == self.root {
            return Some(Surface::Body);
        }
        self.part_owning(parent).map(Surface::Part)
    }

    /// Move an attached part to another surface, keeping its world pose.
    ///
    /// Refuses surfaces inside the part's own subtree.
    pub fn reattach(&mut self, part: NodeId, surface: Surface) -> bool {
        if !self.is_attached_part(part) {
            return false;
        }
        let Some(parent) = self.surface_node(surface) else {
            return false;
        };
        self.graph.attach(part, parent)
    }

    pub fn set_adjustment(&mut self, part: NodeId, adjustment: PartAdjustment) {
        let Some(info) = self.parts.get_mut(&part) else {
            return;
        };
        let scale = if adjustment.scale.is_finite() {
            adjustment.scale.max(0.01)
        } else {
            1.0
        };
        info.adjustment = PartAdjustment {
            scale,
            ..adjustment
        };
        let rotation = info.adjustment.rotation();
        let inner = info.inner;
        if let Some(node) = self.graph.node_mut(inner) {
            node.transform.rotation = rotation;
            node.transform.scale = Vec3::splat(scale);
        }
    }

    // =============================================================
    // Animation
    // =============================================================

    /// Breathing: gentle uniform scale and bob of the monster root
    pub fn update(&mut self, time: f32) {
        if !self.breathing {
            return;
        }
        let scale = 1.0 + (time * 2.0).sin() * 0.01;
        let y = time.sin() * 0.03;
        if let Some(node) = self.graph.node_mut(self.root) {
            node.transform.scale = Vec3::splat(scale);
            node.transform.translation.y = y;
        }
    }

    // =============================================================
    // Skin
    // =============================================================

    fn body_material_mut(&mut self) -> Option<&mut Material> {
        self.graph.node_mut(self.body).and_then(Node::material_mut)
    }

    pub fn body_material(&self) -> Option<&Material> {
        self.graph.node(self.body).and_then(Node::material)
    }

    /// Put a captured photo on the body and reset the skin controls
    pub fn apply_skin(&mut self, mut skin: SkinTexture) {
        self.skin = SkinSettings::default();
        skin.repeat = self.skin.repeat;
        skin.offset = Vec2::ZERO;
        if let Some(material) = self.body_material_mut() {
            material.skin = Some(skin);
            material.color = Rgb::from_hex(SKIN_BASE_COLOR);
        }
        info!("Applied skin texture to body");
    }

    pub fn has_skin(&self) -> bool {
        self.body_material().is_some_and(|m| m.skin.is_some())
    }

    pub fn skin_settings(&self) -> SkinSettings {
        self.skin
    }

    /// Body colour becomes a grey of this value
    pub fn set_skin_brightness(&mut self, brightness: f32) {
        let brightness = brightness.max(0.0);
        self.skin.brightness = brightness;
        if let Some(material) = self.body_material_mut() {
            material.color = Rgb::new(brightness, brightness, brightness);
        }
    }

    pub fn set_skin_offset_y(&mut self, offset_y: f32) {
        self.skin.offset_y = offset_y;
        if let Some(skin) = self.body_material_mut().and_then(|m| m.skin.as_mut()) {
            skin.offset.y = offset_y;
        }
    }

    pub fn set_skin_repeat(&mut self, repeat: f32) {
        self.skin.repeat = repeat;
        if let Some(skin) = self.body_material_mut().and_then(|m| m.skin.as_mut()) {
            skin.repeat = repeat;
        }
    }
}
