//! Part factory
//!
//! Every part is an outer placement node wrapping an inner adjustment node.
//! The inner node sits `penetration_depth` above the outer origin, which is
//! where the surface is once the outer node has been pushed into the host, so
//! rotating and scaling the inner node pivots at the surface.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use tracing::debug;

use crate::procedural::{
    Bevel, Mesh, QuadraticPath, deform, extrude_outline, generate_capsule, generate_cone,
    generate_cylinder, generate_disc, generate_sphere,
};
use crate::scene::{Material, Node, NodeId, NodeKind, Rgb, SceneGraph, Transform};

/// Base colour shared by the body and the skin-coloured parts
pub const MONSTER_COLOR: u32 = 0x89d6f1;
/// Roughness of the toy material
pub const TOY_ROUGHNESS: f32 = 0.6;
/// How far a part is sunk into its host surface
pub const PENETRATION_DEPTH: f32 = 0.15;
/// Opacity of the drag preview
pub const GHOST_OPACITY: f32 = 0.5;

const LIP_COLOR: u32 = 0xe63e62;
const PUPIL_COLOR: u32 = 0x333333;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartKind {
    Eye,
    Mouth,
    Arm,
    Leg,
    Ear,
    Horn,
}

impl PartKind {
    pub const ALL: [PartKind; 6] = [
        PartKind::Eye,
        PartKind::Mouth,
        PartKind::Arm,
        PartKind::Leg,
        PartKind::Ear,
        PartKind::Horn,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PartKind::Eye => "Eye",
            PartKind::Mouth => "Mouth",
            PartKind::Arm => "Arm",
            PartKind::Leg => "Leg",
            PartKind::Ear => "Ear",
            PartKind::Horn => "Horn",
        }
    }

    fn id(self) -> &'static str {
        match self {
            PartKind::Eye => "eye",
            PartKind::Mouth => "mouth",
            PartKind::Arm => "arm",
            PartKind::Leg => "leg",
            PartKind::Ear => "ear",
            PartKind::Horn => "horn",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PartKind::ALL
            .into_iter()
            .find(|k| k.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown part kind '{s}'"))
    }
}

/// Mouth variant used for newly created mouths
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouthStyle {
    #[default]
    Lips,
    Fangs,
}

impl MouthStyle {
    pub fn label(self) -> &'static str {
        match self {
            MouthStyle::Lips => "Lips",
            MouthStyle::Fangs => "Fangs",
        }
    }
}

impl FromStr for MouthStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lips" => Ok(MouthStyle::Lips),
            "fangs" => Ok(MouthStyle::Fangs),
            other => Err(format!("unknown mouth style '{other}'")),
        }
    }
}

/// Handles to a freshly built part
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartNodes {
    pub outer: NodeId,
    pub inner: NodeId,
}

/// Shared geometry, built once
#[derive(Debug)]
struct PartMeshes {
    sclera: Arc<Mesh>,
    pupil: Arc<Mesh>,
    eye_highlight: Arc<Mesh>,
    upper_lip: Arc<Mesh>,
    lower_lip: Arc<Mesh>,
    fang: Arc<Mesh>,
    arm: Arc<Mesh>,
    palm: Arc<Mesh>,
    finger: Arc<Mesh>,
    leg: Arc<Mesh>,
    foot: Arc<Mesh>,
    toe: Arc<Mesh>,
    ear: Arc<Mesh>,
    horn: Arc<Mesh>,
}

impl PartMeshes {
    fn new() -> Self {
        let lip_bevel = Some(Bevel {
            thickness: 0.02,
            size: 0.02,
        });

        // M-shaped upper lip
        let upper = QuadraticPath::new(Vec2::new(-0.12, 0.0))
            .quad_to(Vec2::new(-0.06, 0.08), Vec2::new(0.0, 0.03))
            .quad_to(Vec2::new(0.06, 0.08), Vec2::new(0.12, 0.0))
            .quad_to(Vec2::new(0.0, 0.02), Vec2::new(-0.12, 0.0))
            .sample(12);
        // U-shaped lower lip
        let lower = QuadraticPath::new(Vec2::new(-0.12, -0.01))
            .quad_to(Vec2::new(0.0, 0.01), Vec2::new(0.12, -0.01))
            .quad_to(Vec2::new(0.0, -0.1), Vec2::new(-0.12, -0.01))
            .sample(12);

        let mut arm = generate_cylinder(0.12, 0.08, 0.6, 32);
        arm.translate(Vec3::new(0.0, 0.3, 0.0));

        let mut leg = generate_cylinder(0.16, 0.12, 0.5, 32);
        leg.translate(Vec3::new(0.0, 0.25, 0.0));

        let mut ear = generate_sphere(0.15, 32, 32);
        ear.scale(Vec3::new(1.0, 1.0, 0.4));

        let mut horn = generate_cone(0.08, 0.35, 32, 10);
        horn.translate(Vec3::new(0.0, 0.175, 0.0));
        horn.deform(|v| deform::bend(v, 1.5));

        Self {
            sclera: Arc::new(generate_sphere(0.25, 32, 32)),
            pupil: Arc::new(generate_sphere(0.12, 32, 32)),
            eye_highlight: Arc::new(generate_disc(0.04, 16)),
            upper_lip: Arc::new(extrude_outline(&upper, 0.04, lip_bevel)),
            lower_lip: Arc::new(extrude_outline(&lower, 0.04, lip_bevel)),
            fang: Arc::new(generate_cone(0.025, 0.08, 16, 1)),
            arm: Arc::new(arm),
            palm: Arc::new(generate_sphere(0.14, 32, 32)),
            finger: Arc::new(generate_capsule(0.035, 0.12, 16, 4)),
            leg: Arc::new(leg),
            foot: Arc::new(generate_sphere(0.2, 32, 32)),
            toe: Arc::new(generate_sphere(0.08, 16, 16)),
            ear: Arc::new(ear),
            horn: Arc::new(horn),
        }
    }
}

/// Builds part hierarchies into a [`SceneGraph`]
#[derive(Debug)]
pub struct PartsRepository {
    style: MouthStyle,
    penetration_depth: f32,
    meshes: PartMeshes,
}

impl Default for PartsRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects the nodes of one part while it is being built
struct PartBuilder<'a> {
    graph: &'a mut SceneGraph,
    ghost: bool,
}

impl PartBuilder<'_> {
    fn material(&self, material: Material) -> Material {
        if self.ghost {
            material.with_opacity(GHOST_OPACITY)
        } else {
            material
        }
    }

    fn mesh(
        &mut self,
        parent: NodeId,
        name: &str,
        mesh: &Arc<Mesh>,
        material: Material,
        transform: Transform,
    ) -> NodeId {
        let material = self.material(material);
        self.graph.add_node(
            parent,
            Node::mesh(name, NodeKind::PartMesh, mesh.clone(), material).with_transform(transform),
        )
    }

    fn group(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.graph.add_node(parent, Node::group(name, NodeKind::Group))
    }
}

fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_translation(Vec3::new(x, y, z))
}

fn toy() -> Material {
    Material::standard(Rgb::from_hex(MONSTER_COLOR), TOY_ROUGHNESS)
}

impl PartsRepository {
    pub fn new() -> Self {
        Self {
            style: MouthStyle::default(),
            penetration_depth: PENETRATION_DEPTH,
            meshes: PartMeshes::new(),
        }
    }

    pub fn style(&self) -> MouthStyle {
        self.style
    }

    pub fn set_style(&mut self, style: MouthStyle) {
        self.style = style;
    }

    pub fn penetration_depth(&self) -> f32 {
        self.penetration_depth
    }

    /// Build a part of `kind` under `parent`.
    ///
    /// Ghost parts get a translucent copy of every material and a
    /// [`NodeKind::Ghost`] outer node.
    pub fn build(
        &self,
        graph: &mut SceneGraph,
        parent: NodeId,
        kind: PartKind,
        ghost: bool,
    ) -> PartNodes {
        let outer_kind = if ghost {
            NodeKind::Ghost
        } else {
            NodeKind::PartOuter
        };
        let outer = graph.add_node(parent, Node::group(kind.label(), outer_kind));
        let inner = graph.add_node(
            outer,
            Node::group(format!("{} inner", kind.label()), NodeKind::PartInner)
                .with_transform(at(0.0, self.penetration_depth, 0.0)),
        );

        let mut builder = PartBuilder { graph, ghost };
        match kind {
            PartKind::Eye => self.build_eye(&mut builder, inner),
            PartKind::Mouth => self.build_mouth(&mut builder, inner),
            PartKind::Arm => self.build_arm(&mut builder, inner),
            PartKind::Leg => self.build_leg(&mut builder, inner),
            PartKind::Ear => self.build_ear(&mut builder, inner),
            PartKind::Horn => self.build_horn(&mut builder, inner),
        }

        debug!("built {kind} part {outer} (ghost: {ghost})");
        PartNodes { outer, inner }
    }

    fn build_eye(&self, b: &mut PartBuilder<'_>, inner: NodeId) {
        let m = &self.meshes;
        b.mesh(
            inner,
            "sclera",
            &m.sclera,
            Material::standard(Rgb::WHITE, 0.2).glowing(),
            at(0.0, 0.05, 0.0),
        );
        b.mesh(
            inner,
            "pupil",
            &m.pupil,
            Material::standard(Rgb::from_hex(PUPIL_COLOR), 0.1),
            at(0.0, 0.27, 0.0).with_scale(Vec3::new(1.0, 0.3, 1.0)),
        );
        b.mesh(
            inner,
            "highlight",
            &m.eye_highlight,
            Material::basic(Rgb::WHITE, 0.8),
            at(0.08, 0.30, 0.08).with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
        );
    }

    fn build_mouth(&self, b: &mut PartBuilder<'_>, inner: NodeId) {
        let m = &self.meshes;
        let lip = || Material::standard(Rgb::from_hex(LIP_COLOR), 0.4).glowing();
        let flat = at(0.0, -0.02, 0.01).with_rotation(Quat::from_rotation_x(-FRAC_PI_2));

        b.mesh(inner, "upper lip", &m.upper_lip, lip(), flat);
        b.mesh(inner, "lower lip", &m.lower_lip, lip(), flat);

        if self.style == MouthStyle::Fangs {
            for x in [-0.06, 0.06] {
                b.mesh(
                    inner,
                    "fang",
                    &m.fang,
                    Material::standard(Rgb::WHITE, 0.2),
                    at(x, 0.0, 0.03).with_rotation(Quat::from_rotation_x(PI)),
                );
            }
        }
    }

    fn build_arm(&self, b: &mut PartBuilder<'_>, inner: NodeId) {
        let m = &self.meshes;
        b.mesh(inner, "arm", &m.arm, toy().glowing(), at(0.0, -0.15, 0.0));
        b.mesh(
            inner,
            "palm",
            &m.palm,
            toy().glowing(),
            at(0.0, 0.50, 0.0).with_scale(Vec3::new(1.0, 0.8, 0.6)),
        );

        let fingers = b.group(inner, "fingers");
        for (x, y, roll) in [(0.0, 0.63, 0.0), (-0.08, 0.60, 0.3), (0.08, 0.60, -0.3)] {
            b.mesh(
                fingers,
                "finger",
                &m.finger,
                toy().glowing(),
                at(x, y, 0.0).with_rotation(Quat::from_rotation_z(roll)),
            );
        }
    }

    fn build_leg(&self, b: &mut PartBuilder<'_>, inner: NodeId) {
        let m = &self.meshes;
        b.mesh(inner, "leg", &m.leg, toy().glowing(), at(0.0, -0.15, 0.0));
        b.mesh(
            inner,
            "foot",
            &m.foot,
            toy().glowing(),
            at(0.0, 0.35, 0.1).with_scale(Vec3::new(1.0, 0.7, 1.5)),
        );

        let toes = b.group(inner, "toes");
        for (x, z) in [(0.0, 0.4), (-0.12, 0.35), (0.12, 0.35)] {
            b.mesh(toes, "toe", &m.toe, toy().glowing(), at(x, 0.30, z));
        }
    }

    fn build_ear(&self, b: &mut PartBuilder<'_>, inner: NodeId) {
        b.mesh(
            inner,
            "ear",
            &self.meshes.ear,
            toy().glowing(),
            at(0.0, 0.05, 0.0),
        );
    }

    fn build_horn(&self, b: &mut PartBuilder<'_>, inner: NodeId) {
        b.mesh(
            inner,
            "horn",
            &self.meshes.horn,
            toy().glowing(),
            at(0.0, -0.05, 0.0),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_count(graph: &SceneGraph, root: NodeId) -> usize {
        graph
            .descendants(root)
            .into_iter()
            .filter(|&n| graph.node(n).is_some_and(|n| n.mesh.is_some()))
            .count()
    }

    #[test]
    fn test_part_kind_parse() {
        assert_eq!("Horn".parse::<PartKind>(), Ok(PartKind::Horn));
        assert_eq!(" eye ".parse::<PartKind>(), Ok(PartKind::Eye));
        assert!("tail".parse::<PartKind>().is_err());
        for kind in PartKind::ALL {
            assert_eq!(kind.to_string().parse::<PartKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_mouth_style_parse() {
        assert_eq!("FANGS".parse::<MouthStyle>(), Ok(MouthStyle::Fangs));
        assert!("beak".parse::<MouthStyle>().is_err());
    }

    #[test]
    fn test_inner_node_offset() {
        let repo = PartsRepository::new();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let nodes = repo.build(&mut graph, root, PartKind::Arm, false);
        assert_eq!(graph.parent(nodes.inner), Some(nodes.outer));
        let inner = graph.node(nodes.inner).map(|n| n.transform.translation);
        assert_eq!(inner, Some(Vec3::new(0.0, PENETRATION_DEPTH, 0.0)));
        assert_eq!(graph.node(nodes.outer).map(|n| n.kind), Some(NodeKind::PartOuter));
    }

    #[test]
    fn test_mesh_counts_per_kind() {
        let repo = PartsRepository::new();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let expected = [
            (PartKind::Eye, 3),
            (PartKind::Mouth, 2),
            (PartKind::Arm, 5),
            (PartKind::Leg, 5),
            (PartKind::Ear, 1),
            (PartKind::Horn, 1),
        ];
        for (kind, count) in expected {
            let nodes = repo.build(&mut graph, root, kind, false);
            assert_eq!(mesh_count(&graph, nodes.outer), count, "{kind}");
        }
    }

    #[test]
    fn test_fangs_style_adds_teeth() {
        let mut repo = PartsRepository::new();
        repo.set_style(MouthStyle::Fangs);
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let nodes = repo.build(&mut graph, root, PartKind::Mouth, false);
        assert_eq!(mesh_count(&graph, nodes.outer), 4);
    }

    #[test]
    fn test_ghost_is_translucent() {
        let repo = PartsRepository::new();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let nodes = repo.build(&mut graph, root, PartKind::Eye, true);
        assert_eq!(graph.node(nodes.outer).map(|n| n.kind), Some(NodeKind::Ghost));
        for n in graph.descendants(nodes.outer) {
            if let Some(material) = graph.node(n).and_then(Node::material) {
                assert_eq!(material.opacity, GHOST_OPACITY);
            }
        }
    }

    #[test]
    fn test_every_kind_has_glowing_mesh() {
        let repo = PartsRepository::new();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        for kind in PartKind::ALL {
            let nodes = repo.build(&mut graph, root, kind, false);
            let glows = graph
                .descendants(nodes.outer)
                .into_iter()
                .filter_map(|n| graph.node(n).and_then(Node::material))
                .any(|m| m.can_glow);
            assert!(glows, "{kind}");
        }
    }
}
