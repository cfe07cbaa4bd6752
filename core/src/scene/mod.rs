//! Transform hierarchy
//!
//! An arena of [`Node`]s linked by parent/child handles. World matrices are
//! computed on demand by walking up the parent chain; the scene is small
//! enough that nothing is cached.
//!
//! [`SceneGraph::attach`] is the single reparenting primitive: it moves a
//! subtree under a new parent while keeping its world-space pose.

mod material;
mod node;

use glam::{Mat4, Quat, Vec3};
use tracing::debug;

pub use material::{HIGHLIGHT_INTENSITY, Material, Rgb};
pub use node::{MeshInstance, Node, NodeId, NodeKind, Transform};

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Clone, Debug)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    /// Indices of empty slots, reused by [`add_node`](Self::add_node)
    free: Vec<u32>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph holding only the scene root
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::group("Scene", NodeKind::Root)),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the root included
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Allocated slots, live or free. Stays flat while parts are spawned
    /// and removed repeatedly.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).and_then(|slot| slot.node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children()).unwrap_or(&[])
    }

    /// Insert `node` as the last child of `parent`.
    ///
    /// A missing parent falls back to the scene root.
    pub fn add_node(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let parent = if self.contains(parent) {
            parent
        } else {
            debug!("add_node: parent {parent} missing, using scene root");
            self.root
        };

        node.parent = Some(parent);
        node.children.clear();
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Remove a node and everything below it. The scene root cannot be removed.
    ///
    /// Returns the number of nodes removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        if id == self.root || !self.contains(id) {
            return 0;
        }

        self.detach(id);
        let doomed = self.descendants(id);
        for &node in &doomed {
            if let Some(slot) = self.slots.get_mut(node.index()) {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
            }
        }
        doomed.len()
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id)
            && let Some(p) = self.node_mut(parent)
        {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    /// `id` and every node below it, in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            // Reverse so the first child is visited first
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// True when `ancestor` is `id` or lies on its parent chain
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Chain from the scene root down to `id` (both included)
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if !self.contains(node) {
                break;
            }
            path.push(node);
            current = self.parent(node);
        }
        path.reverse();
        path
    }

    // =============================================================
    // World-space queries
    // =============================================================

    pub fn local_matrix(&self, id: NodeId) -> Mat4 {
        self.node(id)
            .map(|n| n.transform.matrix())
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Local-to-world matrix of `id`
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        self.path_to(id)
            .into_iter()
            .fold(Mat4::IDENTITY, |acc, node| acc * self.local_matrix(node))
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).w_axis.truncate()
    }

    pub fn world_rotation(&self, id: NodeId) -> Quat {
        let (_, rotation, _) = self.world_matrix(id).to_scale_rotation_translation();
        rotation.normalize()
    }

    pub fn world_scale(&self, id: NodeId) -> Vec3 {
        let (scale, _, _) = self.world_matrix(id).to_scale_rotation_translation();
        scale
    }

    /// Express a world-space point in the local frame of `id`
    pub fn world_to_local(&self, id: NodeId, point: Vec3) -> Vec3 {
        self.world_matrix(id).inverse().transform_point3(point)
    }

    /// Place a node at a world-space position and orientation.
    ///
    /// The pose is converted into the parent's frame; local scale is kept.
    pub fn set_world_pose(&mut self, id: NodeId, position: Vec3, rotation: Quat) {
        let parent_world = self
            .parent(id)
            .map(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY);
        let (_, parent_rotation, _) = parent_world.to_scale_rotation_translation();

        let local_position = parent_world.inverse().transform_point3(position);
        let local_rotation = (parent_rotation.normalize().inverse() * rotation).normalize();

        if let Some(node) = self.node_mut(id) {
            node.transform.translation = local_position;
            node.transform.rotation = local_rotation;
        }
    }

    /// Move `child` under `new_parent`, preserving its world-space pose.
    ///
    /// Returns `false` (leaving the graph untouched) when either node is
    /// missing, when `child` is the scene root, or when `new_parent` lies in
    /// the subtree of `child`.
    pub fn attach(&mut self, child: NodeId, new_parent: NodeId) -> bool {
        if !self.contains(child) || !self.contains(new_parent) || child == self.root {
            return false;
        }
        if self.is_descendant(new_parent, child) {
            debug!("attach: refusing to move {child} under its own subtree");
            return false;
        }

        let child_world = self.world_matrix(child);
        let parent_world = self.world_matrix(new_parent);
        let local = Transform::from_matrix(parent_world.inverse() * child_world);

        self.detach(child);
        if let Some(n) = self.node_mut(child) {
            n.parent = Some(new_parent);
            n.transform = local;
        }
        if let Some(p) = self.node_mut(new_parent) {
            p.children.push(child);
        }
        true
    }

    // =============================================================
    // Visibility
    // =============================================================

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(n) = self.node_mut(id) {
            n.visible = visible;
        }
    }

    /// A node is drawn only when it and all of its ancestors are visible
    pub fn is_visible_in_world(&self, id: NodeId) -> bool {
        let path = self.path_to(id);
        !path.is_empty()
            && path
                .iter()
                .all(|&n| self.node(n).is_some_and(|node| node.visible))
    }

    /// Visible mesh nodes below `root` (root included), paired with their
    /// world matrices
    pub fn visible_meshes(&self, root: NodeId) -> Vec<(NodeId, Mat4)> {
        let mut out = Vec::new();
        if !self.is_visible_in_world(root) {
            return out;
        }
        let base = self
            .parent(root)
            .map(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY);
        self.collect_visible(root, base, &mut out);
        out
    }

    fn collect_visible(&self, id: NodeId, parent_world: Mat4, out: &mut Vec<(NodeId, Mat4)>) {
        let Some(node) = self.node(id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let world = parent_world * node.transform.matrix();
        if node.mesh.is_some() {
            out.push((id, world));
        }
        for &child in node.children() {
            self.collect_visible(child, world, out);
        }
    }

    /// Apply `f` to the material of every mesh below `id` (inclusive)
    pub fn for_each_material(&mut self, id: NodeId, mut f: impl FnMut(&mut Material)) {
        for node in self.descendants(id) {
            if let Some(material) = self.node_mut(node).and_then(Node::material_mut) {
                f(material);
            }
        }
    }
}
