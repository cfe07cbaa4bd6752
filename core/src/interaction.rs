//! Pointer-driven editing
//!
//! A small state machine over [`Monster`]: dragging new parts in from the
//! toolbar, moving attached parts between surfaces, selection highlighting
//! and the per-part adjustment controls. Every operation returns the events
//! the UI needs to react to.

use glam::{Quat, Vec3};
use tracing::{debug, info};

use crate::monster::{Monster, PartAdjustment, Surface};
use crate::parts::PartKind;
use crate::raycast::{Ray, RayHit};
use crate::scene::{Material, NodeId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    Idle,
    /// Dragging a new part in from the toolbar
    PlacingNew { kind: PartKind, ghost: NodeId },
    /// Dragging an attached part to a new spot
    Moving { part: NodeId },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Body,
    Part { outer: NodeId, inner: NodeId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationAxis {
    Y,
    Z,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    SelectionChanged(Selection),
    PartPlaced(NodeId),
    PartReparented {
        part: NodeId,
        from: Surface,
        to: Surface,
    },
    GhostDiscarded,
    PartDeleted(NodeId),
}

#[derive(Debug, Default)]
pub struct Interaction {
    mode: DragMode,
    selection: Selection,
    target: Option<Surface>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Surface the current drag would drop onto
    pub fn target(&self) -> Option<Surface> {
        self.target
    }

    pub fn is_dragging(&self) -> bool {
        self.mode != DragMode::Idle
    }

    pub fn is_placing(&self) -> bool {
        matches!(self.mode, DragMode::PlacingNew { .. })
    }

    // =============================================================
    // Dragging
    // =============================================================

    /// Begin dragging a new part. Ignored while a placement is in progress.
    pub fn start_drag_new(&mut self, monster: &mut Monster, kind: PartKind) -> Vec<InteractionEvent> {
        if self.is_placing() {
            return Vec::new();
        }
        let events = self.deselect(monster);
        let ghost = monster.spawn_ghost(kind);
        self.mode = DragMode::PlacingNew { kind, ghost };
        self.target = None;
        debug!("placing new {kind} (ghost {ghost})");
        events
    }

    /// Press on the viewport: pick up a part, or clear the selection
    pub fn pointer_down(&mut self, monster: &mut Monster, ray: &Ray) -> Vec<InteractionEvent> {
        if self.is_dragging() {
            return Vec::new();
        }

        let hits = monster.graph().raycast(ray, monster.root());
        let part = hits
            .first()
            .and_then(|hit| monster.part_owning(hit.node))
            .filter(|&part| monster.is_attached_part(part));

        match part {
            Some(part) => {
                let events = self.select_part(monster, part);
                self.mode = DragMode::Moving { part };
                self.target = monster.owner_of(part);
                events
            }
            None => self.deselect(monster),
        }
    }

    /// Track the pointer while dragging, snapping the dragged node onto the
    /// first surface under the ray
    pub fn pointer_move(&mut self, monster: &mut Monster, ray: &Ray) {
        let (dragged, ghost) = match self.mode {
            DragMode::Idle => return,
            DragMode::PlacingNew { ghost, .. } => (ghost, true),
            DragMode::Moving { part } => (part, false),
        };

        let hits = monster.graph().raycast(ray, monster.root());
        let found = hits.iter().find_map(|hit| {
            if monster.graph().is_descendant(hit.node, dragged) {
                return None;
            }
            monster.surface_of(hit.node).map(|surface| (surface, hit))
        });

        let Some((surface, hit)) = found else {
            self.target = None;
            if ghost {
                monster.graph_mut().set_visible(dragged, false);
            }
            return;
        };

        let (position, rotation) = surface_pose(hit, monster.penetration_depth());
        let graph = monster.graph_mut();
        graph.set_world_pose(dragged, position, rotation);
        if ghost {
            graph.set_visible(dragged, true);
        }
        self.target = Some(surface);
    }

    /// Release: drop the ghost or finish moving a part
    pub fn pointer_up(&mut self, monster: &mut Monster) -> Vec<InteractionEvent> {
        let mode = std::mem::take(&mut self.mode);
        let target = self.target.take();
        let mut events = Vec::new();

        match mode {
            DragMode::Idle => {}
            DragMode::PlacingNew { kind, ghost } => {
                let visible = monster.graph().is_visible_in_world(ghost);
                if let (true, Some(surface)) = (visible, target) {
                    let world = monster.graph().world_matrix(ghost);
                    let (_, rotation, position) = world.to_scale_rotation_translation();
                    if let Some(part) = monster.spawn_part(kind, surface) {
                        monster.graph_mut().set_world_pose(part, position, rotation);
                        info!("Placed {kind} on {surface:?}");
                        events.push(InteractionEvent::PartPlaced(part));
                        events.extend(self.select_part(monster, part));
                    }
                }
                monster.discard_ghost(ghost);
                events.push(InteractionEvent::GhostDiscarded);
            }
            DragMode::Moving { part } => {
                let from = monster.owner_of(part);
                if let (Some(from), Some(to)) = (from, target)
                    && from != to
                    && monster.reattach(part, to)
                {
                    info!("Moved part {part} from {from:?} to {to:?}");
                    events.push(InteractionEvent::PartReparented { part, from, to });
                }
            }
        }
        events
    }

    /// Abandon the current drag. A new part is dropped without being placed.
    pub fn cancel_drag(&mut self, monster: &mut Monster) -> Vec<InteractionEvent> {
        let mode = std::mem::take(&mut self.mode);
        self.target = None;
        match mode {
            DragMode::PlacingNew { ghost, .. } => {
                monster.discard_ghost(ghost);
                vec![InteractionEvent::GhostDiscarded]
            }
            _ => Vec::new(),
        }
    }

    // =============================================================
    // Selection
    // =============================================================

    /// Select the body (opens the skin controls)
    pub fn select_body(&mut self, monster: &mut Monster) -> Vec<InteractionEvent> {
        self.clear_highlight(monster);
        self.selection = Selection::Body;
        vec![InteractionEvent::SelectionChanged(self.selection)]
    }

    /// Select an attached part and light up its glowing meshes
    pub fn select_part(&mut self, monster: &mut Monster, part: NodeId) -> Vec<InteractionEvent> {
        let Some(inner) = monster
            .part_info(part)
            .filter(|info| info.attached)
            .map(|info| info.inner)
        else {
            return Vec::new();
        };
        self.clear_highlight(monster);
        monster
            .graph_mut()
            .for_each_material(part, Material::highlight);
        self.selection = Selection::Part { outer: part, inner };
        vec![InteractionEvent::SelectionChanged(self.selection)]
    }

    pub fn deselect(&mut self, monster: &mut Monster) -> Vec<InteractionEvent> {
        self.clear_highlight(monster);
        if self.selection == Selection::None {
            return Vec::new();
        }
        self.selection = Selection::None;
        vec![InteractionEvent::SelectionChanged(Selection::None)]
    }

    fn clear_highlight(&self, monster: &mut Monster) {
        let root = monster.root();
        monster
            .graph_mut()
            .for_each_material(root, Material::clear_emissive);
    }

    fn selected_part(&self) -> Option<NodeId> {
        match self.selection {
            Selection::Part { outer, .. } => Some(outer),
            _ => None,
        }
    }

    // =============================================================
    // Part controls
    // =============================================================

    /// Delete the selected part and everything attached to it
    pub fn delete_selected(&mut self, monster: &mut Monster) -> Vec<InteractionEvent> {
        let Some(part) = self.selected_part() else {
            return Vec::new();
        };
        let mut events = self.deselect(monster);
        if monster.remove_part(part) {
            info!("Deleted part {part}");
            events.push(InteractionEvent::PartDeleted(part));
        }
        events
    }

    /// Set the absolute rotation of the selected part around one axis
    pub fn rotate_selected(&mut self, monster: &mut Monster, axis: RotationAxis, degrees: f32) {
        self.adjust_selected(monster, |adjustment| match axis {
            RotationAxis::Y => adjustment.yaw_deg = degrees,
            RotationAxis::Z => adjustment.roll_deg = degrees,
        });
    }

    /// Set the absolute uniform scale of the selected part
    pub fn scale_selected(&mut self, monster: &mut Monster, scale: f32) {
        self.adjust_selected(monster, |adjustment| adjustment.scale = scale);
    }

    fn adjust_selected(&self, monster: &mut Monster, f: impl FnOnce(&mut PartAdjustment)) {
        let Some(part) = self.selected_part() else {
            return;
        };
        let Some(mut adjustment) = monster.part_info(part).map(|info| info.adjustment) else {
            return;
        };
        f(&mut adjustment);
        monster.set_adjustment(part, adjustment);
    }

    /// Slider values for the selected part
    pub fn selected_adjustment(&self, monster: &Monster) -> Option<PartAdjustment> {
        let part = self.selected_part()?;
        monster
            .part_info(part)
            .map(|info| info.adjustment.rounded())
    }
}

/// World pose that sinks a part into the surface at `hit`, local +Y along the
/// surface normal
fn surface_pose(hit: &RayHit, depth: f32) -> (Vec3, Quat) {
    let normal = hit.normal.normalize_or(Vec3::Y);
    let position = hit.point - normal * depth;
    (position, Quat::from_rotation_arc(Vec3::Y, normal))
}
