//! Attachment invariants of the monster hierarchy.
//!
//! Parts are stacked on each other with random adjustments so that every
//! part has a distinct world pose, then moved around between surfaces.

use glam::{Mat4, Vec3};
use monster_core::{
    BodyShape, DragMode, Interaction, Monster, NodeId, PartAdjustment, PartKind, Ray, Surface,
};
use proptest::prelude::*;

// =============================================================================
// Helpers
// =============================================================================

fn matrices_close(a: Mat4, b: Mat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| (x - y).abs() < 1e-3)
}

/// Parent of every node in the monster, in hierarchy order
fn hierarchy(monster: &Monster) -> Vec<(NodeId, Option<NodeId>)> {
    let graph = monster.graph();
    graph
        .descendants(graph.root())
        .into_iter()
        .map(|n| (n, graph.parent(n)))
        .collect()
}

fn any_emissive(monster: &Monster) -> bool {
    let graph = monster.graph();
    graph.descendants(graph.root()).into_iter().any(|n| {
        graph
            .node(n)
            .and_then(|node| node.material())
            .is_some_and(|m| m.is_emissive())
    })
}

/// Ray that leaves the scene without touching anything
fn empty_ray() -> Ray {
    Ray::new(Vec3::new(0.0, 0.0, 8.0), Vec3::new(0.3, 1.0, 0.2))
}

fn arb_adjustment() -> impl Strategy<Value = PartAdjustment> {
    (-180.0f32..180.0, -180.0f32..180.0, 0.5f32..2.0).prop_map(|(yaw_deg, roll_deg, scale)| {
        PartAdjustment {
            yaw_deg,
            roll_deg,
            scale,
        }
    })
}

/// Build `adjustments.len()` parts. Part `i` sits on part `hosts[i] % i`
/// (or the body for the first part and when the host index is zero).
fn build_monster(adjustments: &[PartAdjustment], hosts: &[usize]) -> (Monster, Vec<NodeId>) {
    let mut monster = Monster::new(BodyShape::Waterdrop);
    monster.breathing = false;
    let mut parts: Vec<NodeId> = Vec::new();

    for (i, adjustment) in adjustments.iter().enumerate() {
        let surface = match hosts.get(i).copied().unwrap_or(0) {
            h if i == 0 || h % (i + 1) == 0 => Surface::Body,
            h => Surface::Part(parts[h % i]),
        };
        let kind = PartKind::ALL[i % PartKind::ALL.len()];
        let part = monster.spawn_part(kind, surface).unwrap();
        monster.set_adjustment(part, *adjustment);
        parts.push(part);
    }
    (monster, parts)
}

// =============================================================================
// Reparenting
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn proptest_reattach_preserves_pose_and_single_owner(
        adjustments in prop::collection::vec(arb_adjustment(), 2..6),
        hosts in prop::collection::vec(0usize..8, 6),
        moves in prop::collection::vec((0usize..6, 0usize..7), 1..12),
    ) {
        let (mut monster, parts) = build_monster(&adjustments, &hosts);
        let n = parts.len();

        for (part_index, target_index) in moves {
            let part = parts[part_index % n];
            let target = if target_index % (n + 1) == n {
                Surface::Body
            } else {
                Surface::Part(parts[target_index % (n + 1)])
            };

            let before = monster.graph().world_matrix(part);
            let owner_before = monster.owner_of(part);
            let moved = monster.reattach(part, target);

            prop_assert!(matrices_close(before, monster.graph().world_matrix(part)));
            if moved {
                prop_assert_eq!(monster.owner_of(part), Some(target));
            } else {
                prop_assert_eq!(monster.owner_of(part), owner_before);
            }

            // Every part is listed exactly once, under exactly one surface
            prop_assert_eq!(monster.parts().len(), n);
            for &p in &parts {
                let owner = monster.owner_of(p);
                prop_assert!(owner.is_some());
                let holders = parts
                    .iter()
                    .filter_map(|&q| monster.part_info(q).map(|info| info.inner))
                    .chain([monster.root()])
                    .filter(|&holder| monster.graph().children(holder).contains(&p))
                    .count();
                prop_assert_eq!(holders, 1);
            }
        }
    }

    #[test]
    fn proptest_deselect_clears_highlight(
        adjustments in prop::collection::vec(arb_adjustment(), 1..5),
        hosts in prop::collection::vec(0usize..8, 5),
        picks in prop::collection::vec(0usize..6, 1..8),
    ) {
        let (mut monster, parts) = build_monster(&adjustments, &hosts);
        let mut interaction = Interaction::new();

        for pick in picks {
            match parts.get(pick) {
                Some(&part) => {
                    interaction.select_part(&mut monster, part);
                    prop_assert!(any_emissive(&monster));
                }
                None => {
                    interaction.select_body(&mut monster);
                }
            }
        }
        interaction.deselect(&mut monster);
        prop_assert!(!any_emissive(&monster));
    }
}

// =============================================================================
// Drags without a target
// =============================================================================

#[test]
fn test_new_part_drag_without_target_leaves_hierarchy() {
    let adjustments = [PartAdjustment::default(); 3];
    let (mut monster, _) = build_monster(&adjustments, &[0, 1, 2]);
    let before = hierarchy(&monster);
    let mut interaction = Interaction::new();

    for kind in PartKind::ALL {
        interaction.start_drag_new(&mut monster, kind);
        interaction.pointer_move(&mut monster, &empty_ray());
        interaction.pointer_up(&mut monster);
        assert_eq!(interaction.mode(), DragMode::Idle);
        assert_eq!(hierarchy(&monster), before);
    }
}

#[test]
fn test_moving_drag_without_target_leaves_hierarchy() {
    let mut monster = Monster::new(BodyShape::Peanut);
    let mut interaction = Interaction::new();

    // Put an eye on the front of the body through a real drop
    let front = Ray::new(Vec3::new(0.013, 0.011, 8.0), Vec3::NEG_Z);
    interaction.start_drag_new(&mut monster, PartKind::Eye);
    interaction.pointer_move(&mut monster, &front);
    interaction.pointer_up(&mut monster);
    let eye = monster.parts()[0];
    let before = hierarchy(&monster);

    // Pick the eye up where it sticks out and drag it into empty space
    let pick = monster.graph().world_position(eye) + Vec3::new(0.0, 0.0, 0.25);
    let down = Ray::new(pick + Vec3::new(0.013, 0.011, 5.0), Vec3::NEG_Z);
    interaction.pointer_down(&mut monster, &down);
    assert_eq!(interaction.mode(), DragMode::Moving { part: eye });
    interaction.pointer_move(&mut monster, &empty_ray());
    assert!(interaction.pointer_up(&mut monster).is_empty());

    assert_eq!(hierarchy(&monster), before);
    assert_eq!(monster.owner_of(eye), Some(Surface::Body));
}
