//! Ray picking against scene meshes
//!
//! Rays are tested against every triangle of every visible mesh below a root
//! node. Triangles are double-sided; the reported normal always faces the
//! ray origin, which for closed surfaces is the outward side.

// Standard notation for Möller–Trumbore
#![allow(clippy::many_single_char_names)]

use glam::{Mat3, Vec3};

use crate::scene::{NodeId, SceneGraph};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray; the direction is normalized (falls back to -Z when zero).
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or(Vec3::NEG_Z),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a ray cast against a scene mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Mesh node that was hit
    pub node: NodeId,
    /// Distance from ray origin to hit point
    pub distance: f32,
    /// Hit point in world coordinates
    pub point: Vec3,
    /// Unit world-space face normal, facing the ray origin
    pub normal: Vec3,
}

/// Möller–Trumbore ray-triangle intersection.
///
/// `direction` does not need to be normalized; `t` is expressed in multiples
/// of it. Returns `(t, normal)` with the geometric normal turned to face the ray.
pub fn ray_triangle(
    origin: Vec3,
    direction: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    max_t: f32,
) -> Option<(f32, Vec3)> {
    const EPSILON: f32 = 1e-8;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = direction.cross(edge2);
    let a = edge1.dot(h);

    if a.abs() < EPSILON {
        return None; // Ray parallel to triangle
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t < EPSILON || t > max_t {
        return None;
    }

    let normal = edge1.cross(edge2).normalize_or(Vec3::Z);
    let normal = if normal.dot(direction) > 0.0 {
        -normal
    } else {
        normal
    };
    Some((t, normal))
}

/// Does the ray pass within `radius` of `center`? `direction` may be unnormalized.
fn ray_hits_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> bool {
    let len_sq = direction.length_squared();
    if len_sq < 1e-20 {
        return false;
    }
    let to_center = center - origin;
    let t = (to_center.dot(direction) / len_sq).max(0.0);
    let closest = origin + direction * t;
    closest.distance_squared(center) <= radius * radius
}

impl SceneGraph {
    /// Cast a world-space ray against every visible mesh below `root`.
    ///
    /// Each mesh contributes at most its nearest hit. Hits are sorted nearest first.
    pub fn raycast(&self, ray: &Ray, root: NodeId) -> Vec<RayHit> {
        let mut hits = Vec::new();

        for (node, world) in self.visible_meshes(root) {
            let Some(instance) = self.node(node).and_then(|n| n.mesh.as_ref()) else {
                continue;
            };
            let det = world.determinant();
            if det.abs() < 1e-12 {
                continue;
            }

            // Transform ray to local space; the direction keeps world scale so
            // `t` stays a world distance
            let inv = world.inverse();
            let local_origin = inv.transform_point3(ray.origin);
            let local_dir = inv.transform_vector3(ray.direction);

            let (center, radius) = instance.bounds;
            if !ray_hits_sphere(local_origin, local_dir, center, radius + 1e-4) {
                continue;
            }

            let mesh = &instance.mesh;
            let mut closest: Option<(f32, Vec3)> = None;
            for tri in 0..mesh.triangle_count() {
                let [a, b, c] = mesh.triangle(tri);
                let cutoff = closest.map_or(f32::MAX, |(t, _)| t);
                if let Some(hit) = ray_triangle(local_origin, local_dir, a, b, c, cutoff) {
                    closest = Some(hit);
                }
            }

            if let Some((t, local_normal)) = closest {
                let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
                let mut normal = (normal_matrix * local_normal).normalize_or(Vec3::Y);
                if normal.dot(ray.direction) > 0.0 {
                    normal = -normal;
                }
                hits.push(RayHit {
                    node,
                    distance: t,
                    point: ray.at(t),
                    normal,
                });
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedural::generate_sphere;
    use crate::scene::{Material, Node, NodeKind, Rgb, Transform};
    use std::sync::Arc;

    // Slightly off-axis so the ray never lands exactly on a shared vertex
    fn forward_ray() -> Ray {
        Ray::new(Vec3::new(0.013, 0.021, 0.0), Vec3::NEG_Z)
    }

    fn sphere_scene(positions: &[Vec3]) -> (SceneGraph, Vec<NodeId>) {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mesh = Arc::new(generate_sphere(1.0, 24, 12));
        let ids = positions
            .iter()
            .map(|&p| {
                graph.add_node(
                    root,
                    Node::mesh(
                        "ball",
                        NodeKind::Group,
                        mesh.clone(),
                        Material::standard(Rgb::WHITE, 0.5),
                    )
                    .with_transform(Transform::from_translation(p)),
                )
            })
            .collect();
        (graph, ids)
    }

    #[test]
    fn test_ray_triangle_hit() {
        let hit = ray_triangle(
            Vec3::new(0.2, 0.2, 5.0),
            Vec3::NEG_Z,
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            f32::MAX,
        );
        let (t, normal) = hit.expect("should hit");
        assert!((t - 5.0).abs() < 1e-5);
        assert!((normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_ray_triangle_back_face_normal_flipped() {
        // Same triangle seen from below
        let (_, normal) = ray_triangle(
            Vec3::new(0.2, 0.2, -5.0),
            Vec3::Z,
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            f32::MAX,
        )
        .expect("double-sided");
        assert!((normal - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_ray_triangle_miss_and_cutoff() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        let miss = ray_triangle(Vec3::new(2.0, 2.0, 5.0), Vec3::NEG_Z, a, b, c, f32::MAX);
        assert!(miss.is_none());
        let cut = ray_triangle(Vec3::new(0.2, 0.2, 5.0), Vec3::NEG_Z, a, b, c, 4.0);
        assert!(cut.is_none());
    }

    #[test]
    fn test_raycast_sorted_nearest_first() {
        let (graph, ids) = sphere_scene(&[Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, -4.0)]);
        let hits = graph.raycast(&forward_ray(), graph.root());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node, ids[1]);
        assert!((hits[0].distance - 3.0).abs() < 0.02);
        assert!(hits[0].normal.dot(Vec3::Z) > 0.95);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn test_raycast_respects_scale() {
        let (mut graph, ids) = sphere_scene(&[Vec3::new(0.0, 0.0, -10.0)]);
        if let Some(n) = graph.node_mut(ids[0]) {
            n.transform.scale = Vec3::splat(2.0);
        }
        let hits = graph.raycast(&forward_ray(), graph.root());
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 8.0).abs() < 0.05);
        assert!((hits[0].point.z + 8.0).abs() < 0.05);
        assert!(hits[0].normal.dot(Vec3::Z) > 0.95);
    }

    #[test]
    fn test_raycast_skips_hidden() {
        let (mut graph, ids) = sphere_scene(&[Vec3::new(0.0, 0.0, -4.0)]);
        graph.set_visible(ids[0], false);
        assert!(graph.raycast(&forward_ray(), graph.root()).is_empty());
    }

    #[test]
    fn test_raycast_limited_to_root() {
        let (graph, ids) = sphere_scene(&[Vec3::new(0.0, 0.0, -4.0), Vec3::new(0.0, 0.0, -8.0)]);
        let hits = graph.raycast(&forward_ray(), ids[1]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, ids[1]);
    }
}
