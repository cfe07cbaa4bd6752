//! Vertex deformers for body and part shapes
//!
//! Each deformer maps one position to another; apply them with
//! [`Mesh::deform`](super::Mesh::deform) so normals are recomputed.

use glam::Vec3;

/// Teardrop profile: narrows towards the top, bulges slightly at the bottom.
pub fn waterdrop(mut v: Vec3) -> Vec3 {
    let scale = if v.y > 0.0 {
        1.0 - v.y * 0.45
    } else {
        1.0 + v.y.abs() * 0.15
    };
    let scale = scale.max(0.1);
    v.x *= scale;
    v.z *= scale;
    v
}

/// Stretched sphere with a pinched waist.
pub fn peanut(mut v: Vec3) -> Vec3 {
    const STRETCH: f32 = 1.4;
    v.y *= STRETCH;
    let norm_y = v.y / STRETCH;
    let width = 0.85 + norm_y.abs().powf(2.2) * 0.25;
    v.x *= width;
    v.z *= width;
    v
}

/// Narrows the upper part of a box: 75% width and 85% depth at the top.
pub fn tapered_box(mut v: Vec3) -> Vec3 {
    if v.y > -0.5 {
        let factor = (v.y + 0.5) / 1.6;
        v.x *= 1.0 - factor * 0.25;
        v.z *= 1.0 - factor * 0.15;
    }
    v
}

/// Curve a Y-aligned shape towards +X, more strongly the higher the vertex.
pub fn bend(mut v: Vec3, strength: f32) -> Vec3 {
    v.x += v.y * v.y * strength;
    v
}
