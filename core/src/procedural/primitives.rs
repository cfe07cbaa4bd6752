//! Procedural mesh primitives with UV coordinates
//!
//! Functions for generating the round, toy-like shapes the monster is built
//! from. Every generator emits CCW-wound triangles with outward normals.

use glam::{Vec2, Vec3};
use std::f32::consts::PI;
use tracing::warn;

use super::types::{Mesh, MeshBuilder};

fn positive_or(name: &str, param: &str, value: f32, fallback: f32) -> f32 {
    if value > 0.0 && value.is_finite() {
        value
    } else {
        warn!("{name}: {param} must be > 0.0, clamping to {fallback}");
        fallback
    }
}

/// Generate a UV sphere mesh with smooth normals and equirectangular UV mapping
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `segments` - Number of longitudinal divisions (min 3, max 256)
/// * `rings` - Number of latitudinal divisions (min 2, max 256)
///
/// # UV Mapping
/// - U (horizontal): Longitude wraps 0→1 around equator, with a duplicated seam column
/// - V (vertical): Latitude maps 0→1 from north pole to south pole
pub fn generate_sphere(radius: f32, segments: u32, rings: u32) -> Mesh {
    let radius = positive_or("generate_sphere", "radius", radius, 0.001);
    let segments = segments.clamp(3, 256);
    let rings = rings.clamp(2, 256);

    let mut mesh = Mesh::new();
    let columns = segments + 1;

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * PI;
        let y = radius * phi.cos();
        let ring_radius = radius * phi.sin();

        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let theta = u * 2.0 * PI;
            let position = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
            let normal = position.normalize_or(Vec3::Y);
            mesh.add_vertex(position, Vec2::new(u, v), normal);
        }
    }

    for ring in 0..rings {
        for seg in 0..segments {
            let i0 = ring * columns + seg;
            let i1 = i0 + 1;
            let i2 = (ring + 1) * columns + seg;
            let i3 = i2 + 1;

            // Two triangles per quad (CCW winding for outward-facing normals)
            mesh.add_triangle(i0, i1, i3);
            mesh.add_triangle(i0, i3, i2);
        }
    }

    mesh
}

/// Generate a capped, optionally tapered tube centred on the origin along Y.
///
/// A zero `radius_top` produces a cone. `height_segments` controls how many
/// rings the side wall is split into, which matters for meshes that are bent
/// afterwards.
pub fn generate_tube(
    radius_bottom: f32,
    radius_top: f32,
    height: f32,
    segments: u32,
    height_segments: u32,
) -> Mesh {
    let radius_bottom = if radius_bottom < 0.0 {
        warn!("generate_tube: radius_bottom must be >= 0.0, clamping to 0.0");
        0.0
    } else {
        radius_bottom
    };
    let radius_top = if radius_top < 0.0 {
        warn!("generate_tube: radius_top must be >= 0.0, clamping to 0.0");
        0.0
    } else {
        radius_top
    };
    let height = positive_or("generate_tube", "height", height, 0.001);
    let segments = segments.clamp(3, 256);
    let height_segments = height_segments.clamp(1, 256);

    let mut mesh = Mesh::new();
    let half_height = height * 0.5;
    let columns = segments + 1;

    // Slant normal for tapered walls
    let radius_diff = radius_bottom - radius_top;
    let slant_length = (height * height + radius_diff * radius_diff).sqrt();
    let ny = radius_diff / slant_length;
    let nr = height / slant_length;

    for row in 0..=height_segments {
        let v = row as f32 / height_segments as f32;
        let y = -half_height + v * height;
        let radius = radius_bottom + (radius_top - radius_bottom) * v;

        for i in 0..=segments {
            let u = i as f32 / segments as f32;
            let theta = u * 2.0 * PI;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let position = Vec3::new(radius * cos_theta, y, radius * sin_theta);
            let normal = Vec3::new(nr * cos_theta, ny, nr * sin_theta).normalize();
            mesh.add_vertex(position, Vec2::new(u, v), normal);
        }
    }

    // Rows run bottom to top, so the quad order is mirrored relative to the sphere
    for row in 0..height_segments {
        for i in 0..segments {
            let i0 = row * columns + i;
            let i1 = i0 + 1;
            let i2 = (row + 1) * columns + i;
            let i3 = i2 + 1;

            mesh.add_triangle(i0, i3, i1);
            mesh.add_triangle(i0, i2, i3);
        }
    }

    if radius_bottom > 0.0 {
        add_cap(&mut mesh, radius_bottom, -half_height, segments, false);
    }
    if radius_top > 0.0 {
        add_cap(&mut mesh, radius_top, half_height, segments, true);
    }

    mesh
}

fn add_cap(mesh: &mut Mesh, radius: f32, y: f32, segments: u32, facing_up: bool) {
    let normal = if facing_up { Vec3::Y } else { Vec3::NEG_Y };
    let center = mesh.add_vertex(Vec3::new(0.0, y, 0.0), Vec2::splat(0.5), normal);

    let first = center + 1;
    for i in 0..segments {
        let theta = (i as f32 / segments as f32) * 2.0 * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        mesh.add_vertex(
            Vec3::new(radius * cos_theta, y, radius * sin_theta),
            Vec2::new(0.5 + 0.5 * cos_theta, 0.5 + 0.5 * sin_theta),
            normal,
        );
    }

    for i in 0..segments {
        let a = first + i;
        let b = first + (i + 1) % segments;
        if facing_up {
            mesh.add_triangle(center, b, a);
        } else {
            mesh.add_triangle(center, a, b);
        }
    }
}

/// Generate a capped cylinder (or truncated cone) centred on the origin
pub fn generate_cylinder(radius_bottom: f32, radius_top: f32, height: f32, segments: u32) -> Mesh {
    generate_tube(radius_bottom, radius_top, height, segments, 1)
}

/// Generate a cone with its base at `-height/2` and apex at `+height/2`
pub fn generate_cone(radius: f32, height: f32, segments: u32, height_segments: u32) -> Mesh {
    generate_tube(radius, 0.0, height, segments, height_segments)
}

/// Generate a capsule: a cylinder of `length` with hemispherical ends
///
/// # Arguments
/// * `radius` - Radius of the body and the end caps
/// * `length` - Length of the straight section (total height is `length + 2 * radius`)
/// * `segments` - Number of radial divisions (min 3, max 256)
/// * `rings` - Latitude divisions per hemisphere (min 1, max 128)
pub fn generate_capsule(radius: f32, length: f32, segments: u32, rings: u32) -> Mesh {
    let radius = positive_or("generate_capsule", "radius", radius, 0.001);
    let length = if length < 0.0 {
        warn!("generate_capsule: length must be >= 0.0, clamping to 0.0");
        0.0
    } else {
        length
    };
    let segments = segments.clamp(3, 256);
    let rings = rings.clamp(1, 128);

    let mut mesh = Mesh::new();
    let half_length = length * 0.5;
    let columns = segments + 1;
    let total_height = length + 2.0 * radius;

    // Latitudes from the top pole down to the bottom pole; the equator row is
    // emitted once per hemisphere so the straight section gets its own quads.
    let mut latitudes = Vec::with_capacity((rings as usize + 1) * 2);
    for ring in 0..=rings {
        let phi = (ring as f32 / rings as f32) * PI * 0.5;
        latitudes.push((phi, half_length));
    }
    for ring in 0..=rings {
        let phi = PI * 0.5 + (ring as f32 / rings as f32) * PI * 0.5;
        latitudes.push((phi, -half_length));
    }

    for &(phi, center_y) in &latitudes {
        let (sin_phi, cos_phi) = phi.sin_cos();
        let y = center_y + radius * cos_phi;
        let v = (half_length + radius - y) / total_height;

        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let theta = u * 2.0 * PI;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let normal = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            let position = Vec3::new(radius * normal.x, y, radius * normal.z);
            mesh.add_vertex(position, Vec2::new(u, v), normal);
        }
    }

    for row in 0..(latitudes.len() as u32 - 1) {
        for seg in 0..segments {
            let i0 = row * columns + seg;
            let i1 = i0 + 1;
            let i2 = (row + 1) * columns + seg;
            let i3 = i2 + 1;

            mesh.add_triangle(i0, i1, i3);
            mesh.add_triangle(i0, i3, i2);
        }
    }

    mesh
}

/// Generate a flat disc in the XY plane facing +Z
pub fn generate_disc(radius: f32, segments: u32) -> Mesh {
    let radius = positive_or("generate_disc", "radius", radius, 0.001);
    let segments = segments.clamp(3, 256);

    let mut mesh = Mesh::new();
    let center = mesh.add_vertex(Vec3::ZERO, Vec2::splat(0.5), Vec3::Z);

    for i in 0..segments {
        let theta = (i as f32 / segments as f32) * 2.0 * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();
        mesh.add_vertex(
            Vec3::new(radius * cos_theta, radius * sin_theta, 0.0),
            Vec2::new(0.5 + 0.5 * cos_theta, 0.5 + 0.5 * sin_theta),
            Vec3::Z,
        );
    }

    for i in 0..segments {
        mesh.add_triangle(center, center + 1 + i, center + 1 + (i + 1) % segments);
    }

    mesh
}

/// Generate a box with rounded edges and corners
///
/// Each face is a `segments × segments` grid; every vertex is then pulled onto a
/// shell of `radius` around the inner box (half extents minus radius), which
/// rounds edges and corners while keeping the faces flat.
///
/// # Arguments
/// * `width`, `height`, `depth` - Full extents along X, Y and Z
/// * `segments` - Grid divisions per face (min 1, max 128)
/// * `radius` - Corner radius, clamped to half the smallest extent
pub fn generate_rounded_box(
    width: f32,
    height: f32,
    depth: f32,
    segments: u32,
    radius: f32,
) -> Mesh {
    let width = positive_or("generate_rounded_box", "width", width, 0.001);
    let height = positive_or("generate_rounded_box", "height", height, 0.001);
    let depth = positive_or("generate_rounded_box", "depth", depth, 0.001);
    let segments = segments.clamp(1, 128);

    let half = Vec3::new(width, height, depth) * 0.5;
    let radius = radius.clamp(0.0, half.min_element());
    let inner = half - Vec3::splat(radius);

    // (normal, u axis, v axis) with u × v = normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut mesh = Mesh::new();
    let columns = segments + 1;

    for (normal, u_axis, v_axis) in faces {
        let base = mesh.vertex_count() as u32;
        let face_center = normal * half;
        let u_extent = (u_axis * half).abs().max_element();
        let v_extent = (v_axis * half).abs().max_element();

        for j in 0..=segments {
            let v = j as f32 / segments as f32;
            for i in 0..=segments {
                let u = i as f32 / segments as f32;
                let flat = face_center
                    + u_axis * ((u - 0.5) * 2.0 * u_extent)
                    + v_axis * ((v - 0.5) * 2.0 * v_extent);

                let core = flat.clamp(-inner, inner);
                let outward = (flat - core).normalize_or(normal);
                let position = core + outward * radius;
                mesh.add_vertex(position, Vec2::new(u, v), outward);
            }
        }

        for j in 0..segments {
            for i in 0..segments {
                let i0 = base + j * columns + i;
                let i1 = i0 + 1;
                let i2 = i0 + columns;
                let i3 = i2 + 1;

                mesh.add_triangle(i0, i1, i3);
                mesh.add_triangle(i0, i3, i2);
            }
        }
    }

    mesh
}
