//! Outline extrusion
//!
//! Flat shapes (the lips) are described as closed 2D outlines built from
//! quadratic Bézier segments, then extruded along +Z with an optional bevel.

use glam::{Vec2, Vec3};
use tracing::warn;

use super::types::{Mesh, MeshBuilder};

/// Closed 2D path made of quadratic Bézier segments.
#[derive(Clone, Debug)]
pub struct QuadraticPath {
    start: Vec2,
    /// (control, end) pairs
    curves: Vec<(Vec2, Vec2)>,
}

impl QuadraticPath {
    /// Begin a path at `start`
    pub fn new(start: Vec2) -> Self {
        Self {
            start,
            curves: Vec::new(),
        }
    }

    /// Append a quadratic segment from the current point to `end`
    pub fn quad_to(mut self, control: Vec2, end: Vec2) -> Self {
        self.curves.push((control, end));
        self
    }

    /// Sample the path into a closed polyline.
    ///
    /// The closing point is dropped when it coincides with the start.
    pub fn sample(&self, segments_per_curve: u32) -> Vec<Vec2> {
        let steps = segments_per_curve.max(1);
        let mut points = vec![self.start];
        let mut from = self.start;

        for &(control, end) in &self.curves {
            for step in 1..=steps {
                let t = step as f32 / steps as f32;
                let mt = 1.0 - t;
                points.push(from * (mt * mt) + control * (2.0 * mt * t) + end * (t * t));
            }
            from = end;
        }

        if points.len() > 1
            && let Some(last) = points.last()
            && last.distance(self.start) < 1e-6
        {
            points.pop();
        }

        points
    }
}

/// Bevel applied around an extruded outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bevel {
    /// How far the bevel extends past the front and back faces
    pub thickness: f32,
    /// How far the bevelled wall is pushed outward from the outline
    pub size: f32,
}

/// Signed area of a closed polygon (positive when counter-clockwise)
pub fn signed_area(outline: &[Vec2]) -> f32 {
    let n = outline.len();
    (0..n)
        .map(|i| {
            let a = outline[i];
            let b = outline[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        * 0.5
}

/// Push each outline point outward by `amount` along the averaged edge normal
fn offset_outline(outline: &[Vec2], amount: f32) -> Vec<Vec2> {
    if amount == 0.0 {
        return outline.to_vec();
    }

    let n = outline.len();
    (0..n)
        .map(|i| {
            let prev = outline[(i + n - 1) % n];
            let here = outline[i];
            let next = outline[(i + 1) % n];
            // Outward normal of a CCW edge (d.x, d.y) is (d.y, -d.x)
            let edge_normal = |d: Vec2| Vec2::new(d.y, -d.x).normalize_or_zero();
            let normal = (edge_normal(here - prev) + edge_normal(next - here)).normalize_or_zero();
            here + normal * amount
        })
        .collect()
}

/// Extrude a closed outline from z = 0 to z = `depth`.
///
/// The outline may be given in either winding; it is normalized to CCW. Caps
/// are triangulated as a fan around the centroid, so the outline must be
/// star-shaped with respect to its centroid (true for the lip shapes).
pub fn extrude_outline(outline: &[Vec2], depth: f32, bevel: Option<Bevel>) -> Mesh {
    if outline.len() < 3 {
        warn!("extrude_outline: outline needs at least 3 points, got {}", outline.len());
        return Mesh::new();
    }

    let depth = if depth > 0.0 {
        depth
    } else {
        warn!("extrude_outline: depth must be > 0.0, clamping to 0.001");
        0.001
    };

    let mut ccw = outline.to_vec();
    if signed_area(&ccw) < 0.0 {
        ccw.reverse();
    }

    // (outward offset, z) per ring, back to front
    let rings: Vec<(f32, f32)> = match bevel {
        Some(b) => vec![
            (0.0, -b.thickness),
            (b.size, 0.0),
            (b.size, depth),
            (0.0, depth + b.thickness),
        ],
        None => vec![(0.0, 0.0), (0.0, depth)],
    };

    let mut mesh = Mesh::new();
    let n = ccw.len() as u32;

    let ring_outlines: Vec<Vec<Vec2>> = rings
        .iter()
        .map(|&(offset, _)| offset_outline(&ccw, offset))
        .collect();

    // Side walls
    for (ring, &(_, z)) in rings.iter().enumerate() {
        let v = ring as f32 / (rings.len() - 1) as f32;
        for (i, p) in ring_outlines[ring].iter().enumerate() {
            let u = i as f32 / n as f32;
            mesh.add_vertex(Vec3::new(p.x, p.y, z), Vec2::new(u, v), Vec3::Z);
        }
    }
    for ring in 0..(rings.len() as u32 - 1) {
        for i in 0..n {
            let a = ring * n + i;
            let b = ring * n + (i + 1) % n;
            let c = (ring + 1) * n + i;
            let d = (ring + 1) * n + (i + 1) % n;
            mesh.add_triangle(a, b, d);
            mesh.add_triangle(a, d, c);
        }
    }

    // Caps
    let centroid = ccw.iter().copied().sum::<Vec2>() / ccw.len() as f32;
    let (back_offset, back_z) = rings[0];
    let (front_offset, front_z) = rings[rings.len() - 1];
    add_cap(&mut mesh, &offset_outline(&ccw, back_offset), centroid, back_z, false);
    add_cap(&mut mesh, &offset_outline(&ccw, front_offset), centroid, front_z, true);

    mesh.compute_vertex_normals();
    mesh
}

fn add_cap(mesh: &mut Mesh, outline: &[Vec2], centroid: Vec2, z: f32, front: bool) {
    let normal = if front { Vec3::Z } else { Vec3::NEG_Z };
    let center = mesh.add_vertex(centroid.extend(z), Vec2::splat(0.5), normal);
    let n = outline.len() as u32;

    for p in outline {
        mesh.add_vertex(p.extend(z), Vec2::splat(0.5), normal);
    }
    for i in 0..n {
        let a = center + 1 + i;
        let b = center + 1 + (i + 1) % n;
        if front {
            mesh.add_triangle(center, a, b);
        } else {
            mesh.add_triangle(center, b, a);
        }
    }
}
