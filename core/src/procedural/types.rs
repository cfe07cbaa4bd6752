//! Procedural mesh types
//!
//! Shared types for procedural mesh generation.

use glam::{Mat3, Mat4, Vec2, Vec3};

/// Trait for mesh construction - enables generic geometry generation
pub trait MeshBuilder: Default {
    /// Add a vertex with position, UV coordinates and normal, returning its index
    fn add_vertex(&mut self, position: Vec3, uv: Vec2, normal: Vec3) -> u32;

    /// Add a triangle using three vertex indices
    fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32);
}

/// Triangle mesh in full f32 precision.
///
/// Positions, normals and UVs are parallel arrays; `indices` holds three
/// entries per triangle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of triangle `i`
    pub fn triangle_indices(&self, i: usize) -> [usize; 3] {
        [
            self.indices[i * 3] as usize,
            self.indices[i * 3 + 1] as usize,
            self.indices[i * 3 + 2] as usize,
        ]
    }

    /// Corner positions of triangle `i`
    pub fn triangle(&self, i: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangle_indices(i);
        [self.positions[a], self.positions[b], self.positions[c]]
    }

    /// Recompute smooth normals from the current positions.
    ///
    /// Face normals are accumulated unnormalized, so larger triangles weigh more.
    /// Vertices that end up with a zero sum keep their previous normal.
    pub fn compute_vertex_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.positions.len()];

        for tri in 0..self.triangle_count() {
            let [a, b, c] = self.triangle_indices(tri);
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            accumulated[a] += face;
            accumulated[b] += face;
            accumulated[c] += face;
        }

        self.normals.resize(self.positions.len(), Vec3::Y);
        for (normal, sum) in self.normals.iter_mut().zip(accumulated) {
            if sum.length_squared() > 1e-20 {
                *normal = sum.normalize();
            }
        }
    }

    /// Apply an affine transform to positions and normals
    pub fn transform(&mut self, matrix: Mat4) {
        let normal_matrix = Mat3::from_mat4(matrix).inverse().transpose();
        for p in &mut self.positions {
            *p = matrix.transform_point3(*p);
        }
        for n in &mut self.normals {
            *n = (normal_matrix * *n).normalize_or_zero();
        }
    }

    /// Move every vertex by `offset`
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Scale positions per axis (normals are fixed up accordingly)
    pub fn scale(&mut self, factors: Vec3) {
        self.transform(Mat4::from_scale(factors));
    }

    /// Displace every position through `f` and recompute normals.
    pub fn deform(&mut self, mut f: impl FnMut(Vec3) -> Vec3) {
        for p in &mut self.positions {
            *p = f(*p);
        }
        self.compute_vertex_normals();
    }

    /// Append another mesh, offsetting its indices
    pub fn merge(&mut self, other: &Mesh) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Center and radius of a sphere enclosing every vertex.
    ///
    /// Uses the AABB center, which is loose but cheap to compute.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        if self.positions.is_empty() {
            return (Vec3::ZERO, 0.0);
        }

        let (min, max) = self.positions.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        );
        let center = (min + max) * 0.5;
        let radius = self
            .positions
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0_f32, f32::max);
        (center, radius)
    }
}

impl MeshBuilder for Mesh {
    fn add_vertex(&mut self, position: Vec3, uv: Vec2, normal: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.uvs.push(uv);
        self.normals.push(normal);
        index
    }

    fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }
}
