//! Triangle rasterization into a linear colour buffer with depth

use glam::{Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};

use super::lighting::to_display;
use crate::scene::Rgb;

/// Vertex after the vertex stage
#[derive(Clone, Copy, Debug)]
pub struct ClipVertex {
    pub clip: Vec4,
    pub world_position: Vec3,
    pub world_normal: Vec3,
    pub uv: Vec2,
}

/// Perspective-correct attributes at a pixel
#[derive(Clone, Copy, Debug)]
pub struct Fragment {
    pub world_position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthMode {
    /// Test and write (opaque geometry)
    ReadWrite,
    /// Test only (blended geometry)
    ReadOnly,
}

pub struct FrameBuffer {
    width: u32,
    height: u32,
    color: Vec<Rgb>,
    depth: Vec<f32>,
}

struct ScreenVertex {
    pos: Vec2,
    /// NDC depth in 0..=1
    z: f32,
    inv_w: f32,
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let len = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![Rgb::BLACK; len],
            depth: vec![f32::INFINITY; len],
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn clear(&mut self, color: Rgb) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.color[(y * self.width + x) as usize])
    }

    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.depth[(y * self.width + x) as usize])
    }

    fn to_screen(&self, v: &ClipVertex) -> ScreenVertex {
        let inv_w = 1.0 / v.clip.w;
        let ndc = v.clip.truncate() * inv_w;
        ScreenVertex {
            pos: Vec2::new(
                (ndc.x * 0.5 + 0.5) * self.width as f32,
                (0.5 - ndc.y * 0.5) * self.height as f32,
            ),
            z: ndc.z,
            inv_w,
        }
    }

    /// Draw one triangle, both faces.
    ///
    /// `shade` returns the linear colour of a fragment; it is blended with
    /// `opacity` over what is already in the buffer. Triangles with any
    /// vertex in front of the near plane are skipped.
    pub fn draw_triangle(
        &mut self,
        vertices: [ClipVertex; 3],
        opacity: f32,
        depth_mode: DepthMode,
        mut shade: impl FnMut(&Fragment) -> Rgb,
    ) {
        if vertices
            .iter()
            .any(|v| !v.clip.is_finite() || v.clip.w <= 0.0 || v.clip.z < 0.0)
        {
            return;
        }

        let s = vertices.each_ref().map(|v| self.to_screen(v));
        let area = edge(s[0].pos, s[1].pos, s[2].pos);
        if area.abs() < f32::EPSILON {
            return;
        }

        let min = s[0].pos.min(s[1].pos).min(s[2].pos).floor().max(Vec2::ZERO);
        let max = s[0]
            .pos
            .max(s[1].pos)
            .max(s[2].pos)
            .ceil()
            .min(Vec2::new(self.width as f32, self.height as f32));
        if min.x >= max.x || min.y >= max.y {
            return;
        }

        for y in min.y as u32..max.y as u32 {
            for x in min.x as u32..max.x as u32 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(s[1].pos, s[2].pos, p) / area;
                let w1 = edge(s[2].pos, s[0].pos, p) / area;
                let w2 = edge(s[0].pos, s[1].pos, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * s[0].z + w1 * s[1].z + w2 * s[2].z;
                if z > 1.0 {
                    continue;
                }
                let idx = (y * self.width + x) as usize;
                if z >= self.depth[idx] {
                    continue;
                }

                // Perspective-correct weights
                let p0 = w0 * s[0].inv_w;
                let p1 = w1 * s[1].inv_w;
                let p2 = w2 * s[2].inv_w;
                let sum = p0 + p1 + p2;
                let (p0, p1, p2) = (p0 / sum, p1 / sum, p2 / sum);

                let [a, b, c] = &vertices;
                let fragment = Fragment {
                    world_position: a.world_position * p0
                        + b.world_position * p1
                        + c.world_position * p2,
                    normal: (a.world_normal * p0 + b.world_normal * p1 + c.world_normal * p2)
                        .normalize_or(Vec3::Y),
                    uv: a.uv * p0 + b.uv * p1 + c.uv * p2,
                };

                let color = shade(&fragment);
                self.color[idx] = if opacity >= 1.0 {
                    color
                } else {
                    self.color[idx].lerp(color, opacity.max(0.0))
                };
                if depth_mode == DepthMode::ReadWrite {
                    self.depth[idx] = z;
                }
            }
        }
    }

    /// Encode the linear buffer into `image`, resizing it when needed
    pub fn resolve(&self, image: &mut RgbaImage) {
        if image.dimensions() != (self.width, self.height) {
            *image = RgbaImage::new(self.width, self.height);
        }
        for (pixel, color) in image.pixels_mut().zip(&self.color) {
            let [r, g, b] = to_display(*color).to_rgb8();
            *pixel = Rgba([r, g, b, 255]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32) -> ClipVertex {
        ClipVertex {
            clip: Vec4::new(x, y, z, 1.0),
            world_position: Vec3::new(x, y, z),
            world_normal: Vec3::Z,
            uv: Vec2::new(x * 0.5 + 0.5, y * 0.5 + 0.5),
        }
    }

    fn full_triangle(z: f32) -> [ClipVertex; 3] {
        [vertex(-1.0, -1.0, z), vertex(3.0, -1.0, z), vertex(-1.0, 3.0, z)]
    }

    #[test]
    fn test_covers_pixels() {
        let mut fb = FrameBuffer::new(8, 8);
        fb.clear(Rgb::BLACK);
        fb.draw_triangle(full_triangle(0.5), 1.0, DepthMode::ReadWrite, |_| Rgb::WHITE);
        assert_eq!(fb.pixel(0, 0), Some(Rgb::WHITE));
        assert_eq!(fb.pixel(7, 7), Some(Rgb::WHITE));
        let depth = fb.depth(3, 3).unwrap_or(f32::NAN);
        assert!((depth - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_winding_does_not_matter() {
        let mut fb = FrameBuffer::new(8, 8);
        fb.clear(Rgb::BLACK);
        let [a, b, c] = full_triangle(0.5);
        fb.draw_triangle([a, c, b], 1.0, DepthMode::ReadWrite, |_| Rgb::WHITE);
        assert_eq!(fb.pixel(4, 4), Some(Rgb::WHITE));
    }

    #[test]
    fn test_depth_rejects_farther() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.clear(Rgb::BLACK);
        let red = Rgb::new(1.0, 0.0, 0.0);
        fb.draw_triangle(full_triangle(0.3), 1.0, DepthMode::ReadWrite, |_| red);
        fb.draw_triangle(full_triangle(0.6), 1.0, DepthMode::ReadWrite, |_| Rgb::WHITE);
        assert_eq!(fb.pixel(1, 1), Some(red));
    }

    #[test]
    fn test_blending_without_depth_write() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.clear(Rgb::BLACK);
        fb.draw_triangle(full_triangle(0.3), 0.5, DepthMode::ReadOnly, |_| Rgb::WHITE);
        assert_eq!(fb.pixel(2, 2), Some(Rgb::new(0.5, 0.5, 0.5)));
        assert_eq!(fb.depth(2, 2), Some(f32::INFINITY));
    }

    #[test]
    fn test_near_plane_crossing_dropped() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.clear(Rgb::BLACK);
        let mut tri = full_triangle(0.5);
        tri[1].clip.z = -0.2;
        fb.draw_triangle(tri, 1.0, DepthMode::ReadWrite, |_| Rgb::WHITE);
        tri[1].clip = Vec4::new(1.0, 1.0, 0.5, -1.0);
        fb.draw_triangle(tri, 1.0, DepthMode::ReadWrite, |_| Rgb::WHITE);
        assert_eq!(fb.pixel(1, 1), Some(Rgb::BLACK));
    }

    #[test]
    fn test_uv_interpolation() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.clear(Rgb::BLACK);
        let mut seen = Vec::new();
        fb.draw_triangle(full_triangle(0.5), 1.0, DepthMode::ReadWrite, |f| {
            seen.push(f.uv);
            Rgb::WHITE
        });
        // Pixel (0, 0) centre is NDC (-0.5, 0.5)
        assert!((seen[0] - Vec2::new(0.25, 0.75)).length() < 1e-5);
    }

    #[test]
    fn test_resolve_encodes() {
        let mut fb = FrameBuffer::new(3, 2);
        fb.clear(Rgb::WHITE);
        let mut image = RgbaImage::new(1, 1);
        fb.resolve(&mut image);
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [255, 255, 255, 255]);
    }
}
