//! Captured photo used as the body texture

use std::sync::Arc;

use glam::Vec2;
use image::RgbaImage;

use crate::scene::Rgb;

/// Texture repeat applied to a fresh capture
pub const DEFAULT_REPEAT: f32 = 1.5;

/// Body texture with mirrored-repeat wrapping.
///
/// Texture coordinates are transformed as `uv * repeat + offset` before lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct SkinTexture {
    pub image: Arc<RgbaImage>,
    pub repeat: f32,
    pub offset: Vec2,
}

/// Fold a coordinate into 0..=1, reflecting on every integer boundary
fn mirror(x: f32) -> f32 {
    let t = x.rem_euclid(2.0);
    if t > 1.0 { 2.0 - t } else { t }
}

impl SkinTexture {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
            repeat: DEFAULT_REPEAT,
            offset: Vec2::ZERO,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Bilinear sample at `uv` (v = 0 is the top row)
    pub fn sample(&self, uv: Vec2) -> Rgb {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return Rgb::WHITE;
        }

        let uv = uv * self.repeat + self.offset;
        if !uv.is_finite() {
            return Rgb::WHITE;
        }
        let x = mirror(uv.x) * (w - 1) as f32;
        let y = mirror(uv.y) * (h - 1) as f32;

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(w - 1);
        let y1 = (y0 + 1).min(h - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let texel = |px: u32, py: u32| {
            let p = self.image.get_pixel(px, py).0;
            Rgb::from_rgb8([p[0], p[1], p[2]])
        };
        let top = texel(x0, y0).lerp(texel(x1, y0), fx);
        let bottom = texel(x0, y1).lerp(texel(x1, y1), fx);
        top.lerp(bottom, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn split_texture() -> SkinTexture {
        // Left half black, right half white
        let image = RgbaImage::from_fn(4, 4, |x, _| {
            if x < 2 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        SkinTexture {
            repeat: 1.0,
            ..SkinTexture::new(image)
        }
    }

    #[test]
    fn test_mirror() {
        assert_eq!(mirror(0.25), 0.25);
        assert_eq!(mirror(1.25), 0.75);
        assert_eq!(mirror(-0.25), 0.25);
        assert_eq!(mirror(2.5), 0.5);
    }

    #[test]
    fn test_new_defaults() {
        let skin = SkinTexture::new(RgbaImage::new(2, 2));
        assert_eq!(skin.repeat, DEFAULT_REPEAT);
        assert_eq!(skin.offset, Vec2::ZERO);
    }

    #[test]
    fn test_sample_edges() {
        let skin = split_texture();
        assert_eq!(skin.sample(Vec2::new(0.0, 0.5)).to_rgb8(), [0, 0, 0]);
        assert_eq!(skin.sample(Vec2::new(1.0, 0.5)).to_rgb8(), [255, 255, 255]);
    }

    #[test]
    fn test_sample_mirrored_repeat() {
        let skin = split_texture();
        // 1.0..2.0 runs back across the image
        assert_eq!(skin.sample(Vec2::new(1.999, 0.5)).to_rgb8(), [0, 0, 0]);
    }

    #[test]
    fn test_offset_shifts_lookup() {
        let mut skin = split_texture();
        skin.offset = Vec2::new(1.0, 0.0);
        assert_eq!(skin.sample(Vec2::new(0.0, 0.5)).to_rgb8(), [255, 255, 255]);
    }
}
