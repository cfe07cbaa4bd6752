//! Surface materials

use crate::capture::SkinTexture;

/// Linear RGB colour with components in 0.0..=1.0
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Colour from a `0xRRGGBB` literal
    pub const fn from_hex(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        )
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn mul(self, other: Self) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub fn is_black(self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }

    /// Quantize to 8-bit channels, clamping out-of-range values
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self::new(
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
        )
    }
}

/// Emissive intensity applied to a selected part
pub const HIGHLIGHT_INTENSITY: f32 = 0.3;

/// Standard toy material.
///
/// `emissive` and `emissive_intensity` carry the selection glow; `skin` is only
/// ever set on the body.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub roughness: f32,
    pub opacity: f32,
    pub emissive: Rgb,
    pub emissive_intensity: f32,
    /// Lights up when the owning part is selected
    pub can_glow: bool,
    /// Ignore scene lighting (flat colour)
    pub unlit: bool,
    pub skin: Option<SkinTexture>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            roughness: 1.0,
            opacity: 1.0,
            emissive: Rgb::BLACK,
            emissive_intensity: 0.0,
            can_glow: false,
            unlit: false,
            skin: None,
        }
    }
}

impl Material {
    pub fn standard(color: Rgb, roughness: f32) -> Self {
        Self {
            color,
            roughness,
            ..Self::default()
        }
    }

    /// Flat colour that ignores lighting
    pub fn basic(color: Rgb, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            unlit: true,
            ..Self::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn glowing(mut self) -> Self {
        self.can_glow = true;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    /// Set the selection glow. Only affects materials flagged `can_glow`.
    pub fn highlight(&mut self) {
        if self.can_glow {
            self.emissive = Rgb::WHITE;
            self.emissive_intensity = HIGHLIGHT_INTENSITY;
        }
    }

    pub fn clear_emissive(&mut self) {
        self.emissive = Rgb::BLACK;
        self.emissive_intensity = 0.0;
    }

    pub fn is_emissive(&self) -> bool {
        self.emissive_intensity > 0.0 && !self.emissive.is_black()
    }

    /// Emissive contribution added on top of the lit colour
    pub fn emission(&self) -> Rgb {
        self.emissive.scale(self.emissive_intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Rgb::from_hex(0x89d6f1);
        assert_eq!(c.to_rgb8(), [0x89, 0xd6, 0xf1]);
    }

    #[test]
    fn test_to_rgb8_clamps() {
        assert_eq!(Rgb::new(2.0, -1.0, 0.5).to_rgb8(), [255, 0, 128]);
    }

    #[test]
    fn test_highlight_requires_can_glow() {
        let mut plain = Material::standard(Rgb::WHITE, 0.5);
        plain.highlight();
        assert!(!plain.is_emissive());

        let mut glow = Material::standard(Rgb::WHITE, 0.5).glowing();
        glow.highlight();
        assert!(glow.is_emissive());
        assert_eq!(glow.emissive_intensity, HIGHLIGHT_INTENSITY);

        glow.clear_emissive();
        assert!(!glow.is_emissive());
    }
}
