//! Scene lighting and fog
//!
//! Colours on materials are display (sRGB-encoded) values. Shading happens in
//! linear space and is encoded back when the frame is written out.

use glam::Vec3;

use crate::scene::Rgb;

/// Clear colour, also used for fog
pub const BACKGROUND: u32 = 0xf6f6fa;

/// Lambert BRDF normalisation
const LAMBERT_SCALE: f32 = std::f32::consts::FRAC_1_PI;
const GAMMA: f32 = 2.2;

pub fn to_linear(color: Rgb) -> Rgb {
    let f = |c: f32| c.max(0.0).powf(GAMMA);
    Rgb::new(f(color.r), f(color.g), f(color.b))
}

pub fn to_display(color: Rgb) -> Rgb {
    let f = |c: f32| c.max(0.0).powf(1.0 / GAMMA);
    Rgb::new(f(color.r), f(color.g), f(color.b))
}

/// Sky/ground gradient light
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HemisphereLight {
    pub sky: Rgb,
    pub ground: Rgb,
    pub intensity: f32,
}

impl HemisphereLight {
    pub fn irradiance(&self, normal: Vec3) -> Rgb {
        let weight = 0.5 * normal.y + 0.5;
        to_linear(self.ground)
            .lerp(to_linear(self.sky), weight)
            .scale(self.intensity)
    }
}

/// Light shining from `position` towards the origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing at the light
    pub fn direction(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }

    pub fn irradiance(&self, normal: Vec3) -> Rgb {
        let n_dot_l = normal.dot(self.direction()).max(0.0);
        to_linear(self.color).scale(self.intensity * n_dot_l)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lights {
    pub hemisphere: HemisphereLight,
    pub key: DirectionalLight,
    /// Back light outlining the silhouette
    pub rim: DirectionalLight,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            hemisphere: HemisphereLight {
                sky: Rgb::WHITE,
                ground: Rgb::from_hex(0xfff0e0),
                intensity: 1.8,
            },
            key: DirectionalLight {
                color: Rgb::WHITE,
                intensity: 0.4,
                position: Vec3::new(5.0, 10.0, 5.0),
            },
            rim: DirectionalLight {
                color: Rgb::from_hex(0xfff8f0),
                intensity: 0.3,
                position: Vec3::new(-5.0, 5.0, -5.0),
            },
        }
    }
}

impl Lights {
    /// Lit linear colour of a diffuse surface
    pub fn shade(&self, albedo: Rgb, normal: Vec3) -> Rgb {
        let irradiance = self
            .hemisphere
            .irradiance(normal)
            .add(self.key.irradiance(normal))
            .add(self.rim.irradiance(normal));
        to_linear(albedo).mul(irradiance.scale(LAMBERT_SCALE))
    }
}

/// Linear distance fog
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: Rgb::from_hex(BACKGROUND),
            near: 12.0,
            far: 28.0,
        }
    }
}

impl Fog {
    /// 0 before `near`, 1 at and beyond `far`
    pub fn factor(&self, depth: f32) -> f32 {
        if self.far <= self.near {
            return if depth >= self.far { 1.0 } else { 0.0 };
        }
        ((depth - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }

    /// Blend a linear colour towards the fog colour
    pub fn apply(&self, color: Rgb, depth: f32) -> Rgb {
        color.lerp(to_linear(self.color), self.factor(depth))
    }
}
