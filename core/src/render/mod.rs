//! Software renderer
//!
//! Draws a [`SceneGraph`] from an [`OrbitCamera`] into an RGBA image. Opaque
//! meshes go first with depth writes; translucent meshes (drag previews, the
//! ground shadow) follow, sorted back to front and blended without writing
//! depth.

mod lighting;
mod raster;

pub use lighting::{BACKGROUND, DirectionalLight, Fog, HemisphereLight, Lights, to_display, to_linear};
pub use raster::{ClipVertex, DepthMode, Fragment, FrameBuffer};

use glam::{Mat3, Mat4, Vec3};
use image::RgbaImage;
use tracing::trace;

use crate::scene::{Material, MeshInstance, NodeId, Rgb, SceneGraph};
use crate::view::OrbitCamera;

pub struct Renderer {
    frame: FrameBuffer,
    image: RgbaImage,
    pub lights: Lights,
    pub fog: Fog,
    pub background: Rgb,
}

struct DrawItem<'a> {
    instance: &'a MeshInstance,
    world: Mat4,
    /// View-space distance of the bounds centre
    depth: f32,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        let frame = FrameBuffer::new(width, height);
        let (width, height) = frame.size();
        Self {
            frame,
            image: RgbaImage::new(width, height),
            lights: Lights::default(),
            fog: Fog::default(),
            background: Rgb::from_hex(BACKGROUND),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.frame.size()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.frame.size() != (width.max(1), height.max(1)) {
            self.frame = FrameBuffer::new(width, height);
        }
    }

    /// Last rendered frame
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn render(&mut self, scene: &SceneGraph, camera: &OrbitCamera) -> &RgbaImage {
        let (width, height) = self.frame.size();
        let aspect = width as f32 / height as f32;
        let view = camera.view_matrix();
        let view_projection = camera.projection_matrix(aspect) * view;
        let eye = camera.eye();

        self.frame.clear(to_linear(self.background));

        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for (id, world) in scene.visible_meshes(scene.root()) {
            let Some(item) = draw_item(scene, id, world, view) else {
                continue;
            };
            if item.instance.material.is_transparent() {
                transparent.push(item);
            } else {
                opaque.push(item);
            }
        }
        transparent.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        trace!(
            "render {width}x{height}: {} opaque, {} transparent",
            opaque.len(),
            transparent.len()
        );

        for item in &opaque {
            self.draw(item, view_projection, eye, DepthMode::ReadWrite);
        }
        for item in &transparent {
            self.draw(item, view_projection, eye, DepthMode::ReadOnly);
        }

        self.frame.resolve(&mut self.image);
        &self.image
    }

    fn draw(&mut self, item: &DrawItem<'_>, view_projection: Mat4, eye: Vec3, depth_mode: DepthMode) {
        let mesh = &item.instance.mesh;
        let material = &item.instance.material;
        let mvp = view_projection * item.world;
        let normal_matrix = Mat3::from_mat4(item.world.inverse().transpose());

        let vertices: Vec<ClipVertex> = mesh
            .positions
            .iter()
            .enumerate()
            .map(|(i, &p)| ClipVertex {
                clip: mvp * p.extend(1.0),
                world_position: item.world.transform_point3(p),
                world_normal: normal_matrix * mesh.normals.get(i).copied().unwrap_or(Vec3::Y),
                uv: mesh.uvs.get(i).copied().unwrap_or_default(),
            })
            .collect();

        let lights = &self.lights;
        let fog = &self.fog;
        for tri in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle_indices(tri);
            let (Some(&a), Some(&b), Some(&c)) = (vertices.get(a), vertices.get(b), vertices.get(c))
            else {
                continue;
            };
            self.frame
                .draw_triangle([a, b, c], material.opacity, depth_mode, |fragment| {
                    shade(material, lights, fog, eye, fragment)
                });
        }
    }
}

fn draw_item(scene: &SceneGraph, id: NodeId, world: Mat4, view: Mat4) -> Option<DrawItem<'_>> {
    let instance = scene.node(id)?.mesh.as_ref()?;
    let center = world.transform_point3(instance.bounds.0);
    let depth = -view.transform_point3(center).z;
    Some(DrawItem {
        instance,
        world,
        depth,
    })
}

fn shade(material: &Material, lights: &Lights, fog: &Fog, eye: Vec3, fragment: &Fragment) -> Rgb {
    let mut albedo = material.color;
    if let Some(skin) = &material.skin {
        albedo = albedo.mul(skin.sample(fragment.uv));
    }

    let color = if material.unlit {
        to_linear(albedo)
    } else {
        let to_eye = eye - fragment.world_position;
        // Double-sided: light the face turned towards the camera
        let normal = if fragment.normal.dot(to_eye) < 0.0 {
            -fragment.normal
        } else {
            fragment.normal
        };
        lights.shade(albedo, normal)
    };
    let color = color.add(to_linear(material.emission()));
    let depth = eye.distance(fragment.world_position);
    fog.apply(color, depth)
}
