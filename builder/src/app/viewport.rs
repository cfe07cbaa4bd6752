//! 3D viewport: renders the monster into a texture and routes the pointer

use egui::{Context, PointerButton, Pos2, Rect, Sense, TextureHandle, TextureOptions};
use glam::Vec2;
use monster_core::{InteractionEvent, OrbitCamera, Ray, Renderer};

use super::Stage;
use crate::ui::color_image;

/// Radians of orbit per point of pointer travel, relative to viewport height
const ORBIT_SPEED: f32 = std::f32::consts::TAU;
/// Zoom exponent per point of scroll
const ZOOM_SPEED: f32 = 0.002;

/// World ray through `pos`, a point inside the viewport `rect`
pub fn viewport_ray(camera: &OrbitCamera, rect: Rect, pos: Pos2) -> Ray {
    let local = pos - rect.min;
    let ndc = OrbitCamera::pixel_to_ndc(
        Vec2::new(local.x, local.y),
        Vec2::new(rect.width(), rect.height()),
    );
    camera.ray_from_ndc(ndc, rect.width() / rect.height().max(1.0))
}

/// Render target size in physical pixels
pub fn render_size(rect: Rect, pixels_per_point: f32, render_scale: f32) -> (u32, u32) {
    let scale = pixels_per_point * render_scale;
    let width = (rect.width() * scale).round().max(1.0) as u32;
    let height = (rect.height() * scale).round().max(1.0) as u32;
    (width, height)
}

#[derive(Default)]
pub struct Viewport {
    texture: Option<TextureHandle>,
}

impl Viewport {
    /// Draw the viewport into the central panel.
    ///
    /// With `input` false the frame is still rendered but the pointer is
    /// ignored (an overlay is open).
    pub fn show(
        &mut self,
        ctx: &Context,
        stage: &mut Stage,
        renderer: &mut Renderer,
        render_scale: f32,
        input: bool,
    ) -> Vec<InteractionEvent> {
        let mut events = Vec::new();

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let response = ui.allocate_rect(rect, Sense::click_and_drag());

                if input {
                    events = route_pointer(ctx, &response, rect, stage);
                }

                stage.camera.update();
                let (width, height) = render_size(rect, ctx.pixels_per_point(), render_scale);
                renderer.resize(width, height);
                let image = color_image(renderer.render(stage.monster.graph(), &stage.camera));
                match &mut self.texture {
                    Some(texture) => texture.set(image, TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("viewport", image, TextureOptions::LINEAR))
                    }
                }

                if let Some(texture) = &self.texture {
                    let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                    ui.painter()
                        .image(texture.id(), rect, uv, egui::Color32::WHITE);
                }
            });

        events
    }
}

/// Feed this frame's pointer input to the interaction state and the camera
fn route_pointer(
    ctx: &Context,
    response: &egui::Response,
    rect: Rect,
    stage: &mut Stage,
) -> Vec<InteractionEvent> {
    let mut events = Vec::new();
    let (pressed, released, pos, delta, scroll) = ctx.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.latest_pos(),
            i.pointer.delta(),
            i.smooth_scroll_delta.y,
        )
    });
    let Stage {
        monster,
        interaction,
        camera,
    } = stage;

    if pressed
        && response.is_pointer_button_down_on()
        && let Some(pos) = pos
    {
        let ray = viewport_ray(camera, rect, pos);
        events.extend(interaction.pointer_down(monster, &ray));
    }

    if interaction.is_dragging() {
        if let Some(pos) = pos {
            let ray = viewport_ray(camera, rect, pos);
            interaction.pointer_move(monster, &ray);
        }
    } else if response.dragged_by(PointerButton::Primary)
        || response.dragged_by(PointerButton::Secondary)
        || response.dragged_by(PointerButton::Middle)
    {
        let speed = ORBIT_SPEED / rect.height().max(1.0);
        camera.orbit(-delta.x * speed, delta.y * speed);
    }

    // The release may land anywhere, e.g. back on the toolbar
    if released && interaction.is_dragging() {
        events.extend(interaction.pointer_up(monster));
    }

    if response.hovered() && scroll != 0.0 {
        camera.zoom((-scroll * ZOOM_SPEED).exp());
    }

    camera.enabled = !interaction.is_placing();
    events
}
