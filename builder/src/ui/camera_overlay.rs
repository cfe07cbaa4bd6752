//! Full-window camera preview with the capture guide

use std::sync::Arc;

use egui::{Color32, Context, Order, Pos2, Rect, Stroke, TextureHandle, TextureOptions};
use image::RgbaImage;
use monster_core::CameraCapture;
use monster_core::capture::cover_visible_rect;

use super::{UiAction, color_image};

const BUTTON_STRIP: f32 = 64.0;
const GUIDE_STROKE: f32 = 3.0;

/// Preview texture of the running camera
#[derive(Default)]
pub struct CameraOverlay {
    texture: Option<TextureHandle>,
    /// Frame the texture was uploaded from
    shown: Option<Arc<RgbaImage>>,
}

/// Texture coordinates of the part of a `buffer`-sized frame that stays
/// visible when it covers `screen`
pub fn cover_uv(buffer: (u32, u32), screen: (f32, f32)) -> Option<Rect> {
    let (w, h) = (buffer.0 as f32, buffer.1 as f32);
    let visible = cover_visible_rect((w, h), screen)?;
    Some(Rect::from_min_max(
        Pos2::new(visible.x / w, visible.y / h),
        Pos2::new((visible.x + visible.width) / w, (visible.y + visible.height) / h),
    ))
}

impl CameraOverlay {
    fn upload(&mut self, ctx: &Context, frame: Arc<RgbaImage>) {
        if self
            .shown
            .as_ref()
            .is_some_and(|shown| Arc::ptr_eq(shown, &frame))
        {
            return;
        }
        let image = color_image(&frame);
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("camera_preview", image, TextureOptions::LINEAR))
            }
        }
        self.shown = Some(frame);
    }

    /// Draw over the whole window.
    ///
    /// `guide_size` maps the preview width to the guide diameter.
    pub fn show(
        &mut self,
        ctx: &Context,
        capture: &mut CameraCapture,
        guide_size: impl Fn(f32) -> f32,
    ) -> Option<UiAction> {
        if let Some(frame) = capture.latest_frame() {
            self.upload(ctx, frame);
        }

        let screen = ctx.input(|i| i.screen_rect());
        let preview = Rect::from_min_max(
            screen.min,
            Pos2::new(screen.max.x, (screen.max.y - BUTTON_STRIP).max(screen.min.y)),
        );
        let guide = guide_size(preview.width());
        let mut action = None;

        egui::Area::new(egui::Id::new("camera_overlay"))
            .order(Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                let painter = ui.painter();
                painter.rect_filled(screen, 0.0, Color32::BLACK);

                match (&self.texture, &self.shown) {
                    (Some(texture), Some(frame)) => {
                        if let Some(uv) =
                            cover_uv(frame.dimensions(), (preview.width(), preview.height()))
                        {
                            painter.image(texture.id(), preview, uv, Color32::WHITE);
                        }
                    }
                    _ => {
                        let message = if capture.is_pending() {
                            "Starting camera..."
                        } else {
                            "No camera"
                        };
                        painter.text(
                            preview.center(),
                            egui::Align2::CENTER_CENTER,
                            message,
                            egui::FontId::proportional(20.0),
                            Color32::LIGHT_GRAY,
                        );
                    }
                }

                let center = preview.center() - egui::vec2(0.0, capture.offset_y * preview.height());
                painter.circle_stroke(
                    center,
                    guide / 2.0,
                    Stroke::new(GUIDE_STROKE, Color32::from_white_alpha(200)),
                );

                let strip = Rect::from_min_max(Pos2::new(screen.min.x, preview.max.y), screen.max);
                let button_size = egui::vec2(110.0, 36.0);
                let capture_rect = Rect::from_center_size(strip.center() - egui::vec2(64.0, 0.0), button_size);
                let close_rect = Rect::from_center_size(strip.center() + egui::vec2(64.0, 0.0), button_size);

                if ui.put(capture_rect, egui::Button::new("Capture")).clicked() && capture.is_active() {
                    action = Some(UiAction::CaptureSkin {
                        screen: (preview.width(), preview.height()),
                        guide_size: guide,
                    });
                }
                if ui.put(close_rect, egui::Button::new("Close")).clicked() {
                    action = Some(UiAction::CloseCamera);
                }
            });

        if action.is_none() && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            action = Some(UiAction::CloseCamera);
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_uv_crops_wide_frame() {
        let uv = cover_uv((1600, 900), (900.0, 900.0)).unwrap();
        assert!((uv.min.x - 0.21875).abs() < 1e-5);
        assert!((uv.max.x - 0.78125).abs() < 1e-5);
        assert_eq!(uv.min.y, 0.0);
        assert_eq!(uv.max.y, 1.0);
    }

    #[test]
    fn test_cover_uv_matching_aspect_is_full() {
        let uv = cover_uv((640, 480), (320.0, 240.0)).unwrap();
        assert_eq!(uv, Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)));
    }

    #[test]
    fn test_cover_uv_degenerate() {
        assert!(cover_uv((0, 480), (320.0, 240.0)).is_none());
        assert!(cover_uv((640, 480), (0.0, 240.0)).is_none());
    }
}
