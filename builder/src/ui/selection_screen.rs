//! Body selection screen shown before building starts

use egui::{Context, TextureHandle, TextureOptions, Vec2};
use monster_core::{BodyShape, Monster, OrbitCamera, Renderer};

use super::{UiAction, color_image};

const PREVIEW_SIZE: (u32, u32) = (192, 160);

/// One card per body shape, each with a rendered preview
pub struct SelectionScreen {
    /// Chosen with Enter
    highlighted: BodyShape,
    previews: Vec<(BodyShape, TextureHandle)>,
}

impl SelectionScreen {
    pub fn new(highlighted: BodyShape) -> Self {
        Self {
            highlighted,
            previews: Vec::new(),
        }
    }

    pub fn highlighted(&self) -> BodyShape {
        self.highlighted
    }

    fn load_previews(&mut self, ctx: &Context) {
        if !self.previews.is_empty() {
            return;
        }
        let (width, height) = PREVIEW_SIZE;
        let mut renderer = Renderer::new(width, height);
        let camera = OrbitCamera::default();
        for shape in BodyShape::ALL {
            let monster = Monster::new(shape);
            let image = renderer.render(monster.graph(), &camera);
            let texture = ctx.load_texture(
                format!("body_preview_{shape}"),
                color_image(image),
                TextureOptions::LINEAR,
            );
            self.previews.push((shape, texture));
        }
        tracing::debug!("Rendered {} body previews", self.previews.len());
    }

    pub fn show(&mut self, ctx: &Context) -> Option<UiAction> {
        self.load_previews(ctx);
        let mut action = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.heading("Choose your monster");
                ui.add_space(24.0);
            });

            let size = Vec2::new(PREVIEW_SIZE.0 as f32, PREVIEW_SIZE.1 as f32);
            ui.horizontal_wrapped(|ui| {
                for (shape, texture) in &self.previews {
                    let image = egui::Image::new(egui::load::SizedTexture::new(texture.id(), size));
                    let card = egui::Button::image_and_text(image, shape.label())
                        .selected(*shape == self.highlighted);
                    let response = ui.add(card);
                    if response.hovered() {
                        self.highlighted = *shape;
                    }
                    if response.clicked() {
                        action = Some(UiAction::ChooseBody(*shape));
                    }
                }
            });
        });

        if action.is_none() && ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
            action = Some(UiAction::ChooseBody(self.highlighted));
        }
        action
    }
}
