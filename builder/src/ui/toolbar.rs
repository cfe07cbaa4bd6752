//! Part palette and document actions

use egui::{Context, Sense};
use monster_core::{MouthStyle, PartKind};

use super::UiAction;

/// What the toolbar needs to know about the application
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolbarState {
    pub mouth_style: MouthStyle,
    /// An export is being written
    pub saving: bool,
    /// The camera overlay is open
    pub scanning: bool,
}

/// Left-hand toolbar.
///
/// Pressing a part button starts a drag straight away; the part follows the
/// pointer into the viewport and is placed where the button is released.
pub fn toolbar(ctx: &Context, state: ToolbarState) -> Option<UiAction> {
    let mut action = None;

    egui::SidePanel::left("toolbar")
        .resizable(false)
        .exact_width(140.0)
        .show(ctx, |ui| {
            // The camera overlay owns the pointer while it is open
            ui.add_enabled_ui(!state.scanning, |ui| {
                ui.heading("Parts");
                ui.add_space(6.0);

                for kind in PartKind::ALL {
                    let button = egui::Button::new(kind.label()).min_size(egui::vec2(120.0, 28.0));
                    let response = ui.add(button.sense(Sense::click_and_drag()));
                    let pressed = ui.input(|i| i.pointer.primary_pressed());
                    if pressed && response.is_pointer_button_down_on() {
                        action = Some(UiAction::StartDrag(kind));
                    }
                }

                ui.separator();
                ui.label("Mouth");
                ui.horizontal(|ui| {
                    for style in [MouthStyle::Lips, MouthStyle::Fangs] {
                        if ui
                            .selectable_label(state.mouth_style == style, style.label())
                            .clicked()
                            && state.mouth_style != style
                        {
                            action = Some(UiAction::SetMouthStyle(style));
                        }
                    }
                });

                ui.separator();
                if ui.button("Scan skin").clicked() {
                    action = Some(UiAction::OpenCamera);
                }
                let save_label = if state.saving { "Saving..." } else { "Save" };
                if ui
                    .add_enabled(!state.saving, egui::Button::new(save_label))
                    .clicked()
                {
                    action = Some(UiAction::Export);
                }
            });
        });

    action
}
