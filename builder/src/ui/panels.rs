//! Side panels bound to the current selection

use egui::{Align2, Context, Slider};
use monster_core::{PartAdjustment, RotationAxis, SkinSettings};

use super::UiAction;

const PANEL_OFFSET: [f32; 2] = [-16.0, -16.0];

/// Rotate and scale controls for the selected part
pub fn part_panel(ctx: &Context, adjustment: PartAdjustment) -> Option<UiAction> {
    let mut action = None;

    egui::Window::new("Part")
        .anchor(Align2::RIGHT_BOTTOM, PANEL_OFFSET)
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            let mut yaw = adjustment.yaw_deg;
            if ui
                .add(Slider::new(&mut yaw, -180.0..=180.0).step_by(1.0).suffix("°").text("Rotate Y"))
                .changed()
            {
                action = Some(UiAction::RotatePart(RotationAxis::Y, yaw));
            }

            let mut roll = adjustment.roll_deg;
            if ui
                .add(Slider::new(&mut roll, -180.0..=180.0).step_by(1.0).suffix("°").text("Rotate Z"))
                .changed()
            {
                action = Some(UiAction::RotatePart(RotationAxis::Z, roll));
            }

            let mut scale = adjustment.scale;
            if ui
                .add(Slider::new(&mut scale, 0.5..=2.0).step_by(0.1).text("Scale"))
                .changed()
            {
                action = Some(UiAction::ScalePart(scale));
            }

            ui.separator();
            if ui.button("Delete").clicked() {
                action = Some(UiAction::DeletePart);
            }
        });

    action
}

/// Brightness and texture placement for the body skin
pub fn skin_panel(ctx: &Context, settings: SkinSettings, has_skin: bool) -> Option<UiAction> {
    let mut action = None;

    egui::Window::new("Skin")
        .anchor(Align2::RIGHT_BOTTOM, PANEL_OFFSET)
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            let mut brightness = settings.brightness;
            if ui
                .add(Slider::new(&mut brightness, 0.5..=1.5).step_by(0.05).text("Brightness"))
                .changed()
            {
                action = Some(UiAction::SkinBrightness(brightness));
            }

            // Placement only matters once a photo is on the body
            ui.add_enabled_ui(has_skin, |ui| {
                let mut offset_y = settings.offset_y;
                if ui
                    .add(Slider::new(&mut offset_y, -1.0..=1.0).step_by(0.05).text("Offset Y"))
                    .changed()
                {
                    action = Some(UiAction::SkinOffsetY(offset_y));
                }

                let mut repeat = settings.repeat;
                if ui
                    .add(Slider::new(&mut repeat, 0.5..=4.0).step_by(0.1).text("Repeat"))
                    .changed()
                {
                    action = Some(UiAction::SkinRepeat(repeat));
                }
            });

            ui.separator();
            if ui.button("Close").clicked() {
                action = Some(UiAction::CloseSkinPanel);
            }
        });

    action
}
