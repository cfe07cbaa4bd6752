//! Builder application state and main loop
//!
//! The window starts on the body selection screen. Once a body is chosen the
//! builder shows the part toolbar, the 3D viewport and whichever control
//! panel matches the selection. Camera acquisition and PNG export run in the
//! background and are polled once per frame.

mod init;
mod snapshot;
mod viewport;

pub use init::AppError;
pub use snapshot::{MAX_SNAPSHOT_SIZE, snapshot};
pub use viewport::{Viewport, render_size, viewport_ray};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use eframe::egui;
use monster_core::config::{BuilderConfig, Config};
use monster_core::export::export_dir;
use monster_core::{
    BodyShape, CameraCapture, CameraDevices, Exporter, Interaction, Monster, OrbitCamera, Renderer,
    Selection,
};

use crate::ui::{CameraOverlay, SelectionScreen, ToolbarState, UiAction};

const INITIAL_SIZE: (u32, u32) = (960, 640);

/// Everything that belongs to the monster being built
pub struct Stage {
    pub monster: Monster,
    pub interaction: Interaction,
    pub camera: OrbitCamera,
}

impl Stage {
    pub fn new(shape: BodyShape, builder: &BuilderConfig) -> Self {
        let mut monster = Monster::new(shape);
        monster.set_mouth_style(builder.mouth_style);
        monster.breathing = builder.breathing;
        Self {
            monster,
            interaction: Interaction::new(),
            camera: OrbitCamera::default(),
        }
    }
}

/// Builder application state
pub struct App {
    /// User configuration
    config: Config,
    selection_screen: SelectionScreen,
    /// `None` until a body has been chosen
    stage: Option<Stage>,
    renderer: Renderer,
    viewport: Viewport,
    capture: CameraCapture,
    devices: Arc<dyn CameraDevices>,
    /// Present while the camera overlay is open
    camera_overlay: Option<CameraOverlay>,
    exporter: Exporter,
    started: Instant,
    /// Last export result or error (shown in the status bar)
    status: Option<String>,
}

impl App {
    /// Create the application. With `body` set the selection screen is skipped.
    pub fn new(config: Config, body: Option<BodyShape>) -> Self {
        let mut capture = CameraCapture::new();
        capture.output_size = config.camera.output_size;
        capture.tightening = config.camera.tightening;
        capture.circular_mask = config.camera.circular_mask;

        let directory = config
            .export
            .directory
            .clone()
            .or_else(|| export_dir().ok())
            .unwrap_or_else(|| PathBuf::from("exports"));

        Self {
            selection_screen: SelectionScreen::new(config.builder.default_body),
            stage: body.map(|shape| Stage::new(shape, &config.builder)),
            renderer: Renderer::new(INITIAL_SIZE.0, INITIAL_SIZE.1),
            viewport: Viewport::default(),
            capture,
            devices: config.camera.devices(),
            camera_overlay: None,
            exporter: Exporter::new(directory),
            started: Instant::now(),
            status: None,
            config,
        }
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn camera_open(&self) -> bool {
        self.camera_overlay.is_some()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn close_camera(&mut self) {
        self.capture.close();
        self.camera_overlay = None;
    }

    /// Collect finished background work.
    ///
    /// Returns a message for a blocking alert when the camera could not be
    /// opened.
    pub fn poll_background(&mut self) -> Option<String> {
        if let Some(result) = self.exporter.poll() {
            self.status = Some(match result {
                Ok(path) => format!("Saved {}", path.display()),
                Err(e) => {
                    tracing::error!("Export failed: {:#}", e);
                    format!("Export failed: {e}")
                }
            });
        }

        match self.capture.poll() {
            Some(Err(e)) => {
                tracing::error!("Camera unavailable: {}", e);
                self.close_camera();
                Some(format!("Could not access the camera.\n\n{e}"))
            }
            _ => None,
        }
    }

    /// Handle UI actions
    pub fn handle_ui_action(&mut self, action: UiAction) {
        if let UiAction::ChooseBody(shape) = action {
            tracing::info!("Building a {} monster", shape);
            self.stage = Some(Stage::new(shape, &self.config.builder));
            return;
        }

        match action {
            UiAction::OpenCamera => {
                tracing::info!("Opening camera");
                self.capture.start(Arc::clone(&self.devices));
                self.camera_overlay = Some(CameraOverlay::default());
                return;
            }
            UiAction::CloseCamera => {
                self.close_camera();
                return;
            }
            UiAction::DismissStatus => {
                self.status = None;
                return;
            }
            _ => {}
        }

        let Some(stage) = self.stage.as_mut() else {
            tracing::debug!("Ignoring {:?} without a monster", action);
            return;
        };
        let Stage {
            monster,
            interaction,
            camera,
        } = stage;

        let events = match action {
            UiAction::StartDrag(kind) => {
                camera.enabled = false;
                interaction.start_drag_new(monster, kind)
            }
            UiAction::SetMouthStyle(style) => {
                monster.set_mouth_style(style);
                self.config.builder.mouth_style = style;
                Vec::new()
            }
            UiAction::CaptureSkin { screen, guide_size } => {
                let events = match self.capture.capture(screen, guide_size) {
                    Some(skin) => {
                        monster.apply_skin(skin);
                        interaction.select_body(monster)
                    }
                    None => {
                        tracing::warn!("No camera frame to capture");
                        Vec::new()
                    }
                };
                self.capture.close();
                self.camera_overlay = None;
                events
            }
            UiAction::Export => {
                if self.exporter.is_saving() {
                    return;
                }
                self.exporter.request(self.renderer.image().clone());
                self.status = Some("Saving...".to_string());
                Vec::new()
            }
            UiAction::RotatePart(axis, degrees) => {
                interaction.rotate_selected(monster, axis, degrees);
                Vec::new()
            }
            UiAction::ScalePart(scale) => {
                interaction.scale_selected(monster, scale);
                Vec::new()
            }
            UiAction::DeletePart => interaction.delete_selected(monster),
            UiAction::SkinBrightness(value) => {
                monster.set_skin_brightness(value);
                Vec::new()
            }
            UiAction::SkinOffsetY(value) => {
                monster.set_skin_offset_y(value);
                Vec::new()
            }
            UiAction::SkinRepeat(value) => {
                monster.set_skin_repeat(value);
                Vec::new()
            }
            UiAction::CloseSkinPanel => interaction.deselect(monster),
            UiAction::ChooseBody(_)
            | UiAction::OpenCamera
            | UiAction::CloseCamera
            | UiAction::DismissStatus => Vec::new(),
        };

        for event in events {
            tracing::debug!("{:?}", event);
        }
    }

    /// Keyboard shortcuts in the builder: Delete removes the selected part,
    /// Escape cancels a drag
    fn handle_keys(&mut self, ctx: &egui::Context) -> Option<UiAction> {
        let stage = self.stage.as_mut()?;
        let (delete, escape) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Delete),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if escape && stage.interaction.is_dragging() {
            stage.interaction.cancel_drag(&mut stage.monster);
            stage.camera.enabled = true;
        }
        let part_selected = matches!(stage.interaction.selection(), Selection::Part { .. });
        (delete && part_selected && !ctx.wants_keyboard_input()).then_some(UiAction::DeletePart)
    }

    fn show_builder(&mut self, ctx: &egui::Context) -> Option<UiAction> {
        let mut ui_action = None;

        if let Some(ref status) = self.status {
            egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(status);
                    if ui.button("Dismiss").clicked() {
                        ui_action = Some(UiAction::DismissStatus);
                    }
                });
            });
        }

        let scanning = self.camera_overlay.is_some();
        let stage = self.stage.as_mut()?;

        let toolbar_state = ToolbarState {
            mouth_style: stage.monster.mouth_style(),
            saving: self.exporter.is_saving(),
            scanning,
        };
        if let Some(action) = crate::ui::toolbar(ctx, toolbar_state) {
            ui_action = Some(action);
        }

        if !scanning {
            let panel_action = match stage.interaction.selection() {
                Selection::Part { .. } => stage
                    .interaction
                    .selected_adjustment(&stage.monster)
                    .and_then(|adjustment| crate::ui::part_panel(ctx, adjustment)),
                Selection::Body => crate::ui::skin_panel(
                    ctx,
                    stage.monster.skin_settings(),
                    stage.monster.has_skin(),
                ),
                Selection::None => None,
            };
            if panel_action.is_some() {
                ui_action = panel_action;
            }
        }

        stage
            .monster
            .update(self.started.elapsed().as_secs_f32());
        let render_scale = self.config.video.clamped_render_scale();
        for event in self
            .viewport
            .show(ctx, stage, &mut self.renderer, render_scale, !scanning)
        {
            tracing::debug!("{:?}", event);
        }

        if let Some(overlay) = &mut self.camera_overlay {
            let camera = &self.config.camera;
            if let Some(action) =
                overlay.show(ctx, &mut self.capture, |width| camera.guide_size(width))
            {
                ui_action = Some(action);
            }
        }

        ui_action
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle F11 for fullscreen toggle
        if ctx.input(|i| i.key_pressed(egui::Key::F11)) {
            let is_fullscreen = ctx.input(|i| i.viewport().fullscreen).unwrap_or(false);
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!is_fullscreen));
            self.config.video.fullscreen = !is_fullscreen;
            if let Err(e) = monster_core::config::save(&self.config) {
                tracing::warn!("Failed to save config: {:#}", e);
            }
        }

        if let Some(message) = self.poll_background() {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title("Camera")
                .set_description(message)
                .set_buttons(rfd::MessageButtons::Ok)
                .show();
        }

        let ui_action = if self.stage.is_none() {
            self.selection_screen.show(ctx)
        } else {
            let key_action = self.handle_keys(ctx);
            self.show_builder(ctx).or(key_action)
        };

        if let Some(action) = ui_action {
            self.handle_ui_action(action);
        }

        // Breathing and camera damping animate every frame
        ctx.request_repaint();
    }
}

/// Run the builder application
pub fn run(config: Config, body: Option<BodyShape>) -> Result<(), AppError> {
    tracing::info!("Starting Monster Builder");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Monster Builder")
            .with_inner_size([INITIAL_SIZE.0 as f32, INITIAL_SIZE.1 as f32])
            .with_fullscreen(config.video.fullscreen),
        ..Default::default()
    };

    eframe::run_native(
        "Monster Builder",
        native_options,
        Box::new(move |_cc| Ok(Box::new(App::new(config, body)))),
    )
    .map_err(|e| AppError::EventLoop(format!("eframe error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use monster_core::interaction::RotationAxis;
    use monster_core::{MouthStyle, PartKind, Surface};
    use std::time::Duration;

    fn app_with_exports(dir: &std::path::Path) -> App {
        let mut config = Config::default();
        config.export.directory = Some(dir.to_path_buf());
        App::new(config, None)
    }

    fn built_app() -> App {
        let mut app = App::new(Config::default(), None);
        app.handle_ui_action(UiAction::ChooseBody(BodyShape::Peanut));
        app
    }

    /// Attach a part directly and select it
    fn select_new_part(app: &mut App, kind: PartKind) -> monster_core::NodeId {
        let stage = app.stage.as_mut().unwrap();
        let part = stage.monster.spawn_part(kind, Surface::Body).unwrap();
        stage.interaction.select_part(&mut stage.monster, part);
        part
    }

    fn wait_until(app: &mut App, mut done: impl FnMut(&mut App) -> bool) {
        let start = Instant::now();
        while !done(app) {
            assert!(app.poll_background().is_none(), "unexpected camera failure");
            assert!(start.elapsed() < Duration::from_secs(10), "timed out");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    // =============================================================
    // Selection screen
    // =============================================================

    #[test]
    fn test_starts_on_selection_screen() {
        let app = App::new(Config::default(), None);
        assert!(app.stage().is_none());
    }

    #[test]
    fn test_cli_body_skips_selection_screen() {
        let app = App::new(Config::default(), Some(BodyShape::Cube));
        assert_eq!(app.stage().map(|s| s.monster.shape()), Some(BodyShape::Cube));
    }

    #[test]
    fn test_choose_body_uses_builder_config() {
        let mut config = Config::default();
        config.builder.mouth_style = MouthStyle::Fangs;
        config.builder.breathing = false;
        let mut app = App::new(config, None);
        app.handle_ui_action(UiAction::ChooseBody(BodyShape::Waterdrop));

        let stage = app.stage().unwrap();
        assert_eq!(stage.monster.mouth_style(), MouthStyle::Fangs);
        assert!(!stage.monster.breathing);
    }

    #[test]
    fn test_actions_without_monster_are_ignored() {
        let mut app = App::new(Config::default(), None);
        app.handle_ui_action(UiAction::StartDrag(PartKind::Eye));
        app.handle_ui_action(UiAction::DeletePart);
        assert!(app.stage().is_none());
    }

    // =============================================================
    // Toolbar
    // =============================================================

    #[test]
    fn test_start_drag_disables_orbit() {
        let mut app = built_app();
        app.handle_ui_action(UiAction::StartDrag(PartKind::Horn));
        let stage = app.stage().unwrap();
        assert!(stage.interaction.is_placing());
        assert!(!stage.camera.enabled);
    }

    #[test]
    fn test_mouth_style_is_remembered() {
        let mut app = built_app();
        app.handle_ui_action(UiAction::SetMouthStyle(MouthStyle::Fangs));
        assert_eq!(app.stage().unwrap().monster.mouth_style(), MouthStyle::Fangs);
        assert_eq!(app.config().builder.mouth_style, MouthStyle::Fangs);
    }

    // =============================================================
    // Part panel
    // =============================================================

    #[test]
    fn test_part_sliders_adjust_selection() {
        let mut app = built_app();
        select_new_part(&mut app, PartKind::Ear);

        app.handle_ui_action(UiAction::RotatePart(RotationAxis::Y, 45.0));
        app.handle_ui_action(UiAction::RotatePart(RotationAxis::Z, -30.0));
        app.handle_ui_action(UiAction::ScalePart(1.5));

        let stage = app.stage().unwrap();
        let adjustment = stage.interaction.selected_adjustment(&stage.monster).unwrap();
        assert_eq!(adjustment.yaw_deg, 45.0);
        assert_eq!(adjustment.roll_deg, -30.0);
        assert_eq!(adjustment.scale, 1.5);
    }

    #[test]
    fn test_delete_part() {
        let mut app = built_app();
        let part = select_new_part(&mut app, PartKind::Arm);
        app.handle_ui_action(UiAction::DeletePart);

        let stage = app.stage().unwrap();
        assert!(!stage.monster.is_attached_part(part));
        assert_eq!(stage.interaction.selection(), Selection::None);
    }

    // =============================================================
    // Skin panel and camera
    // =============================================================

    #[test]
    fn test_capture_applies_skin_and_selects_body() {
        let mut app = built_app();
        app.handle_ui_action(UiAction::OpenCamera);
        assert!(app.camera_open());
        wait_until(&mut app, |app| app.capture.is_active());

        app.handle_ui_action(UiAction::CaptureSkin {
            screen: (800.0, 600.0),
            guide_size: 400.0,
        });

        assert!(!app.camera_open());
        assert!(!app.capture.is_active());
        let stage = app.stage().unwrap();
        assert!(stage.monster.has_skin());
        assert_eq!(stage.interaction.selection(), Selection::Body);
    }

    #[test]
    fn test_skin_sliders_and_close() {
        let mut app = built_app();
        {
            let stage = app.stage.as_mut().unwrap();
            stage.interaction.select_body(&mut stage.monster);
        }
        app.handle_ui_action(UiAction::SkinBrightness(1.2));
        app.handle_ui_action(UiAction::SkinOffsetY(-0.5));
        app.handle_ui_action(UiAction::SkinRepeat(3.0));

        let settings = app.stage().unwrap().monster.skin_settings();
        assert_eq!(settings.brightness, 1.2);
        assert_eq!(settings.offset_y, -0.5);
        assert_eq!(settings.repeat, 3.0);

        app.handle_ui_action(UiAction::CloseSkinPanel);
        assert_eq!(app.stage().unwrap().interaction.selection(), Selection::None);
    }

    #[test]
    fn test_close_camera_releases_stream() {
        let mut app = built_app();
        app.handle_ui_action(UiAction::OpenCamera);
        app.handle_ui_action(UiAction::CloseCamera);
        assert!(!app.camera_open());
        assert!(!app.capture.is_pending());
        assert!(!app.capture.is_active());
    }

    // =============================================================
    // Export
    // =============================================================

    #[test]
    fn test_export_reports_saved_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_exports(dir.path());
        app.handle_ui_action(UiAction::ChooseBody(BodyShape::Cube));
        app.handle_ui_action(UiAction::Export);
        assert_eq!(app.status(), Some("Saving..."));

        wait_until(&mut app, |app| !app.exporter.is_saving());
        app.poll_background();
        let status = app.status().unwrap_or_default().to_string();
        assert!(status.starts_with("Saved"), "{status}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        app.handle_ui_action(UiAction::DismissStatus);
        assert!(app.status().is_none());
    }
}
