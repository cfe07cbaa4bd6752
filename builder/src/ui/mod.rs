//! egui panels for the builder
//!
//! Every panel draws itself and reports what the user did as a [`UiAction`].
//! The application applies actions after the UI pass, so panels never touch
//! the monster directly.

mod camera_overlay;
mod panels;
mod selection_screen;
mod toolbar;

pub use camera_overlay::CameraOverlay;
pub use panels::{part_panel, skin_panel};
pub use selection_screen::SelectionScreen;
pub use toolbar::{ToolbarState, toolbar};

use monster_core::{BodyShape, MouthStyle, PartKind, RotationAxis};

/// Actions the user can trigger from the builder UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Build a monster on the chosen body and leave the selection screen
    ChooseBody(BodyShape),
    /// Begin dragging a new part in from the toolbar
    StartDrag(PartKind),
    /// Style used for mouths created from now on
    SetMouthStyle(MouthStyle),
    /// Show the camera overlay and start acquiring a stream
    OpenCamera,
    /// Hide the camera overlay and release the stream
    CloseCamera,
    /// Crop the guide area of the live preview into a skin.
    ///
    /// `screen` is the preview size and `guide_size` the guide diameter,
    /// both in points.
    CaptureSkin { screen: (f32, f32), guide_size: f32 },
    /// Write the current view to a PNG
    Export,
    /// Absolute rotation of the selected part in degrees
    RotatePart(RotationAxis, f32),
    /// Absolute uniform scale of the selected part
    ScalePart(f32),
    DeletePart,
    SkinBrightness(f32),
    SkinOffsetY(f32),
    SkinRepeat(f32),
    /// Close the skin panel (deselects the body)
    CloseSkinPanel,
    DismissStatus,
}

/// Upload-ready copy of a rendered or captured frame
pub(crate) fn color_image(image: &image::RgbaImage) -> egui::ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}
