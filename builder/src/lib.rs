//! Monster Builder desktop application
//!
//! eframe/egui front end over `monster-core`: the selection screen, the
//! builder toolbar and panels, the 3D viewport and the camera overlay.

pub mod app;
pub mod ui;
