//! Monster Builder core
//!
//! Everything behind the toy that does not need a window: procedural
//! geometry, the transform hierarchy the monster is assembled in, ray picking,
//! the drag-and-drop attachment state machine, camera capture for skins, a
//! software renderer and PNG export.
//!
//! # Architecture
//!
//! - [`Monster`] - Scene graph with the body, attached parts and drag previews
//! - [`Interaction`] - Pointer state machine that places, moves and selects parts
//! - [`CameraCapture`] - Camera stream and guide-to-texture cropping
//! - [`Renderer`] - Draws a [`SceneGraph`] from an [`OrbitCamera`]
//! - [`Exporter`] - Background PNG export

pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod interaction;
pub mod monster;
pub mod parts;
pub mod procedural;
pub mod raycast;
pub mod render;
pub mod scene;
pub mod view;

pub use capture::{CameraCapture, CameraDevices, SkinTexture};
pub use config::Config;
pub use error::CaptureError;
pub use export::Exporter;
pub use interaction::{DragMode, Interaction, InteractionEvent, RotationAxis, Selection};
pub use monster::{BodyShape, Monster, PartAdjustment, SkinSettings, Surface};
pub use parts::{MouthStyle, PartKind};
pub use raycast::{Ray, RayHit};
pub use render::Renderer;
pub use scene::{NodeId, SceneGraph};
pub use view::OrbitCamera;
