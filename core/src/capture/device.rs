//! Video sources
//!
//! [`CameraDevices`] is the seam a platform camera backend plugs into. Two
//! sources ship with the crate: an image file that behaves like a camera, and
//! a synthetic test pattern.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::error::CaptureError;

/// Requested ideal resolution for the first two fallback attempts
pub const IDEAL_RESOLUTION: (u32, u32) = (1280, 1280);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Rear camera
    Environment,
    /// Front (selfie) camera
    User,
}

/// What a single open attempt asks for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamConstraints {
    /// `None` accepts any camera
    pub facing: Option<Facing>,
    pub ideal_size: Option<(u32, u32)>,
}

impl StreamConstraints {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn facing(facing: Facing) -> Self {
        Self {
            facing: Some(facing),
            ideal_size: Some(IDEAL_RESOLUTION),
        }
    }

    /// Attempts in order: rear camera, front camera, anything
    pub fn fallback_chain() -> [StreamConstraints; 3] {
        [
            Self::facing(Facing::Environment),
            Self::facing(Facing::User),
            Self::any(),
        ]
    }
}

impl fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.facing, self.ideal_size) {
            (Some(facing), Some((w, h))) => write!(f, "{facing:?} camera at {w}x{h}"),
            (Some(facing), None) => write!(f, "{facing:?} camera"),
            (None, _) => f.write_str("any video source"),
        }
    }
}

/// An open camera stream
pub trait VideoStream: Send {
    /// Native frame size in pixels, `(0, 0)` until known
    fn dimensions(&self) -> (u32, u32);

    /// Most recent frame, `None` until the first one has arrived
    fn frame(&mut self) -> Option<Arc<RgbaImage>>;

    /// Release the device. Later calls to [`frame`](Self::frame) return `None`.
    fn stop(&mut self);

    fn is_stopped(&self) -> bool;
}

/// Opens streams matching a set of constraints
pub trait CameraDevices: Send + Sync {
    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CaptureError>;
}

// =============================================================
// Still image
// =============================================================

/// An image on disk presented as a camera with no known facing.
///
/// Only requests that accept any camera succeed.
#[derive(Clone, Debug)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

struct StillImageStream {
    image: Arc<RgbaImage>,
    stopped: bool,
}

impl VideoStream for StillImageStream {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn frame(&mut self) -> Option<Arc<RgbaImage>> {
        (!self.stopped).then(|| self.image.clone())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl CameraDevices for StillImageCamera {
    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
        if let Some(facing) = constraints.facing {
            return Err(CaptureError::Unavailable(format!(
                "{} has no {facing:?} camera",
                self.path.display()
            )));
        }
        let image = image::open(&self.path)?.to_rgba8();
        debug!(
            "opened still image camera {} ({}x{})",
            self.path.display(),
            image.width(),
            image.height()
        );
        Ok(Box::new(StillImageStream {
            image: Arc::new(image),
            stopped: false,
        }))
    }
}

// =============================================================
// Test pattern
// =============================================================

/// Synthetic animated camera
#[derive(Clone, Debug)]
pub struct TestPatternCamera {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
}

impl Default for TestPatternCamera {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            facing: Facing::Environment,
        }
    }
}

struct TestPatternStream {
    width: u32,
    height: u32,
    started: Instant,
    stopped: bool,
}

/// Diagonal colour bands over a checkerboard, drifting with `phase`
fn test_pattern(width: u32, height: u32, phase: f32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let u = x as f32 / width.max(1) as f32;
        let v = y as f32 / height.max(1) as f32;
        let band = ((u + v) * 6.0 + phase).sin() * 0.5 + 0.5;
        let checker = ((x / 64) + (y / 64)) % 2 == 0;
        let base = if checker { 0.85 } else { 0.65 };
        let r = (base * (0.6 + 0.4 * band) * 255.0) as u8;
        let g = (base * (0.9 - 0.3 * band) * 255.0) as u8;
        let b = (base * (0.7 + 0.3 * v) * 255.0) as u8;
        Rgba([r, g, b, 255])
    })
}

impl VideoStream for TestPatternStream {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame(&mut self) -> Option<Arc<RgbaImage>> {
        if self.stopped {
            return None;
        }
        let phase = self.started.elapsed().as_secs_f32();
        Some(Arc::new(test_pattern(self.width, self.height, phase)))
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl CameraDevices for TestPatternCamera {
    fn open(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
        if let Some(facing) = constraints.facing
            && facing != self.facing
        {
            return Err(CaptureError::Unavailable(format!("no {facing:?} camera")));
        }
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::Unavailable("zero-sized test pattern".into()));
        }
        Ok(Box::new(TestPatternStream {
            width: self.width,
            height: self.height,
            started: Instant::now(),
            stopped: false,
        }))
    }
}
