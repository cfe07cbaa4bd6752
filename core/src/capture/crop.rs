//! Guide-to-buffer crop mapping
//!
//! The live preview fills the screen with cover-fit, so part of the camera
//! buffer is off screen. These functions map the on-screen square around the
//! circular guide back to a square in buffer pixels.

/// Largest guide diameter in screen pixels
pub const GUIDE_MAX_PX: f32 = 400.0;
/// Guide diameter as a fraction of the screen width
pub const GUIDE_FRACTION: f32 = 0.8;
/// Shrink factor keeping the capture inside the guide circle
pub const DEFAULT_TIGHTENING: f32 = 0.9;

/// Inputs for one capture, all in pixels except `offset_y`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureGeometry {
    /// Camera buffer size
    pub buffer: (f32, f32),
    /// Screen (viewport) size the preview is shown in
    pub screen: (f32, f32),
    /// Guide diameter on screen
    pub guide_size: f32,
    pub tightening: f32,
    /// Vertical shift as a fraction of the visible buffer height; positive moves up
    pub offset_y: f32,
}

impl CaptureGeometry {
    /// Geometry with the default guide size and tightening
    pub fn new(buffer: (u32, u32), screen: (f32, f32)) -> Self {
        Self {
            buffer: (buffer.0 as f32, buffer.1 as f32),
            screen,
            guide_size: default_guide_size(screen.0),
            tightening: DEFAULT_TIGHTENING,
            offset_y: 0.0,
        }
    }
}

/// Part of the buffer that is visible on screen
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Square region of the buffer to sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl SourceRect {
    /// Integer pixel rectangle `(x, y, size)` that stays inside `buffer`
    pub fn to_pixels(&self, buffer: (u32, u32)) -> (u32, u32, u32) {
        let limit = buffer.0.min(buffer.1);
        let size = (self.size.round() as u32).clamp(1, limit.max(1));
        let x = (self.x.floor().max(0.0) as u32).min(buffer.0.saturating_sub(size));
        let y = (self.y.floor().max(0.0) as u32).min(buffer.1.saturating_sub(size));
        (x, y, size)
    }
}

pub fn default_guide_size(screen_width: f32) -> f32 {
    (screen_width * GUIDE_FRACTION).min(GUIDE_MAX_PX)
}

fn valid(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Visible sub-rectangle of the buffer under cover-fit.
///
/// Whichever axis overflows the screen aspect is cropped, centred.
pub fn cover_visible_rect(buffer: (f32, f32), screen: (f32, f32)) -> Option<VisibleRect> {
    let (bw, bh) = buffer;
    let (sw, sh) = screen;
    if !(valid(bw) && valid(bh) && valid(sw) && valid(sh)) {
        return None;
    }

    let buffer_aspect = bw / bh;
    let screen_aspect = sw / sh;

    let rect = if buffer_aspect > screen_aspect {
        // Wider than the screen, width is cropped
        let width = bh * screen_aspect;
        VisibleRect {
            x: (bw - width) / 2.0,
            y: 0.0,
            width,
            height: bh,
        }
    } else {
        // Taller than the screen, height is cropped
        let height = bw / screen_aspect;
        VisibleRect {
            x: 0.0,
            y: (bh - height) / 2.0,
            width: bw,
            height,
        }
    };
    Some(rect)
}

/// Square source rectangle in buffer pixels for the guide.
///
/// The result is always square and inside the buffer. `None` when any input
/// is zero, negative or not finite.
pub fn source_rect(geometry: &CaptureGeometry) -> Option<SourceRect> {
    if !(valid(geometry.guide_size) && valid(geometry.tightening) && geometry.offset_y.is_finite())
    {
        return None;
    }
    let visible = cover_visible_rect(geometry.buffer, geometry.screen)?;
    let (bw, bh) = geometry.buffer;

    let scale = visible.height / geometry.screen.1;
    let size = (geometry.guide_size * scale * geometry.tightening).min(bw.min(bh));

    let x = visible.x + (visible.width - size) / 2.0;
    let y = visible.y + (visible.height - size) / 2.0 - geometry.offset_y * visible.height;

    Some(SourceRect {
        x: x.clamp(0.0, bw - size),
        y: y.clamp(0.0, bh - size),
        size,
    })
}
