//! Camera capture
//!
//! Acquires a video stream (walking a fallback chain of constraints), shows
//! its latest frame as a preview and crops the area under the on-screen guide
//! into a square skin texture.
//!
//! Acquisition runs on a background thread; the UI polls [`PendingStream`]
//! once per frame, the same way finished exports are collected.

mod crop;
mod device;
mod skin;

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::{info, warn};

use crate::error::CaptureError;

pub use crop::{
    CaptureGeometry, DEFAULT_TIGHTENING, GUIDE_FRACTION, GUIDE_MAX_PX, SourceRect, VisibleRect,
    cover_visible_rect, default_guide_size, source_rect,
};
pub use device::{
    CameraDevices, Facing, IDEAL_RESOLUTION, StillImageCamera, StreamConstraints,
    TestPatternCamera, VideoStream,
};
pub use skin::{DEFAULT_REPEAT, SkinTexture};

/// Side length of the captured texture
pub const OUTPUT_SIZE: u32 = 1024;
/// Radius of the optional circular mask relative to half the output size
pub const MASK_RADIUS: f32 = 0.98;
/// How long to wait for the first frame once a device has opened
pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the first device that satisfies the fallback chain and wait for
/// its first frame.
pub fn acquire_stream(
    devices: &dyn CameraDevices,
    first_frame_timeout: Duration,
) -> Result<Box<dyn VideoStream>, CaptureError> {
    let chain = StreamConstraints::fallback_chain();
    let mut opened = None;

    for (attempt, constraints) in chain.iter().enumerate() {
        match devices.open(constraints) {
            Ok(stream) => {
                info!("Camera opened: {constraints}");
                opened = Some(stream);
                break;
            }
            Err(e) => {
                if let Some(next) = chain.get(attempt + 1) {
                    warn!("{constraints} not available ({e}), trying {next}...");
                } else {
                    warn!("{constraints} not available ({e})");
                }
            }
        }
    }

    let mut stream = opened.ok_or(CaptureError::NoDevice)?;

    let deadline = Instant::now() + first_frame_timeout;
    loop {
        if stream.frame().is_some() {
            return Ok(stream);
        }
        if Instant::now() >= deadline {
            stream.stop();
            return Err(CaptureError::Timeout(first_frame_timeout));
        }
        thread::sleep(Duration::from_millis(10));
    }
}

/// Camera acquisition running on a background thread
pub struct PendingStream {
    receiver: mpsc::Receiver<Result<Box<dyn VideoStream>, CaptureError>>,
}

impl PendingStream {
    pub fn spawn(devices: Arc<dyn CameraDevices>, first_frame_timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let result = acquire_stream(devices.as_ref(), first_frame_timeout);
            // Nobody is waiting any more; release the device we just opened
            if let Err(mpsc::SendError(Ok(mut stream))) = sender.send(result) {
                stream.stop();
                info!("Camera acquisition abandoned, stream stopped");
            }
        });
        Self { receiver }
    }

    /// Check for the outcome without blocking
    pub fn poll(&self) -> Option<Result<Box<dyn VideoStream>, CaptureError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(CaptureError::Disconnected)),
        }
    }
}

/// Circle mask with a soft one-pixel edge
fn apply_circular_mask(image: &mut RgbaImage) {
    let size = image.width().min(image.height()) as f32;
    let center = size / 2.0;
    let radius = center * MASK_RADIUS;
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
        pixel.0[3] = (pixel.0[3] as f32 * coverage) as u8;
    }
}

/// Camera stream state plus capture settings
pub struct CameraCapture {
    stream: Option<Box<dyn VideoStream>>,
    pending: Option<PendingStream>,
    latest: Option<Arc<RgbaImage>>,
    /// Vertical shift of the capture square, fraction of visible height
    pub offset_y: f32,
    pub output_size: u32,
    pub tightening: f32,
    pub circular_mask: bool,
    pub first_frame_timeout: Duration,
}

impl Default for CameraCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraCapture {
    pub fn new() -> Self {
        Self {
            stream: None,
            pending: None,
            latest: None,
            offset_y: 0.0,
            output_size: OUTPUT_SIZE,
            tightening: DEFAULT_TIGHTENING,
            circular_mask: false,
            first_frame_timeout: FIRST_FRAME_TIMEOUT,
        }
    }

    /// Begin acquiring a stream in the background.
    ///
    /// Does nothing while a stream is open or already being acquired.
    pub fn start(&mut self, devices: Arc<dyn CameraDevices>) {
        if self.stream.is_some() || self.pending.is_some() {
            return;
        }
        self.pending = Some(PendingStream::spawn(devices, self.first_frame_timeout));
    }

    /// Collect the result of [`start`](Self::start).
    ///
    /// Returns `Some(Ok(()))` once the stream is live, `Some(Err(..))` when
    /// acquisition failed, and `None` while still waiting (or idle).
    pub fn poll(&mut self) -> Option<Result<(), CaptureError>> {
        let result = self.pending.as_ref()?.poll()?;
        self.pending = None;
        Some(result.map(|stream| self.attach(stream)))
    }

    /// Adopt an already open stream, replacing any current one
    pub fn attach(&mut self, stream: Box<dyn VideoStream>) {
        self.stop();
        let (w, h) = stream.dimensions();
        info!("Camera stream active ({w}x{h})");
        self.stream = Some(stream);
    }

    /// Stop the device and forget the stream
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("Camera stream stopped");
        }
        self.latest = None;
    }

    /// Abandon an in-flight acquisition as well as any open stream
    pub fn close(&mut self) {
        self.pending = None;
        self.stop();
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Pull the newest frame for the preview
    pub fn latest_frame(&mut self) -> Option<Arc<RgbaImage>> {
        if let Some(frame) = self.stream.as_mut().and_then(|s| s.frame()) {
            self.latest = Some(frame);
        }
        self.latest.clone()
    }

    /// Crop the area under the guide from the latest frame.
    ///
    /// `screen` is the size of the preview area and `guide_size` the guide's
    /// diameter, both in screen pixels. Returns `None` without a stream or
    /// frame, or when the geometry is degenerate.
    pub fn capture(&mut self, screen: (f32, f32), guide_size: f32) -> Option<SkinTexture> {
        let frame = self.latest_frame()?;
        let buffer = frame.dimensions();

        let geometry = CaptureGeometry {
            guide_size,
            tightening: self.tightening,
            offset_y: self.offset_y,
            ..CaptureGeometry::new(buffer, screen)
        };
        let rect = source_rect(&geometry)?;
        let (x, y, size) = rect.to_pixels(buffer);

        let cropped = imageops::crop_imm(frame.as_ref(), x, y, size, size).to_image();
        let output = self.output_size.max(1);
        let mut image = imageops::resize(&cropped, output, output, FilterType::Triangle);
        if self.circular_mask {
            apply_circular_mask(&mut image);
        }

        info!("Captured {size}x{size} at ({x}, {y}) into {output}x{output} skin");
        Some(SkinTexture::new(image))
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts open attempts and succeeds only for "any"
    #[derive(Default)]
    struct AnyOnly {
        attempts: AtomicUsize,
    }

    impl CameraDevices for AnyOnly {
        fn open(
            &self,
            constraints: &StreamConstraints,
        ) -> Result<Box<dyn VideoStream>, CaptureError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            TestPatternCamera {
                width: 64,
                height: 48,
                facing: Facing::Environment,
            }
            .open(&StreamConstraints {
                facing: constraints.facing.map(|_| Facing::User),
                ..*constraints
            })
        }
    }

    struct NoCameras;

    impl CameraDevices for NoCameras {
        fn open(&self, _: &StreamConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
            Err(CaptureError::PermissionDenied)
        }
    }

    struct Silent;

    struct SilentStream;

    impl VideoStream for SilentStream {
        fn dimensions(&self) -> (u32, u32) {
            (0, 0)
        }
        fn frame(&mut self) -> Option<Arc<RgbaImage>> {
            None
        }
        fn stop(&mut self) {}
        fn is_stopped(&self) -> bool {
            false
        }
    }

    impl CameraDevices for Silent {
        fn open(&self, _: &StreamConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
            Ok(Box::new(SilentStream))
        }
    }

    /// Delivers its first frame after a delay and records `stop()`
    struct SlowStart {
        stopped: Arc<AtomicBool>,
    }

    struct SlowStream {
        opened: Instant,
        stopped: Arc<AtomicBool>,
    }

    impl VideoStream for SlowStream {
        fn dimensions(&self) -> (u32, u32) {
            (8, 8)
        }
        fn frame(&mut self) -> Option<Arc<RgbaImage>> {
            if self.is_stopped() || self.opened.elapsed() < Duration::from_millis(100) {
                return None;
            }
            Some(Arc::new(RgbaImage::new(8, 8)))
        }
        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
        fn is_stopped(&self) -> bool {
            self.stopped.load(Ordering::SeqCst)
        }
    }

    impl CameraDevices for SlowStart {
        fn open(&self, _: &StreamConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
            Ok(Box::new(SlowStream {
                opened: Instant::now(),
                stopped: Arc::clone(&self.stopped),
            }))
        }
    }

    /// Frame with a red square in the centre on a blue background
    struct Target;

    impl CameraDevices for Target {
        fn open(&self, _: &StreamConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
            let image = RgbaImage::from_fn(400, 200, |x, y| {
                if (150..250).contains(&x) && (50..150).contains(&y) {
                    Rgba([255, 0, 0, 255])
                } else {
                    Rgba([0, 0, 255, 255])
                }
            });
            let dir = tempfile::tempdir()?;
            let path = dir.path().join("target.png");
            image.save(&path)?;
            StillImageCamera::new(path).open(&StreamConstraints::any())
        }
    }

    // =============================================================
    // Acquisition
    // =============================================================

    #[test]
    fn test_acquire_walks_fallback_chain() {
        let devices = AnyOnly::default();
        let stream = acquire_stream(&devices, Duration::from_secs(1));
        assert!(stream.is_ok());
        assert_eq!(devices.attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_acquire_no_device() {
        let err = acquire_stream(&NoCameras, Duration::from_secs(1)).err();
        assert!(matches!(err, Some(CaptureError::NoDevice)));
        assert_eq!(
            err.map(|e| e.to_string()),
            Some("No video device found after all attempts.".to_string())
        );
    }

    #[test]
    fn test_acquire_times_out_without_frame() {
        let err = acquire_stream(&Silent, Duration::from_millis(30)).err();
        assert!(matches!(err, Some(CaptureError::Timeout(_))));
    }

    #[test]
    fn test_pending_stream_resolves() {
        let pending = PendingStream::spawn(
            Arc::new(TestPatternCamera::default()),
            Duration::from_secs(2),
        );
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = pending.poll() {
                assert!(result.is_ok());
                break;
            }
            assert!(Instant::now() < deadline, "acquisition never finished");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_close_during_acquisition_stops_stream() {
        let stopped = Arc::new(AtomicBool::new(false));
        let mut capture = CameraCapture::new();
        capture.start(Arc::new(SlowStart {
            stopped: Arc::clone(&stopped),
        }));
        assert!(capture.is_pending());
        capture.close();
        assert!(!capture.is_pending());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !stopped.load(Ordering::SeqCst) {
            assert!(
                Instant::now() < deadline,
                "abandoned stream was never stopped"
            );
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!capture.is_active());
    }

    // =============================================================
    // Capture
    // =============================================================

    #[test]
    fn test_capture_without_stream() {
        let mut capture = CameraCapture::new();
        assert!(!capture.is_active());
        assert!(capture.capture((800.0, 600.0), 400.0).is_none());
    }

    #[test]
    fn test_capture_crops_guide_area() {
        let mut capture = CameraCapture::new();
        capture.output_size = 32;
        let stream = Target.open(&StreamConstraints::any()).expect("stream");
        capture.attach(stream);
        assert!(capture.is_active());

        // Screen matches the buffer, guide of 100px tightened to 90px: all red
        let skin = capture.capture((400.0, 200.0), 100.0).expect("skin");
        assert_eq!(skin.dimensions(), (32, 32));
        assert_eq!(skin.repeat, DEFAULT_REPEAT);
        assert!(skin.image.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_stop_releases_stream() {
        let mut capture = CameraCapture::new();
        capture.attach(Target.open(&StreamConstraints::any()).expect("stream"));
        assert!(capture.latest_frame().is_some());
        capture.stop();
        assert!(!capture.is_active());
        assert!(capture.latest_frame().is_none());
    }

    #[test]
    fn test_circular_mask_clears_corners() {
        let mut image = RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255]));
        apply_circular_mask(&mut image);
        assert_eq!(image.get_pixel(0, 0).0[3], 0);
        assert_eq!(image.get_pixel(32, 32).0[3], 255);
    }
}
