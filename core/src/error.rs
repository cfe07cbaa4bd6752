//! Camera capture errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// A single device request failed; the next constraint set is tried
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("No video device found after all attempts.")]
    NoDevice,
    #[error("camera produced no frame within {0:?}")]
    Timeout(std::time::Duration),
    #[error("camera acquisition thread stopped unexpectedly")]
    Disconnected,
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
