//! Application error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(String),
    #[error("Invalid snapshot size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Failed to write {path}: {message}")]
    Export { path: PathBuf, message: String },
}
