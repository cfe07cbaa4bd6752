//! Still image export
//!
//! Saves rendered frames as PNG files named `emotion_monster_<time>.png`.
//! Encoding and disk I/O run on a background thread; the UI polls for the
//! result once per frame.

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

/// File name prefix of exported images
pub const EXPORT_PREFIX: &str = "emotion_monster";
const SOFTWARE_KEYWORD: &str = "Software";
const SOFTWARE_NAME: &str = "Monster Builder";

/// Background PNG writer.
pub struct Exporter {
    directory: PathBuf,
    /// Channel for receiving save completion notifications
    save_receiver: Option<mpsc::Receiver<Result<PathBuf>>>,
}

impl Exporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            save_receiver: None,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Save `image` in the background. A new request replaces the pending
    /// result channel of an earlier one.
    pub fn request(&mut self, image: RgbaImage) {
        let directory = self.directory.clone();
        let (tx, rx) = mpsc::channel();
        self.save_receiver = Some(rx);

        thread::spawn(move || {
            let result = export_to(&image, &directory);
            let _ = tx.send(result);
        });
    }

    pub fn is_saving(&self) -> bool {
        self.save_receiver.is_some()
    }

    /// Returns the result once the pending save has completed.
    pub fn poll(&mut self) -> Option<Result<PathBuf>> {
        let receiver = self.save_receiver.as_ref()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.save_receiver = None;
                Some(result)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.save_receiver = None;
                Some(Err(anyhow!("Export thread stopped before finishing")))
            }
        }
    }
}

/// Default export directory under the platform data directory.
pub fn export_dir() -> Result<PathBuf> {
    let dir = crate::config::data_dir()
        .context("Failed to get project directories")?
        .join("exports");
    Ok(dir)
}

/// Timestamped file name that does not collide with an existing file in `dir`
fn unique_filename(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    let base = format!("{EXPORT_PREFIX}_{stamp}");
    let mut path = dir.join(format!("{base}.png"));
    let mut n = 2;
    while path.exists() {
        path = dir.join(format!("{base}_{n}.png"));
        n += 1;
    }
    path
}

fn export_to(image: &RgbaImage, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).context("Failed to create export directory")?;
    let path = unique_filename(dir);
    save_png(image, &path)?;
    tracing::info!("Monster exported: {}", path.display());
    Ok(path)
}

/// Write `image` to `path` as an 8-bit RGBA PNG with a `Software` text chunk.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder
        .add_text_chunk(SOFTWARE_KEYWORD.to_string(), SOFTWARE_NAME.to_string())
        .context("Failed to add text chunk")?;

    let mut png_writer = encoder
        .write_header()
        .context("Failed to write PNG header")?;
    png_writer
        .write_image_data(image.as_raw())
        .context("Failed to write PNG data")?;
    png_writer.finish().context("Failed to finish PNG")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::{Duration, Instant};

    fn wait(exporter: &mut Exporter) -> Result<PathBuf> {
        let start = Instant::now();
        loop {
            if let Some(result) = exporter.poll() {
                return result;
            }
            assert!(start.elapsed() < Duration::from_secs(10), "export timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_save_png_with_text_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monster.png");
        let image = RgbaImage::from_pixel(5, 3, Rgba([137, 214, 241, 255]));
        save_png(&image, &path).unwrap();

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (5, 3));
        assert!(
            info.uncompressed_latin1_text
                .iter()
                .any(|t| t.keyword == SOFTWARE_KEYWORD && t.text == SOFTWARE_NAME)
        );

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded, image);
    }

    #[test]
    fn test_request_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let mut exporter = Exporter::new(&target);
        assert!(exporter.poll().is_none());

        exporter.request(RgbaImage::new(4, 4));
        assert!(exporter.is_saving());
        let path = wait(&mut exporter).unwrap();

        assert!(!exporter.is_saving());
        assert!(path.exists());
        assert_eq!(path.parent(), Some(target.as_path()));
        let name = path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("emotion_monster_"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_repeated_exports_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = Exporter::new(dir.path());
        exporter.request(RgbaImage::new(2, 2));
        let first = wait(&mut exporter).unwrap();
        exporter.request(RgbaImage::new(2, 2));
        let second = wait(&mut exporter).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_export_into_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();

        let mut exporter = Exporter::new(&blocker);
        exporter.request(RgbaImage::new(2, 2));
        assert!(wait(&mut exporter).is_err());
    }

    #[test]
    fn test_lost_save_thread_reports_error() {
        let mut exporter = Exporter::new("unused");
        let (tx, rx) = mpsc::channel::<Result<PathBuf>>();
        drop(tx);
        exporter.save_receiver = Some(rx);

        let result = exporter.poll();
        assert!(matches!(result, Some(Err(_))));
        assert!(!exporter.is_saving());
        assert!(exporter.poll().is_none());
    }
}
