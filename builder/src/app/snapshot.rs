//! Headless rendering of a bare body

use std::path::Path;

use monster_core::config::BuilderConfig;
use monster_core::export::save_png;
use monster_core::{BodyShape, Renderer};

use super::{AppError, Stage};

/// Largest snapshot side in pixels
pub const MAX_SNAPSHOT_SIZE: u32 = 8192;

/// Render `shape` from the default viewpoint and write it to `out` as PNG
pub fn snapshot(shape: BodyShape, width: u32, height: u32, out: &Path) -> Result<(), AppError> {
    if width == 0 || height == 0 || width > MAX_SNAPSHOT_SIZE || height > MAX_SNAPSHOT_SIZE {
        return Err(AppError::InvalidSize { width, height });
    }

    // Breathing off: the pose at rest
    let builder = BuilderConfig {
        breathing: false,
        ..Default::default()
    };
    let stage = Stage::new(shape, &builder);
    let mut renderer = Renderer::new(width, height);
    let image = renderer.render(stage.monster.graph(), &stage.camera);

    save_png(image, out).map_err(|e| AppError::Export {
        path: out.to_path_buf(),
        message: format!("{e:#}"),
    })?;
    tracing::info!("Wrote {} snapshot to {}", shape, out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("peanut.png");
        snapshot(BodyShape::Peanut, 64, 48, &out).unwrap();

        let image = image::open(&out).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (64, 48));
        // Body in the middle, background in the corner
        assert_ne!(image.get_pixel(32, 24), image.get_pixel(0, 0));
    }

    #[test]
    fn test_snapshot_rejects_zero_size() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.png");
        assert!(matches!(
            snapshot(BodyShape::Cube, 0, 10, &out),
            Err(AppError::InvalidSize { width: 0, height: 10 })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_snapshot_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing").join("body.png");
        assert!(matches!(
            snapshot(BodyShape::Waterdrop, 8, 8, &out),
            Err(AppError::Export { .. })
        ));
    }
}
