//! Canvas module.
//! Loads the board template as RGBA and writes the finished board back to disk.
//! The output is flattened to RGB; the encoder is picked from the file extension.

use crate::error::LeaderboardError;
use anyhow::{bail, Context, Result};
use image::{DynamicImage, RgbaImage};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Opens the base template. A missing file is fatal.
pub fn load_template(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(LeaderboardError::TemplateNotFound(path.to_path_buf()).into());
    }
    let start = Instant::now();
    let template = image::open(path)
        .with_context(|| format!("Failed to decode template image: {}", path.display()))?
        .to_rgba8();

    if template.dimensions() == (0, 0) {
        bail!("Template {} is empty", path.display());
    }
    log::debug!(
        "Loaded template {} ({}x{}) in {:?}",
        path.display(),
        template.width(),
        template.height(),
        start.elapsed()
    );
    Ok(template)
}

/// Saves `canvas` without its alpha channel, creating parent directories as needed.
pub fn save_output(canvas: RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    DynamicImage::ImageRgba8(canvas)
        .to_rgb8()
        .save(path)
        .with_context(|| format!("Failed to save board image to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba};

    #[test]
    fn test_missing_template_is_fatal() {
        let err = load_template(Path::new("no/such/template.png")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LeaderboardError>(),
            Some(LeaderboardError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_save_then_load_flattens_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/board.png");
        let canvas = RgbaImage::from_pixel(4, 3, Rgba([12, 34, 56, 100]));

        save_output(canvas, &path).unwrap();
        let written = image::open(&path).unwrap();
        assert_eq!(written.dimensions(), (4, 3));
        assert!(!written.color().has_alpha());

        let reloaded = load_template(&path).unwrap();
        assert_eq!(reloaded.get_pixel(0, 0), &Rgba([12, 34, 56, 255]));
    }
}
