//! Avatar compositor.
//! Looks up a player/team picture, scales it to a square, masks it to the inscribed
//! circle and pastes it onto the board.
//! Unmapped identities and missing files are the normal case and leave the canvas untouched.

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Identity (pseudo or team name) -> picture path.
#[derive(Clone, Debug, Default)]
pub struct AvatarTable {
    entries: HashMap<String, PathBuf>,
}

impl AvatarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON object `{ "identity": "path.png" }`.
    /// Relative paths are resolved against the JSON file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read avatar table: {}", path.display()))?;
        let entries: HashMap<String, PathBuf> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse avatar table: {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let mut table = Self::new();
        for (identity, file) in entries {
            table.insert(identity, base.join(file));
        }
        log::info!("Loaded {} avatar(s) from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn insert(&mut self, identity: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(identity.into(), path.into());
    }

    pub fn resolve(&self, identity: &str) -> Option<&Path> {
        self.entries.get(identity).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Single-channel mask: 255 inside the circle inscribed in a `diameter` square, 0 outside.
pub fn circle_mask(diameter: u32) -> GrayImage {
    let center = (diameter as f32 - 1.0) / 2.0;
    let radius = diameter as f32 / 2.0;
    GrayImage::from_fn(diameter, diameter, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        if dx * dx + dy * dy <= radius * radius {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Pastes the avatar for `identity` at `offset` (top-left, may be negative).
///
/// Returns `Ok(false)` without touching the canvas when the identity is unmapped,
/// the file is absent or `diameter` is zero. A present but undecodable file is an error.
pub fn composite(
    identity: &str,
    diameter: u32,
    offset: (i32, i32),
    canvas: &mut RgbaImage,
    table: &AvatarTable,
) -> Result<bool> {
    let Some(path) = table.resolve(identity) else {
        log::debug!("No avatar mapped for '{}'", identity);
        return Ok(false);
    };
    if !path.exists() {
        log::debug!("Avatar for '{}' missing on disk: {}", identity, path.display());
        return Ok(false);
    }
    if diameter == 0 {
        return Ok(false);
    }

    let source = image::open(path)
        .with_context(|| format!("Failed to decode avatar: {}", path.display()))?
        .to_rgba8();
    let scaled = imageops::resize(&source, diameter, diameter, FilterType::CatmullRom);
    let mask = circle_mask(diameter);
    paste_masked(canvas, &scaled, &mask, offset);
    Ok(true)
}

/// Copies `src` pixels where `mask` is set; everything else on the canvas is left as is.
fn paste_masked(canvas: &mut RgbaImage, src: &RgbaImage, mask: &GrayImage, (ox, oy): (i32, i32)) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    for (mx, my, m) in mask.enumerate_pixels() {
        if m[0] == 0 {
            continue;
        }
        let x = i64::from(ox) + i64::from(mx);
        let y = i64::from(oy) + i64::from(my);
        if x < 0 || y < 0 || x >= cw || y >= ch {
            continue;
        }
        canvas.put_pixel(x as u32, y as u32, *src.get_pixel(mx, my));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BG: Rgba<u8> = Rgba([10, 20, 30, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    // Resampling may shift a solid color by a unit
    fn is_red(p: &Rgba<u8>) -> bool {
        p[0] >= 250 && p[1] <= 5 && p[2] <= 5
    }

    fn write_avatar(dir: &Path, name: &str, size: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(size, size, RED).save(&path).unwrap();
        path
    }

    #[test]
    fn test_circle_mask_shape() {
        let mask = circle_mask(20);
        assert_eq!(mask.dimensions(), (20, 20));
        assert_eq!(mask.get_pixel(10, 10)[0], 255);
        assert_eq!(mask.get_pixel(0, 10)[0], 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(19, 19)[0], 0);
    }

    #[test]
    fn test_unmapped_identity_leaves_canvas_untouched() {
        let mut canvas = RgbaImage::from_pixel(50, 50, BG);
        let before = canvas.clone();
        let drawn = composite("nobody", 20, (5, 5), &mut canvas, &AvatarTable::new()).unwrap();
        assert!(!drawn);
        assert_eq!(canvas, before);
    }

    #[test]
    fn test_missing_file_leaves_canvas_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = AvatarTable::new();
        table.insert("Kira", dir.path().join("kira.png"));
        let mut canvas = RgbaImage::from_pixel(50, 50, BG);
        let before = canvas.clone();
        assert!(!composite("Kira", 20, (5, 5), &mut canvas, &table).unwrap());
        assert_eq!(canvas, before);
    }

    #[test]
    fn test_composite_pastes_inside_circle_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = AvatarTable::new();
        table.insert("Kira", write_avatar(dir.path(), "kira.png", 64));
        let mut canvas = RgbaImage::from_pixel(50, 50, BG);

        assert!(composite("Kira", 20, (10, 10), &mut canvas, &table).unwrap());
        assert!(is_red(canvas.get_pixel(20, 20)));
        // Square corner lies outside the circle
        assert_eq!(canvas.get_pixel(10, 10), &BG);
        // Outside the pasted square entirely
        assert_eq!(canvas.get_pixel(35, 35), &BG);
    }

    #[test]
    fn test_composite_clips_negative_offset() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = AvatarTable::new();
        table.insert("Kira", write_avatar(dir.path(), "kira.png", 8));
        let mut canvas = RgbaImage::from_pixel(30, 30, BG);

        assert!(composite("Kira", 20, (-10, -10), &mut canvas, &table).unwrap());
        assert!(is_red(canvas.get_pixel(0, 0)));
        assert_eq!(canvas.get_pixel(15, 15), &BG);
    }

    #[test]
    fn test_undecodable_avatar_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"not a png").unwrap();
        let mut table = AvatarTable::new();
        table.insert("Broken", path);
        let mut canvas = RgbaImage::from_pixel(10, 10, BG);
        assert!(composite("Broken", 5, (0, 0), &mut canvas, &table).is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("avatars.json");
        fs::write(&json, r#"{"Kira": "pp/kira.png"}"#).unwrap();

        let table = AvatarTable::load(&json).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve("Kira"), Some(dir.path().join("pp/kira.png").as_path()));
        assert_eq!(table.resolve("kira"), None);
    }
}
