//! Font module.
//! Resolves a TrueType/OpenType font (configured path first, then system fallbacks)
//! and measures/draws single-line text with `ab_glyph`.
//! Sizes are em sizes in pixels. Measured boxes are anchored at the draw origin:
//! (right edge, bottom edge) of the inked glyphs, including the top bearing.

use crate::error::LeaderboardError;
use ab_glyph::{point, Font, FontArc, Glyph, GlyphId, PxScale, ScaleFont};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

const FALLBACK_FONTS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "C:/Windows/Fonts/arialbd.ttf",
    "C:/Windows/Fonts/arial.ttf",
];

/// Text measurement and rasterization at a given pixel size.
pub trait FontProvider {
    /// Width and height of the inked text when drawn at origin (0, 0).
    fn measure(&self, text: &str, size: u32) -> (u32, u32);

    /// Draws `text` with its origin at (`x`, `y`), alpha blending `color` over the canvas.
    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: u32, x: i32, y: i32, color: Rgba<u8>);
}

pub struct FontFile {
    font: FontArc,
    path: PathBuf,
}

impl std::fmt::Debug for FontFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFile").field("path", &self.path).finish()
    }
}

impl FontFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        let font = FontArc::try_from_vec(data)
            .map_err(|_| LeaderboardError::InvalidFont(path.to_path_buf()))?;
        Ok(Self {
            font,
            path: path.to_path_buf(),
        })
    }

    /// Tries `preferred`, then the system fallbacks; missing or unreadable candidates are skipped.
    pub fn resolve(preferred: Option<&Path>) -> Result<Self> {
        let candidates: Vec<PathBuf> = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FALLBACK_FONTS.iter().map(PathBuf::from))
            .collect();

        for candidate in &candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load(candidate) {
                Ok(font) => {
                    log::info!("Using font {}", candidate.display());
                    return Ok(font);
                }
                Err(e) => log::warn!("Skipping font {}: {:#}", candidate.display(), e),
            }
        }

        let tried = candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(LeaderboardError::FontNotFound { tried }.into())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scale whose em square is `size` pixels.
    fn scale(&self, size: u32) -> PxScale {
        let em = size as f32;
        match self.font.units_per_em() {
            Some(upem) => PxScale::from(em * self.font.height_unscaled() / upem),
            None => PxScale::from(em),
        }
    }

    /// Positions glyphs on one line with kerning; the first baseline sits at `origin.y + ascent`.
    fn layout(&self, text: &str, size: u32, origin: (f32, f32)) -> Vec<Glyph> {
        let scale = self.scale(size);
        let scaled = self.font.as_scaled(scale);
        let baseline = origin.1 + scaled.ascent();
        let mut caret = origin.0;
        let mut previous: Option<GlyphId> = None;
        let mut glyphs = Vec::with_capacity(text.len());

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(scale, point(caret, baseline)));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
        glyphs
    }
}

impl FontProvider for FontFile {
    fn measure(&self, text: &str, size: u32) -> (u32, u32) {
        let (mut right, mut bottom) = (0.0f32, 0.0f32);
        for glyph in self.layout(text, size, (0.0, 0.0)) {
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                right = right.max(bounds.max.x);
                bottom = bottom.max(bounds.max.y);
            }
        }
        (right.ceil() as u32, bottom.ceil() as u32)
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: u32, x: i32, y: i32, color: Rgba<u8>) {
        for glyph in self.layout(text, size, (x as f32, y as f32)) {
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let (min_x, min_y) = (bounds.min.x as i64, bounds.min.y as i64);
            outlined.draw(|gx, gy, coverage| {
                blend_pixel(canvas, min_x + i64::from(gx), min_y + i64::from(gy), color, coverage);
            });
        }
    }
}

/// Source-over blend of `color` scaled by `coverage`; pixels off the canvas are ignored.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0) * f32::from(color[3]) / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let inv = 1.0 - alpha;
    for i in 0..3 {
        dst[i] = (f32::from(color[i]) * alpha + f32::from(dst[i]) * inv).round() as u8;
    }
    dst[3] = (alpha * 255.0 + f32::from(dst[3]) * inv).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_pixel_full_and_partial() {
        let mut canvas = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        blend_pixel(&mut canvas, 0, 0, Rgba([255, 255, 255, 255]), 1.0);
        blend_pixel(&mut canvas, 1, 0, Rgba([200, 100, 0, 255]), 0.5);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(1, 0), &Rgba([100, 50, 0, 255]));
    }

    #[test]
    fn test_blend_pixel_respects_color_alpha() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        blend_pixel(&mut canvas, 0, 0, Rgba([0, 0, 0, 0]), 1.0);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_blend_pixel_ignores_out_of_bounds() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 255]));
        blend_pixel(&mut canvas, -1, 0, Rgba([255, 0, 0, 255]), 1.0);
        blend_pixel(&mut canvas, 0, 1, Rgba([255, 0, 0, 255]), 1.0);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_resolve_reports_missing_fonts() {
        let missing = Path::new("definitely/not/here.ttf");
        match FontFile::resolve(Some(missing)) {
            // A system fallback may exist on the test machine
            Ok(font) => assert_ne!(font.path(), missing),
            Err(e) => assert!(e.to_string().contains("not/here.ttf")),
        }
    }

    #[test]
    fn test_load_rejects_non_font_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.ttf");
        fs::write(&path, b"not a font").unwrap();
        assert!(FontFile::load(&path).is_err());
    }

    #[test]
    #[ignore = "requires DejaVu fonts installed"]
    fn test_measure_grows_with_size() {
        let font = FontFile::resolve(None).expect("no system font");
        let (w_small, h_small) = font.measure("Classement", 20);
        let (w_big, h_big) = font.measure("Classement", 40);
        assert!(w_big > w_small && h_big > h_small);
        assert_eq!(font.measure("", 30), (0, 0));
    }
}
