//! Geometry resolver.
//! Maps fractional column spans and pixel band parameters onto concrete canvas rectangles.
//! Every float-to-pixel conversion rounds half-to-even. Band tops are accumulated in f64
//! and rounded once per row, so long boards do not drift.

use serde::{Deserialize, Serialize};

/// Pixel rectangle in canvas space. Coordinates may be negative or exceed the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.left + self.right) / 2.0,
            f64::from(self.top + self.bottom) / 2.0,
        )
    }

    /// Same rectangle with a new left edge (right edge is kept, even if crossed).
    pub fn with_left(self, left: i32) -> Self {
        Self { left, ..self }
    }
}

/// Horizontal bounds of a column as fractions of the canvas width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub left: f64,
    pub right: f64,
}

impl Span {
    pub const fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn is_valid(&self) -> bool {
        0.0 <= self.left && self.left < self.right && self.right <= 1.0
    }
}

/// Vertical layout of the repeated row bands, all in pixels.
///
/// `spacing` is added to `band_height` to get the per-row increment. It may be
/// negative to pack rows tighter than their nominal height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandGeometry {
    pub pre_margin_top: f64,
    pub line_thickness: f64,
    pub band_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    #[serde(default)]
    pub spacing: f64,
}

impl BandGeometry {
    pub fn start_y(&self) -> f64 {
        self.pre_margin_top + self.line_thickness
    }

    /// Unrounded top of the band for row `index`.
    pub fn band_top(&self, index: usize) -> f64 {
        self.start_y() + index as f64 * (self.band_height + self.spacing)
    }
}

pub fn to_px(v: f64) -> i32 {
    v.round_ties_even() as i32
}

pub fn pct_to_px(fraction: f64, total: u32) -> i32 {
    to_px(fraction * f64::from(total))
}

/// Text strip of one column inside one band.
///
/// Margins larger than the band collapse the rectangle to zero height rather than inverting it.
pub fn column_box(span: Span, band_top: f64, band: &BandGeometry, canvas_width: u32) -> Rect {
    let top = to_px(band_top + band.margin_top);
    let bottom = to_px(band_top + band.band_height - band.margin_bottom).max(top);
    Rect {
        left: pct_to_px(span.left, canvas_width),
        top,
        right: pct_to_px(span.right, canvas_width),
        bottom,
    }
}
