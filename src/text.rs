//! Text fitter.
//! Picks the largest font size whose measured box fits a rectangle, then positions
//! and draws the text (centered or left aligned, optional drop shadow).
//!
//! The search walks down one size at a time instead of bisecting: hinted glyph metrics
//! are not monotonic in size, and a smaller size can fit after a larger one failed.

use crate::config::Align;
use crate::fonts::FontProvider;
use crate::geometry::{to_px, Rect};
use image::{Rgba, RgbaImage};

/// Total padding (px) subtracted from each axis of the target rectangle.
pub const FIT_PADDING: i64 = 4;

pub const SHADOW_COLOR: Rgba<u8> = Rgba([0, 0, 0, 180]);
const SHADOW_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Chosen size and the measured box at that size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fitted {
    pub size: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    pub color: Rgba<u8>,
    pub shadow: bool,
}

/// Horizontal placement rules for one column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placement {
    pub align: Align,
    pub nudge_x: i32,
    pub left_padding: i32,
}

/// Largest size in `min_size..=max_size` that fits `rect`, or `min_size` when nothing fits.
pub fn fit<F: FontProvider + ?Sized>(
    text: &str,
    rect: Rect,
    fonts: &F,
    max_size: u32,
    min_size: u32,
) -> Fitted {
    let max_w = i64::from(rect.width()) - FIT_PADDING;
    let max_h = i64::from(rect.height()) - FIT_PADDING;

    for size in (min_size..=max_size).rev() {
        let (width, height) = fonts.measure(text, size);
        if i64::from(width) <= max_w && i64::from(height) <= max_h {
            return Fitted { size, width, height };
        }
    }

    let (width, height) = fonts.measure(text, min_size);
    Fitted {
        size: min_size,
        width,
        height,
    }
}

/// Draw origin for fitted text inside `rect`.
///
/// Centered text is centered on both axes, then nudged. Left-aligned text starts at
/// the rectangle's left edge (after padding) and is centered vertically.
pub fn place(rect: Rect, fitted: Fitted, placement: Placement) -> (i32, i32) {
    let (cx, cy) = rect.center();
    let w = f64::from(fitted.width);
    let h = f64::from(fitted.height);
    let y = to_px(cy - h / 2.0);

    match placement.align {
        Align::Center => (to_px(cx - w / 2.0) + placement.nudge_x, y),
        Align::Left => (rect.left + placement.left_padding + placement.nudge_x, y),
    }
}

/// Fits, places and draws `text`; returns the fit that was used.
pub fn draw_fitted<F: FontProvider + ?Sized>(
    canvas: &mut RgbaImage,
    text: &str,
    rect: Rect,
    placement: Placement,
    fonts: &F,
    (max_size, min_size): (u32, u32),
    style: TextStyle,
) -> Fitted {
    let fit_rect = match placement.align {
        Align::Left => rect.with_left(rect.left + placement.left_padding),
        Align::Center => rect,
    };
    let fitted = fit(text, fit_rect, fonts, max_size, min_size);
    let (x, y) = place(rect, fitted, placement);

    if style.shadow {
        for (dx, dy) in SHADOW_OFFSETS {
            fonts.draw(canvas, text, fitted.size, x + dx, y + dy, SHADOW_COLOR);
        }
    }
    fonts.draw(canvas, text, fitted.size, x, y, style.color);
    fitted
}
