//! Calibration guides (enabled with DEBUG=1).
//! Outlines every column span (green, full height), every row band (red) and the
//! text strip inside each band (yellow), so layout constants can be tuned against
//! the template by eye. Drawn before any text.

use crate::config::BoardConfig;
use crate::geometry::{column_box, pct_to_px, to_px, Span};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as GuideRect;

const COLUMN_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BAND_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const STRIP_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);

/// Outline of `w` x `h` at (`x`, `y`); nothing for empty sizes.
fn outline(canvas: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, color: Rgba<u8>) {
    if w <= 0 || h <= 0 {
        return;
    }
    draw_hollow_rect_mut(canvas, GuideRect::at(x, y).of_size(w as u32, h as u32), color);
}

/// Draws the guides for `rows` bands of `board`.
pub fn draw_guides(canvas: &mut RgbaImage, board: &BoardConfig, rows: usize) {
    let (width, height) = (canvas.width(), canvas.height());

    for column in &board.columns {
        let x0 = pct_to_px(column.span.left, width);
        let x1 = pct_to_px(column.span.right, width);
        // 2 px wide
        outline(canvas, x0, 0, x1 - x0, height as i32, COLUMN_COLOR);
        outline(canvas, x0 + 1, 1, x1 - x0 - 2, height as i32 - 2, COLUMN_COLOR);
    }

    for index in 0..rows {
        let top = board.band.band_top(index);
        let band_y = to_px(top);
        let band_h = to_px(top + board.band.band_height) - band_y;
        outline(canvas, 0, band_y, width as i32, band_h, BAND_COLOR);

        let strip = column_box(Span::new(0.0, 1.0), top, &board.band, width);
        outline(canvas, strip.left, strip.top, strip.width(), strip.height(), STRIP_COLOR);
    }
    log::debug!("Drew calibration guides for {} row(s)", rows);
}
