//! Board renderer.
//! Walks the normalized rows in order and, for every configured column, resolves its
//! rectangle, draws an avatar when the column has one, then fits and draws the text.
//! Rows never influence each other; the canvas is the only thing mutated.

use crate::avatar::{self, AvatarTable};
use crate::config::{BoardConfig, ColumnContent, ColumnSpec};
use crate::fonts::FontProvider;
use crate::geometry::{column_box, Rect};
use crate::rows::{self, RowRecord};
use crate::text::{self, Placement, TextStyle};
use anyhow::Result;
use image::RgbaImage;

/// What a render pass did, for logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub rows: usize,
    pub cells: usize,
    pub avatars: usize,
}

/// Text shown in `column` for `row`.
pub fn column_value(row: &RowRecord, content: &ColumnContent) -> String {
    match content {
        ColumnContent::Field(key) => rows::field(row, key).trim().to_string(),
        ColumnContent::Kda {
            kills,
            deaths,
            assists,
        } => rows::kda_ratio(
            rows::field(row, kills),
            rows::field(row, deaths),
            rows::field(row, assists),
        )
        .to_string(),
    }
}

/// Renders every row of an already-normalized board onto `canvas`.
pub fn render_board<F: FontProvider + ?Sized>(
    canvas: &mut RgbaImage,
    rows: &[RowRecord],
    board: &BoardConfig,
    fonts: &F,
    avatars: &AvatarTable,
) -> Result<RenderStats> {
    let style = TextStyle {
        color: board.text_rgba(),
        shadow: board.shadow,
    };
    let mut stats = RenderStats::default();

    for (index, row) in rows.iter().enumerate() {
        let band_top = board.band.band_top(index);
        log::debug!("Row {} band top {:.1}", index, band_top);

        for column in &board.columns {
            let value = column_value(row, &column.content);
            let (rect, drew_avatar) = resolve_cell(canvas, column, &value, band_top, board, avatars)?;
            let placement = Placement {
                align: column.align,
                nudge_x: column.nudge_x,
                left_padding: column.left_padding,
            };
            let fitted = text::draw_fitted(
                canvas,
                &value,
                rect,
                placement,
                fonts,
                (board.font_size_max, board.font_size_min),
                style,
            );
            log::debug!(
                "  {} {:?} '{}' at size {}",
                column.name, rect, value, fitted.size
            );

            stats.cells += 1;
            stats.avatars += usize::from(drew_avatar);
        }
        stats.rows += 1;
    }
    Ok(stats)
}

/// Text rectangle for one cell. Identity columns first paste their avatar and give the
/// text whatever is left to the right of the circle.
fn resolve_cell(
    canvas: &mut RgbaImage,
    column: &ColumnSpec,
    value: &str,
    band_top: f64,
    board: &BoardConfig,
    avatars: &AvatarTable,
) -> Result<(Rect, bool)> {
    let width = canvas.width();
    let rect = column_box(column.span, band_top, &board.band, width);
    let Some(spec) = &column.avatar else {
        return Ok((rect, false));
    };

    let anchor = column_box(spec.anchor, band_top, &board.band, width);
    let diameter = (anchor.height() + spec.diameter_adjust).max(0);
    // Vertical origin truncates the fractional band edge rather than rounding it
    let circle_top = (band_top + board.band.margin_top).trunc() as i32;
    let origin = (anchor.left + spec.offset_x, circle_top + spec.offset_y);
    let drew = avatar::composite(value, diameter as u32, origin, canvas, avatars)?;

    let text_rect = Rect {
        left: origin.0 + diameter + spec.text_gap,
        top: anchor.top,
        right: rect.right,
        bottom: rect.bottom,
    };
    Ok((text_rect, drew))
}
