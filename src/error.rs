//! Fatal error taxonomy.
//! Everything here aborts the run; recoverable conditions (missing avatar,
//! bad rank, bad ratio inputs, text overflow) are handled by fallbacks instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("Template image not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("No usable font found (tried {tried})")]
    FontNotFound { tried: String },

    #[error("Invalid font data in {}", .0.display())]
    InvalidFont(PathBuf),

    #[error("SHEET_URL missing or invalid: {0}")]
    InvalidSheetUrl(String),

    #[error("Sheets API error {status}: {body}")]
    SheetApi { status: u16, body: String },

    #[error("Invalid board configuration: {0}")]
    InvalidBoardConfig(String),

    #[error("Unknown board '{0}' (expected solo, team, assist or dead)")]
    UnknownBoard(String),
}
