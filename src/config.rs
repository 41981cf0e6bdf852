//! Config module.
//! Board presets (solo, team, assist, dead), JSON board overrides and the resolved run settings.
//! A `BoardConfig` is built once per run and only read afterwards.
//! Colors fall back to white instead of failing.

use crate::error::LeaderboardError;
use crate::geometry::{BandGeometry, Span};
use crate::source::RowSource;
use anyhow::{Context, Result};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

// *************** Board description ***************

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Center,
    Left,
}

/// Where a column's text comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnContent {
    /// Raw cell of the named sheet column.
    Field(String),
    /// Kill/death/assist ratio computed from three sheet columns.
    Kda {
        kills: String,
        deaths: String,
        assists: String,
    },
}

/// Circular avatar drawn in front of an identity column.
///
/// The circle is anchored on its own span; `diameter_adjust`, `offset_x` and `offset_y`
/// are per-board visual tuning, in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvatarSpec {
    pub anchor: Span,
    #[serde(default)]
    pub diameter_adjust: i32,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    /// Gap between the circle's right edge and the identity text.
    #[serde(default)]
    pub text_gap: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Short label, used for logging and `*_NUDGE_PX` overrides.
    pub name: String,
    pub span: Span,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub nudge_x: i32,
    #[serde(default)]
    pub left_padding: i32,
    pub content: ColumnContent,
    #[serde(default)]
    pub avatar: Option<AvatarSpec>,
}

impl ColumnSpec {
    fn field(name: &str, left: f64, right: f64, key: &str) -> Self {
        Self {
            name: name.to_string(),
            span: Span::new(left, right),
            align: Align::Center,
            nudge_x: 0,
            left_padding: 0,
            content: ColumnContent::Field(key.to_string()),
            avatar: None,
        }
    }

    fn left(mut self) -> Self {
        self.align = Align::Left;
        self
    }

    fn nudge(mut self, px: i32) -> Self {
        self.nudge_x = px;
        self
    }

    fn padded(mut self, px: i32) -> Self {
        self.left_padding = px;
        self
    }

    fn with_avatar(mut self, avatar: AvatarSpec) -> Self {
        self.avatar = Some(avatar);
        self
    }
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    pub rank_field: String,
    pub row_count: usize,
    pub band: BandGeometry,
    pub font_size_max: u32,
    pub font_size_min: u32,
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default)]
    pub shadow: bool,
    pub columns: Vec<ColumnSpec>,
}

impl BoardConfig {
    /// Reads a full board description from JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read board config: {}", path.display()))?;
        let board: BoardConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse board config: {}", path.display()))?;
        board.validate()?;
        Ok(board)
    }

    pub fn validate(&self) -> Result<(), LeaderboardError> {
        if self.font_size_min == 0 || self.font_size_min > self.font_size_max {
            return Err(LeaderboardError::InvalidBoardConfig(format!(
                "font size range {}..{} is empty",
                self.font_size_min, self.font_size_max
            )));
        }
        for col in &self.columns {
            let anchor = col.avatar.as_ref().map(|a| a.anchor);
            for span in std::iter::once(col.span).chain(anchor) {
                if !span.is_valid() {
                    return Err(LeaderboardError::InvalidBoardConfig(format!(
                        "column '{}' has bounds {:.3}..{:.3} outside 0 <= left < right <= 1",
                        col.name, span.left, span.right
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn text_rgba(&self) -> Rgba<u8> {
        parse_color_or_default(&self.text_color)
    }

    /// Layers CLI/env overrides on top of the preset or JSON board.
    pub fn apply(&mut self, overrides: &BoardOverrides) -> Result<(), LeaderboardError> {
        if let Some(rows) = overrides.row_count {
            self.row_count = rows;
        }
        if let Some(max) = overrides.font_size_max {
            self.font_size_max = max;
        }
        if let Some(min) = overrides.font_size_min {
            self.font_size_min = min;
        }
        if let Some(color) = &overrides.text_color {
            self.text_color = color.clone();
        }
        if let Some(shadow) = overrides.shadow {
            self.shadow = shadow;
        }
        if let Some(padding) = overrides.left_padding {
            if let Some(col) = self.columns.iter_mut().find(|c| c.align == Align::Left) {
                col.left_padding = padding;
            }
        }
        for (name, px) in &overrides.nudges {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case(name)) {
                col.nudge_x = *px;
            }
        }
        self.validate()
    }
}

/// Optional per-run tweaks; `None` keeps the board's value.
#[derive(Clone, Debug, Default)]
pub struct BoardOverrides {
    pub row_count: Option<usize>,
    pub font_size_max: Option<u32>,
    pub font_size_min: Option<u32>,
    pub text_color: Option<String>,
    pub shadow: Option<bool>,
    pub left_padding: Option<i32>,
    /// (column name, horizontal nudge in px)
    pub nudges: Vec<(String, i32)>,
}

// *************** Presets ***************

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoardKind {
    #[default]
    Solo,
    Team,
    Assist,
    Dead,
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardKind::Solo => write!(f, "solo"),
            BoardKind::Team => write!(f, "team"),
            BoardKind::Assist => write!(f, "assist"),
            BoardKind::Dead => write!(f, "dead"),
        }
    }
}

impl FromStr for BoardKind {
    type Err = LeaderboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(BoardKind::Solo),
            "team" => Ok(BoardKind::Team),
            "assist" => Ok(BoardKind::Assist),
            "dead" => Ok(BoardKind::Dead),
            other => Err(LeaderboardError::UnknownBoard(other.to_string())),
        }
    }
}

impl BoardKind {
    pub const NAMES: [&'static str; 4] = ["solo", "team", "assist", "dead"];

    pub fn preset(self) -> BoardConfig {
        match self {
            BoardKind::Solo => solo_board(),
            BoardKind::Team => team_board(),
            BoardKind::Assist => top_five_board("assist", "Assist Classement", "Pseudo Assist", "Nb Assist"),
            BoardKind::Dead => top_five_board("dead", "Dead Classement", "Pseudo Dead", "Nb Dead"),
        }
    }

    pub fn default_template(self) -> &'static str {
        match self {
            BoardKind::Solo => "bloc-solo.png",
            BoardKind::Team => "bloc-team.png",
            BoardKind::Assist => "top-assist.png",
            BoardKind::Dead => "top-dead.png",
        }
    }

    pub fn default_output(self) -> String {
        format!("../{}", self.default_template())
    }
}

fn solo_board() -> BoardConfig {
    BoardConfig {
        name: "solo".to_string(),
        rank_field: "Classement Solo".to_string(),
        row_count: 30,
        band: BandGeometry {
            pre_margin_top: 118.0,
            line_thickness: 3.0,
            band_height: 85.2,
            margin_top: 26.0,
            margin_bottom: 26.0,
            spacing: 3.0,
        },
        font_size_max: 42,
        font_size_min: 30,
        text_color: default_text_color(),
        shadow: false,
        columns: vec![
            ColumnSpec::field("Pseudo", 0.07, 0.35, "Pseudo").left(),
            ColumnSpec::field("Games", 0.30, 0.53, "Nombre Games"),
            ColumnSpec::field("Win", 0.365, 0.58, "Nombre Win"),
            ColumnSpec::field("Loose", 0.43, 0.63, "Nombre Loose"),
            ColumnSpec::field("Kill", 0.625, 0.72, "Nombre Kill"),
            ColumnSpec::field("Dead", 0.705, 0.80, "Nombre Mort"),
            ColumnSpec::field("Assist", 0.805, 0.88, "Nombre Assist"),
            ColumnSpec {
                content: ColumnContent::Kda {
                    kills: "Nombre Kill".to_string(),
                    deaths: "Nombre Mort".to_string(),
                    assists: "Nombre Assist".to_string(),
                },
                ..ColumnSpec::field("KDA", 0.905, 0.97, "")
            },
        ],
    }
}

// Column edges were measured on the 547 px wide team template.
fn team_board() -> BoardConfig {
    let px = |v: f64| v / 547.0;
    BoardConfig {
        name: "team".to_string(),
        rank_field: "Team Classement".to_string(),
        row_count: 6,
        band: BandGeometry {
            pre_margin_top: 122.0,
            line_thickness: 3.0,
            band_height: 95.0,
            margin_top: 26.0,
            margin_bottom: 30.0,
            spacing: 6.0,
        },
        font_size_max: 62,
        font_size_min: 52,
        text_color: default_text_color(),
        shadow: true,
        columns: vec![
            ColumnSpec::field("Team", px(10.0), px(280.0), "Team").left().padded(111),
            ColumnSpec::field("Games", px(280.0), px(352.0), "Team Games").nudge(-8),
            ColumnSpec::field("Win", px(352.0), px(424.0), "Team Win").nudge(2),
            ColumnSpec::field("Loose", px(424.0), px(496.0), "Team Loose").nudge(6),
        ],
    }
}

fn top_five_board(name: &str, rank_field: &str, identity: &str, value: &str) -> BoardConfig {
    let line_thickness = 1.0;
    BoardConfig {
        name: name.to_string(),
        rank_field: rank_field.to_string(),
        row_count: 5,
        band: BandGeometry {
            pre_margin_top: 135.0,
            line_thickness,
            band_height: 80.0,
            margin_top: 12.0,
            margin_bottom: 12.0,
            // Observed row pitch of the top-five templates; -2.8 px per row
            spacing: line_thickness * -2.8,
        },
        font_size_max: 20,
        font_size_min: 20,
        text_color: default_text_color(),
        shadow: false,
        columns: vec![
            ColumnSpec::field("Pseudo", 0.47, 0.85, identity)
                .left()
                .with_avatar(AvatarSpec {
                    anchor: Span::new(0.35, 0.45),
                    diameter_adjust: 3,
                    offset_x: -13,
                    offset_y: 2,
                    text_gap: 10,
                }),
            ColumnSpec::field("Value", 0.82, 0.95, value),
        ],
    }
}

// *************** Colors ***************

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic color name; anything else is white.
pub fn parse_color_or_default(raw: &str) -> Rgba<u8> {
    match parse_color(raw) {
        Some(color) => color,
        None => {
            log::warn!("Unrecognized text color '{}', using white", raw);
            DEFAULT_TEXT_COLOR
        }
    }
}

fn parse_color(raw: &str) -> Option<Rgba<u8>> {
    let raw = raw.trim();
    match raw.to_ascii_lowercase().as_str() {
        "white" => return Some(Rgba([255, 255, 255, 255])),
        "black" => return Some(Rgba([0, 0, 0, 255])),
        "red" => return Some(Rgba([255, 0, 0, 255])),
        "gold" => return Some(Rgba([255, 215, 0, 255])),
        _ => {}
    }

    let hex = raw.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 => Some(Rgba([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?, 255])),
        8 => Some(Rgba([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        ])),
        _ => None,
    }
}

// *************** Run settings ***************

/// Everything a run needs besides the board itself, resolved once from CLI/env.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub source: RowSource,
    pub template: PathBuf,
    pub output: PathBuf,
    pub font_path: Option<PathBuf>,
    pub avatars: Option<PathBuf>,
    pub debug_guides: bool,
}
