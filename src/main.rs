mod avatar;
mod calibrate;
mod canvas;
mod config;
mod error;
mod fonts;
mod geometry;
mod render;
mod rows;
mod sheet;
mod source;
mod text;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use crate::avatar::AvatarTable;
use crate::config::{BoardConfig, BoardKind, BoardOverrides, RunSettings};
use crate::error::LeaderboardError;
use crate::fonts::FontFile;
use crate::source::RowSource;

fn cli() -> Command {
    Command::new("leaderboard-rs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Renders ranked sheet rows onto leaderboard template images")
        .arg(
            Arg::new("board")
                .long("board")
                .env("BOARD")
                .help("Board layout to render")
                .default_value("solo")
                .value_parser(BoardKind::NAMES),
        )
        .arg(
            Arg::new("board-config")
                .long("board-config")
                .env("BOARD_CONFIG")
                .value_name("JSON")
                .help("Full board description replacing the preset")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("sheet-url")
                .long("sheet-url")
                .env("SHEET_URL")
                .help("Google Sheets URL (https://docs.google.com/spreadsheets/d/<id>)"),
        )
        .arg(
            Arg::new("worksheet")
                .long("worksheet")
                .env("WORKSHEET_NAME")
                .default_value("Classement"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .env("GOOGLE_API_KEY")
                .hide_env_values(true)
                .help("Sheets API key"),
        )
        .arg(
            Arg::new("rows-file")
                .long("rows-file")
                .env("ROWS_FILE")
                .value_name("JSON")
                .help("Read rows from a saved Sheets `values` response instead of the network")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .env("BASE_IMAGE_PATH")
                .help("Base template image (defaults per board)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .env("OUTPUT_PATH")
                .help("Where to write the board (defaults per board)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("font")
                .long("font")
                .env("FONT_PATH")
                .default_value("Oswald-Medium.ttf")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(Arg::new("color").long("color").env("TEXT_COLOR").help("Text color, e.g. #ffffff"))
        .arg(Arg::new("shadow").long("shadow").env("SHADOW").help("1 to draw a text shadow, 0 to disable"))
        .arg(
            Arg::new("rows")
                .long("rows")
                .env("ROW_COUNT")
                .help("Number of rows to render")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("font-size-max")
                .long("font-size-max")
                .env("FONT_SIZE_MAX")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("font-size-min")
                .long("font-size-min")
                .env("FONT_SIZE_MIN")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("left-padding")
                .long("left-padding")
                .env("TEAM_LEFT_PADDING_PX")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(nudge_arg("games-nudge", "GAMES_NUDGE_PX"))
        .arg(nudge_arg("win-nudge", "WIN_NUDGE_PX"))
        .arg(nudge_arg("loose-nudge", "LOOSE_NUDGE_PX"))
        .arg(
            Arg::new("avatars")
                .long("avatars")
                .env("AVATARS_FILE")
                .value_name("JSON")
                .help("Identity -> avatar image mapping")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .env("DEBUG")
                .help("Draw calibration guides under the text")
                .action(ArgAction::SetTrue)
                .value_parser(clap::builder::BoolishValueParser::new()),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbosity level (-v, -vv)")
                .action(ArgAction::Count),
        )
}

fn nudge_arg(name: &'static str, env: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .env(env)
        .allow_negative_numbers(true)
        .value_parser(clap::value_parser!(i32))
}

fn board_overrides(matches: &ArgMatches) -> BoardOverrides {
    let nudges = [("games-nudge", "Games"), ("win-nudge", "Win"), ("loose-nudge", "Loose")]
        .into_iter()
        .filter_map(|(arg, column)| {
            matches
                .get_one::<i32>(arg)
                .map(|px| (column.to_string(), *px))
        })
        .collect();

    BoardOverrides {
        row_count: matches.get_one::<usize>("rows").copied(),
        font_size_max: matches.get_one::<u32>("font-size-max").copied(),
        font_size_min: matches.get_one::<u32>("font-size-min").copied(),
        text_color: matches.get_one::<String>("color").cloned(),
        shadow: matches
            .get_one::<String>("shadow")
            .map(|v| v.trim() == "1" || v.trim().eq_ignore_ascii_case("true")),
        left_padding: matches.get_one::<i32>("left-padding").copied(),
        nudges,
    }
}

fn row_source(matches: &ArgMatches) -> Result<RowSource> {
    if let Some(path) = matches.get_one::<PathBuf>("rows-file") {
        return Ok(RowSource::File(path.clone()));
    }
    let url = matches
        .get_one::<String>("sheet-url")
        .cloned()
        .ok_or_else(|| LeaderboardError::InvalidSheetUrl(String::new()))?;
    sheet::spreadsheet_id(&url)?;
    let api_key = matches
        .get_one::<String>("api-key")
        .cloned()
        .context("GOOGLE_API_KEY (or --api-key) is required to read from a sheet")?;

    Ok(RowSource::Sheet {
        url,
        worksheet: matches
            .get_one::<String>("worksheet")
            .cloned()
            .unwrap_or_default(),
        api_key,
    })
}

fn resolve(matches: &ArgMatches) -> Result<(BoardConfig, RunSettings)> {
    let kind: BoardKind = matches
        .get_one::<String>("board")
        .map(String::as_str)
        .unwrap_or("solo")
        .parse()?;

    let mut board = match matches.get_one::<PathBuf>("board-config") {
        Some(path) => BoardConfig::load(path)?,
        None => kind.preset(),
    };
    board.apply(&board_overrides(matches))?;

    let settings = RunSettings {
        source: row_source(matches)?,
        template: matches
            .get_one::<PathBuf>("template")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(kind.default_template())),
        output: matches
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(kind.default_output())),
        font_path: matches.get_one::<PathBuf>("font").cloned(),
        avatars: matches.get_one::<PathBuf>("avatars").cloned(),
        debug_guides: matches.get_flag("debug"),
    };
    Ok((board, settings))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    env_logger::Builder::from_default_env()
        .filter_level(match matches.get_count("verbose") {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let (board, settings) = resolve(&matches)?;
    log::info!("Rendering '{}' board from {}", board.name, settings.source);

    let mut canvas = canvas::load_template(&settings.template)?;

    // Step 1: fetch and rank rows
    let raw = source::load_rows(&settings.source)
        .await
        .context("Failed to load leaderboard rows")?;
    let ranked = rows::normalize(raw, &board.rank_field, board.row_count);

    if ranked.is_empty() {
        log::warn!("No ranked rows, saving the template unchanged");
        canvas::save_output(canvas, &settings.output)?;
        return Ok(());
    }

    // Step 2: resources
    let fonts = FontFile::resolve(settings.font_path.as_deref())?;
    log::debug!("Font file: {}", fonts.path().display());
    let avatars = match &settings.avatars {
        Some(path) => AvatarTable::load(path)?,
        None => AvatarTable::new(),
    };
    if avatars.is_empty() && board.columns.iter().any(|c| c.avatar.is_some()) {
        log::info!("No avatar table given, identity columns render text only");
    }

    // Step 3: draw
    if settings.debug_guides {
        calibrate::draw_guides(&mut canvas, &board, board.row_count);
    }
    let stats = render::render_board(&mut canvas, &ranked, &board, &fonts, &avatars)
        .context("Failed to render board")?;

    // Step 4: persist
    canvas::save_output(canvas, &settings.output)?;
    log::info!(
        "Rendered {} row(s), {} cell(s), {} avatar(s) into {}",
        stats.rows,
        stats.cells,
        stats.avatars,
        settings.output.display()
    );
    println!("Board '{}' written to {}", board.name, settings.output.display());
    Ok(())
}
