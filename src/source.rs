//! Row source facade - picks where the raw rows come from.
//! - **Sheet**: Google Sheets v4 `values` endpoint (network, needs an API key)
//! - **File**: the same `ValueRange` JSON saved on disk (offline runs, tests)
//!
//! Both return records keyed by the header row, with every cell as text.

use crate::rows::RowRecord;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowSource {
    Sheet {
        url: String,
        worksheet: String,
        api_key: String,
    },
    File(PathBuf),
}

impl std::fmt::Display for RowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowSource::Sheet { url, worksheet, .. } => write!(f, "sheet '{}' of {}", worksheet, url),
            RowSource::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Response body of `GET .../values/{range}`; only `values` matters here.
#[derive(Debug, Default, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// Main entry point: fetches or reads the raw, un-normalized records.
pub async fn load_rows(source: &RowSource) -> Result<Vec<RowRecord>> {
    let grid = match source {
        RowSource::Sheet {
            url,
            worksheet,
            api_key,
        } => crate::sheet::fetch_values(url, worksheet, api_key).await?,
        RowSource::File(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read rows file: {}", path.display()))?;
            serde_json::from_str::<ValueRange>(&raw)
                .with_context(|| format!("Failed to parse rows file: {}", path.display()))?
                .values
        }
    };
    let records = records_from_grid(grid);
    log::info!("Fetched {} record(s) from {}", records.len(), source);
    Ok(records)
}

pub fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First row is the header; short rows are padded with empty cells, extra cells dropped.
pub fn records_from_grid(grid: Vec<Vec<Value>>) -> Vec<RowRecord> {
    let mut rows = grid.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(cell_to_string).collect();

    rows.map(|cells| {
        header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = cells.get(i).map(cell_to_string).unwrap_or_default();
                (name.clone(), value)
            })
            .collect()
    })
    .collect()
}
