//! Google Sheets fetcher.
//! Reads one worksheet through the Sheets v4 `values` endpoint with an API key.
//! Falls back to the first sheet when the named worksheet does not exist.
//! Latency: network bound; transient failures are retried a few times.

use crate::error::LeaderboardError;
use crate::source::ValueRange;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const FIRST_SHEET_RANGE: &str = "A:ZZ";
const MAX_API_RETRIES: u32 = 2;
const TIMEOUT_SECS: u64 = 30;

// *************** Public API ***************

/// Extracts the spreadsheet id from a `https://docs.google.com/spreadsheets/d/<id>/...` URL.
pub fn spreadsheet_id(sheet_url: &str) -> Result<String, LeaderboardError> {
    let invalid = || LeaderboardError::InvalidSheetUrl(sheet_url.to_string());
    let url = Url::parse(sheet_url.trim()).map_err(|_| invalid())?;
    if url.host_str() != Some("docs.google.com") {
        return Err(invalid());
    }
    let mut segments = url.path_segments().ok_or_else(invalid)?;
    match (segments.next(), segments.next(), segments.next()) {
        (Some("spreadsheets"), Some("d"), Some(id)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(invalid()),
    }
}

/// Fetches the raw cell grid of `worksheet`.
pub async fn fetch_values(sheet_url: &str, worksheet: &str, api_key: &str) -> Result<Vec<Vec<Value>>> {
    let id = spreadsheet_id(sheet_url)?;
    let client = Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .build()
        .context("Failed to create HTTP client")?;

    match call_api_with_retry(&client, &values_url(&id, worksheet)?, api_key).await {
        Ok(values) => Ok(values),
        Err(e) if is_bad_range(&e) => {
            log::warn!("Worksheet '{}' not found, using the first sheet", worksheet);
            call_api_with_retry(&client, &values_url(&id, FIRST_SHEET_RANGE)?, api_key).await
        }
        Err(e) => Err(e),
    }
}

// *************** Internal Functions ***************

fn values_url(id: &str, range: &str) -> Result<Url> {
    let mut url = Url::parse(API_BASE).context("Invalid Sheets API base URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Sheets API base URL cannot have a path"))?
        .extend([id, "values", range]);
    Ok(url)
}

fn is_bad_range(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<LeaderboardError>(),
        Some(LeaderboardError::SheetApi { status: 400, .. })
    )
}

async fn call_api_with_retry(client: &Client, url: &Url, api_key: &str) -> Result<Vec<Vec<Value>>> {
    let mut last_error = None;

    for attempt in 1..=MAX_API_RETRIES + 1 {
        match call_api(client, url, api_key).await {
            Ok(values) => return Ok(values),
            // Client errors will not change on retry
            Err(e) if is_client_error(&e) => return Err(e),
            Err(e) => {
                log::warn!(
                    "Sheets API attempt {}/{} failed: {:#}",
                    attempt,
                    MAX_API_RETRIES + 1,
                    e
                );
                last_error = Some(e);
                if attempt <= MAX_API_RETRIES {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Sheets API was never called")))
}

/// 4xx responses except 429, which is retried like a server error.
fn is_client_error(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<LeaderboardError>(),
        Some(LeaderboardError::SheetApi { status, .. })
            if (400..500).contains(status) && *status != StatusCode::TOO_MANY_REQUESTS.as_u16()
    )
}

async fn call_api(client: &Client, url: &Url, api_key: &str) -> Result<Vec<Vec<Value>>> {
    let response = client
        .get(url.clone())
        .query(&[("key", api_key), ("valueRenderOption", "FORMATTED_VALUE")])
        .send()
        .await
        .context("Failed to send request to the Sheets API")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LeaderboardError::SheetApi {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(Vec::new());
    }

    let range: ValueRange = response
        .json()
        .await
        .context("Failed to parse Sheets API response")?;
    Ok(range.values)
}

// *************** Tests ***************

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "https://docs.google.com/spreadsheets/d/1yp8fKsWip750zB2DWw0af0MfLSTEOYa_uQPZfsqyWEY";

    #[test]
    fn test_spreadsheet_id_from_url() {
        assert_eq!(
            spreadsheet_id(SHEET).unwrap(),
            "1yp8fKsWip750zB2DWw0af0MfLSTEOYa_uQPZfsqyWEY"
        );
        let with_suffix = format!("{}/edit#gid=0", SHEET);
        assert_eq!(
            spreadsheet_id(&with_suffix).unwrap(),
            "1yp8fKsWip750zB2DWw0af0MfLSTEOYa_uQPZfsqyWEY"
        );
    }

    #[test]
    fn test_spreadsheet_id_rejects_other_hosts() {
        assert!(spreadsheet_id("https://example.com/spreadsheets/d/abc").is_err());
        assert!(spreadsheet_id("not a url").is_err());
        assert!(spreadsheet_id("https://docs.google.com/document/d/abc").is_err());
    }

    #[test]
    fn test_values_url_encodes_worksheet() {
        let url = values_url("abc", "Classement Solo").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Classement%20Solo"
        );
    }

    #[test]
    fn test_bad_range_detection() {
        let bad_range: anyhow::Error = LeaderboardError::SheetApi {
            status: 400,
            body: "Unable to parse range".to_string(),
        }
        .into();
        let server: anyhow::Error = LeaderboardError::SheetApi {
            status: 503,
            body: String::new(),
        }
        .into();
        assert!(is_bad_range(&bad_range));
        assert!(is_client_error(&bad_range));
        assert!(!is_bad_range(&server));
        assert!(!is_client_error(&server));
    }

    #[test]
    fn test_rate_limit_is_retried() {
        let rate_limited: anyhow::Error = LeaderboardError::SheetApi {
            status: 429,
            body: "RESOURCE_EXHAUSTED".to_string(),
        }
        .into();
        let forbidden: anyhow::Error = LeaderboardError::SheetApi {
            status: 403,
            body: String::new(),
        }
        .into();
        assert!(!is_client_error(&rate_limited));
        assert!(!is_bad_range(&rate_limited));
        assert!(is_client_error(&forbidden));
    }

    #[tokio::test]
    #[ignore = "requires GOOGLE_API_KEY and network access"]
    async fn test_real_sheet_fetch() {
        // Run with: GOOGLE_API_KEY=... cargo test test_real_sheet_fetch -- --ignored
        let key = std::env::var("GOOGLE_API_KEY").unwrap();
        let result = fetch_values(SHEET, "Classement", &key).await;
        println!("Result: {:?}", result.as_ref().map(Vec::len));
        assert!(result.is_ok());
    }
}
