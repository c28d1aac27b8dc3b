// src/services/sheet.rs

//! Brand and editorial sheets.
//!
//! Sheets are CSV, either a local file or a published http(s) export.
//! Header names are trimmed and lower-cased before rows are decoded.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{BrandConfig, BrandRow, CrawlerConfig};

/// Parse brand rows. Rows without any brand name are dropped; disabled
/// rows are kept so the caller can count them.
pub fn parse_brands(content: &str, default_region: &str) -> Result<Vec<BrandConfig>> {
    let mut reader = reader(content);
    let headers = normalized_headers(&mut reader)?;

    let mut brands = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let row: BrandRow = record.deserialize(Some(&headers))?;
        match row.into_config(default_region) {
            Some(brand) => brands.push(brand),
            None => log::debug!("Skipping sheet row {} without brand name", line + 2),
        }
    }
    Ok(brands)
}

/// Parse editorial rows as column/value maps, blank cells dropped.
pub fn parse_editorials(content: &str) -> Result<Vec<BTreeMap<String, String>>> {
    let mut reader = reader(content);
    let headers = normalized_headers(&mut reader)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .filter(|(name, value)| !name.is_empty() && !value.trim().is_empty())
            .map(|(name, value)| (name.to_string(), value.trim().to_string()))
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Read a sheet from `source`: an http(s) URL is downloaded with retries,
/// anything else is a path relative to `base_dir`.
pub async fn load_source(
    source: &str,
    base_dir: &Path,
    client: &Client,
    crawler: &CrawlerConfig,
) -> Result<String> {
    let source = source.trim();
    if source.starts_with("http://") || source.starts_with("https://") {
        return download(source, client, crawler).await;
    }
    let path = base_dir.join(source);
    tokio::fs::read_to_string(&path).await.map_err(|e| {
        AppError::config(format!("Cannot read sheet {}: {}", path.display(), e))
    })
}

async fn download(url: &str, client: &Client, crawler: &CrawlerConfig) -> Result<String> {
    let attempts = crawler.sheet_retries.max(1);
    let delay = Duration::from_secs(crawler.sheet_retry_delay_secs);

    let mut last_error = None;
    for attempt in 1..=attempts {
        match download_once(url, client).await {
            Ok(content) => return Ok(content),
            Err(e) => {
                log::warn!("Sheet download attempt {attempt}/{attempts} failed: {e}");
                last_error = Some(e);
            }
        }
        if attempt < attempts && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Err(last_error.unwrap_or_else(|| AppError::fetch(url, "no attempt made")))
}

async fn download_once(url: &str, client: &Client) -> Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    let content = response.text().await?;
    check_content(url, &content)?;
    Ok(content)
}

/// A sheet export that returns an HTML page (login wall, error page) or
/// nothing at all is not CSV.
fn check_content(url: &str, content: &str) -> Result<()> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(AppError::fetch(url, "empty sheet"));
    }
    if trimmed.starts_with('<') {
        return Err(AppError::fetch(url, "received HTML instead of CSV"));
    }
    Ok(())
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes())
}

fn normalized_headers(reader: &mut csv::Reader<&[u8]>) -> Result<csv::StringRecord> {
    let headers: csv::StringRecord = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    reader.set_headers(headers.clone());
    Ok(headers)
}
