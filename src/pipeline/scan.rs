// src/pipeline/scan.rs

//! Scan pipeline: sheet in, snapshot out.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{BrandConfig, Config, EvaluationResult, SaleStatus, ScanOutcome, ScanReport};
use crate::services::{BrandEvaluator, sheet};
use crate::storage::SnapshotStorage;
use crate::utils::http::{PageFetcher, create_client};
use crate::utils::throttle::HostThrottle;

/// Evaluate every enabled brand. Disabled rows are counted and never
/// reach the fetcher.
///
/// With `max_concurrent == 1` brands run in sheet order with a fixed
/// pause between them. Otherwise a bounded pool runs them with a per-host
/// throttle and the results are sorted by brand identity.
pub async fn scan_brands(
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    brands: &[BrandConfig],
    today: NaiveDate,
) -> Result<(Vec<EvaluationResult>, ScanOutcome)> {
    let mut outcome = ScanOutcome {
        total_rows: brands.len(),
        ..ScanOutcome::default()
    };

    let enabled: Vec<&BrandConfig> = brands
        .iter()
        .filter(|brand| {
            if !brand.enabled {
                log::info!("Skipping disabled brand: {}", brand.display_name());
            }
            brand.enabled
        })
        .collect();
    outcome.skipped_disabled = brands.len() - enabled.len();

    let delay = Duration::from_millis(config.crawler.request_delay_ms);
    let concurrency = config.crawler.max_concurrent.max(1);
    let mut evaluator = BrandEvaluator::new(Arc::clone(&config), fetcher)?;

    let results = if concurrency == 1 {
        let mut results = Vec::with_capacity(enabled.len());
        for (i, brand) in enabled.iter().enumerate() {
            log::debug!("[{}/{}] {}", i + 1, enabled.len(), brand.display_name());
            results.push(evaluator.evaluate(brand, today).await);
            if i + 1 < enabled.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        results
    } else {
        evaluator = evaluator.with_throttle(HostThrottle::new(delay));
        let evaluator = &evaluator;
        let mut results: Vec<EvaluationResult> = stream::iter(enabled)
            .map(|brand| async move { evaluator.evaluate(brand, today).await })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        results.sort_by_key(|r| r.identity_key());
        results
    };

    for result in &results {
        outcome.record(result.status);
    }
    Ok((results, outcome))
}

/// Assemble the feed. With `sales_only` only `sale` records are kept.
pub fn build_report(
    results: Vec<EvaluationResult>,
    editorials: Vec<BTreeMap<String, String>>,
    sales_only: bool,
) -> ScanReport {
    let sales = if sales_only {
        results
            .into_iter()
            .filter(|r| r.status == SaleStatus::Sale)
            .collect()
    } else {
        results
    };
    ScanReport::new(sales, editorials)
}

/// Run a full scan: load the sheets, evaluate, and overwrite the snapshot.
pub async fn run_scan(
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    storage: &dyn SnapshotStorage,
    base_dir: &Path,
    today: NaiveDate,
) -> Result<ScanOutcome> {
    let start_time = Utc::now();
    log::info!("Starting sale scan...");

    let client = create_client(&config.crawler)?;
    let content = sheet::load_source(&config.sources.brands, base_dir, &client, &config.crawler).await?;
    let brands = sheet::parse_brands(&content, &config.output.default_region)?;
    log::info!("Loaded {} brand rows from {}", brands.len(), config.sources.brands);

    let editorials = match &config.sources.editorials {
        Some(source) => load_editorials(source, base_dir, &client, &config).await,
        None => Vec::new(),
    };

    let (results, outcome) = scan_brands(Arc::clone(&config), fetcher, &brands, today).await?;
    let report = build_report(results, editorials, config.output.sales_only);
    storage.write_report(&config.output.path, &report).await?;

    let elapsed = Utc::now() - start_time;
    log::info!(
        "Scan complete in {}s: {} evaluated, {} sale, {} upcoming, {} nosale, {} error, {} invalid URL, {} disabled",
        elapsed.num_seconds(),
        outcome.evaluated,
        outcome.sale,
        outcome.upcoming,
        outcome.nosale,
        outcome.error,
        outcome.invalid_url,
        outcome.skipped_disabled
    );

    Ok(outcome)
}

/// Editorial rows are optional; a broken source only costs the rows.
async fn load_editorials(
    source: &str,
    base_dir: &Path,
    client: &reqwest::Client,
    config: &Config,
) -> Vec<BTreeMap<String, String>> {
    let rows = sheet::load_source(source, base_dir, client, &config.crawler)
        .await
        .and_then(|content| sheet::parse_editorials(&content));
    rows.unwrap_or_else(|e| {
        log::warn!("Editorial sheet unavailable, continuing without it: {e}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(en: &str, status: SaleStatus) -> EvaluationResult {
        let brand = BrandConfig::new(en, "", format!("https://{en}.example.com"));
        EvaluationResult {
            status,
            ..EvaluationResult::baseline(&brand)
        }
    }

    #[test]
    fn test_build_report_sales_only() {
        let results = vec![
            result("a", SaleStatus::Sale),
            result("b", SaleStatus::NoSale),
            result("c", SaleStatus::Error),
        ];
        let report = build_report(results.clone(), Vec::new(), true);
        assert_eq!(report.sales.len(), 1);
        assert_eq!(report.sales[0].brand_en, "a");

        let report = build_report(results, Vec::new(), false);
        assert_eq!(report.sales.len(), 3);
    }
}
