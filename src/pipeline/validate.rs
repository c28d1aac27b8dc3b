// src/pipeline/validate.rs

use std::path::Path;

use crate::error::Result;
use crate::models::Config;
use crate::services::{
    BannerLocator, DateRangeRefiner, DiscountExtractor, OverrideResolver, SaleLinkScorer, sheet,
};

/// What `validate` found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub discount_patterns: usize,
    pub overrides: usize,
    /// `None` when the brand sheet is remote and was not checked
    pub brands: Option<usize>,
    pub disabled_brands: usize,
}

/// Validate the configuration: sanity checks, every configured pattern
/// compiles, and a local brand sheet parses.
pub fn run_validate(config: &Config, base_dir: &Path) -> Result<ValidationSummary> {
    log::info!("Validating configuration...");

    config.validate()?;
    DiscountExtractor::new(&config.discount)?;
    BannerLocator::new(&config.banner)?;
    SaleLinkScorer::new(&config.links)?;
    DateRangeRefiner::new()?;
    let overrides = OverrideResolver::new(&config.overrides);

    log::info!("User agent: {}", config.crawler.user_agent);
    log::info!(
        "Timeouts: {}s page, {}s date source",
        config.crawler.timeout_secs,
        config.crawler.date_timeout_secs
    );
    log::info!("Max concurrent: {}", config.crawler.max_concurrent);
    log::info!(
        "{} positive / {} negative keywords, {} categories, {} overrides",
        config.rules.positive_keywords.len(),
        config.rules.negative_keywords.len(),
        config.rules.categories.len(),
        overrides.len()
    );

    let mut summary = ValidationSummary {
        discount_patterns: config.discount.patterns.len(),
        overrides: overrides.len(),
        ..ValidationSummary::default()
    };

    let source = config.sources.brands.trim();
    if source.starts_with("http://") || source.starts_with("https://") {
        log::info!("Brand sheet is remote ({source}), not fetched");
    } else {
        let path = base_dir.join(source);
        let content = std::fs::read_to_string(&path)?;
        let brands = sheet::parse_brands(&content, &config.output.default_region)?;
        summary.brands = Some(brands.len());
        summary.disabled_brands = brands.iter().filter(|b| !b.enabled).count();
        log::info!(
            "Brand sheet {}: {} rows, {} disabled",
            path.display(),
            brands.len(),
            summary.disabled_brands
        );
    }

    log::info!("All validations passed!");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_with_local_sheet() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("brands.csv"),
            "brand,brand_ko,official_url,enabled\nHane,하네,https://hane.example.com,\nOff,,https://off.example.com,false\n",
        )
        .unwrap();

        let summary = run_validate(&Config::default(), dir.path()).unwrap();
        assert_eq!(summary.brands, Some(2));
        assert_eq!(summary.disabled_brands, 1);
        assert_eq!(summary.overrides, 0);
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.sources.brands = "https://sheets.example.com/pub?output=csv".to_string();
        assert!(run_validate(&config, dir.path()).is_ok());

        config.links.listing_patterns.push("[unclosed".to_string());
        assert!(run_validate(&config, dir.path()).is_err());
    }

    #[test]
    fn test_validate_missing_sheet() {
        let dir = TempDir::new().unwrap();
        assert!(run_validate(&Config::default(), dir.path()).is_err());
    }
}
