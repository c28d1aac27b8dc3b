// src/services/evaluator.rs

//! Brand evaluator.
//!
//! Runs every heuristic for one brand and turns the outcome into an
//! `EvaluationResult`. Nothing escapes this boundary: failures become the
//! `error` or `invalid_url` status on the record.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use scraper::Html;

use crate::error::Result;
use crate::models::{
    BrandConfig, Config, EvaluationResult, ManualStatus, PageSnapshot, SaleStatus, SaleType,
};
use crate::services::{
    BannerLocator, DateRangeRefiner, DiscountExtractor, KeywordClassifier, NormalizedText,
    OverrideResolver, Overrides, SaleLinkScorer, SaleTypeCategorizer, ScoredLink,
};
use crate::utils::http::PageFetcher;
use crate::utils::is_valid_url;
use crate::utils::throttle::HostThrottle;

/// What the main page says, with the parsed document already dropped.
#[derive(Debug)]
struct PageAnalysis {
    page_url: String,
    text: NormalizedText,
    status: SaleStatus,
    matched_keyword: Option<String>,
    discount: u8,
    sale_type: SaleType,
    banner_url: String,
    sale_link: Option<ScoredLink>,
}

/// Evaluates brands against their live pages.
pub struct BrandEvaluator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    throttle: Option<HostThrottle>,
    classifier: KeywordClassifier,
    categorizer: SaleTypeCategorizer,
    discount: DiscountExtractor,
    banner: BannerLocator,
    links: SaleLinkScorer,
    dates: DateRangeRefiner,
    overrides: OverrideResolver,
}

impl BrandEvaluator {
    /// Build all components from the configuration. Fails when a
    /// configured pattern does not compile.
    pub fn new(config: Arc<Config>, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        Ok(Self {
            classifier: KeywordClassifier::new(&config.rules),
            categorizer: SaleTypeCategorizer::new(&config.rules.categories),
            discount: DiscountExtractor::new(&config.discount)?,
            banner: BannerLocator::new(&config.banner)?,
            links: SaleLinkScorer::new(&config.links)?,
            dates: DateRangeRefiner::new()?,
            overrides: OverrideResolver::new(&config.overrides),
            throttle: None,
            fetcher,
            config,
        })
    }

    /// Space out requests per host before every fetch.
    pub fn with_throttle(mut self, throttle: HostThrottle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Evaluate one brand. Never fails; see the `status` and `error`
    /// fields of the result.
    pub async fn evaluate(&self, brand: &BrandConfig, today: NaiveDate) -> EvaluationResult {
        let result = self.evaluate_inner(brand, today).await;
        match &result.error {
            Some(error) => log::warn!(
                "{}: {} ({})",
                brand.display_name(),
                result.status,
                error
            ),
            None => log::info!(
                "{}: {} ({}%, {})",
                brand.display_name(),
                result.status,
                result.discount,
                result.sale_type
            ),
        }
        result
    }

    async fn evaluate_inner(&self, brand: &BrandConfig, today: NaiveDate) -> EvaluationResult {
        let overrides = self.overrides.resolve(brand);
        let mut result = EvaluationResult::baseline(brand);
        if let Some(url) = &overrides.sale_url {
            result.sale_url = url.clone();
        }
        if let Some(url) = &overrides.banner_url {
            result.banner_url = url.clone();
        }

        if overrides.suppresses_scan() {
            log::debug!("{}: manual nosale, skipping fetch", brand.display_name());
            return result;
        }

        let scan_url = overrides.scan_url(&brand.official_url).trim().to_string();
        if !is_valid_url(&scan_url) {
            result.status = SaleStatus::InvalidUrl;
            result.error = Some(format!("invalid or empty URL: {scan_url:?}"));
            return result;
        }

        let timeout = Duration::from_secs(self.config.crawler.timeout_secs);
        let snapshot = match self.fetch_snapshot(&scan_url, timeout).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                result.status = SaleStatus::Error;
                result.error = Some(e.to_string());
                return result;
            }
        };

        let analysis = self.analyze(&snapshot, &overrides);
        result.matched_keyword = analysis.matched_keyword.clone();
        if analysis.status != SaleStatus::Sale {
            return result;
        }

        result.status = SaleStatus::Sale;
        result.discount = overrides.discount_or(analysis.discount);
        result.sale_type = overrides.sale_type_or(analysis.sale_type);
        result.banner_url = overrides.banner_url_or_else(|| analysis.banner_url.clone());
        if overrides.sale_url.is_none() {
            if let Some(link) = &analysis.sale_link {
                result.sale_url = link.url.clone();
            }
        }

        if overrides.status.is_none() && self.config.rules.date_refinement {
            result.status = self.refine_status(&analysis, today).await;
            if result.status == SaleStatus::NoSale {
                result.discount = 0;
                result.sale_type = SaleType::default();
                result.banner_url = overrides.banner_url_or_else(String::new);
            }
        }

        result
    }

    /// Fetch a page, throttled when a throttle is installed.
    async fn fetch_snapshot(&self, url: &str, timeout: Duration) -> Result<PageSnapshot> {
        if let Some(throttle) = &self.throttle {
            throttle.acquire(url).await;
        }
        self.fetcher.fetch(url, timeout).await?.into_snapshot()
    }

    /// Run the synchronous heuristics over the main page.
    fn analyze(&self, snapshot: &PageSnapshot, overrides: &Overrides) -> PageAnalysis {
        let document = Html::parse_document(&snapshot.raw_html);
        let text = NormalizedText::from_document(&document);
        let classification = self.classifier.classify(&text, &overrides.keywords);
        let discount = self.discount.extract(&text, &document);

        let mut status = match overrides.status {
            Some(ManualStatus::Sale) => SaleStatus::Sale,
            Some(ManualStatus::NoSale) => SaleStatus::NoSale,
            None => classification.status,
        };
        if status == SaleStatus::NoSale
            && overrides.status.is_none()
            && self.config.rules.promote_on_discount
            && classification.is_silent()
            && discount > 0
        {
            log::debug!("{}: no keyword, promoted on {discount}%", snapshot.url);
            status = SaleStatus::Sale;
        }

        let on_sale = status == SaleStatus::Sale;
        PageAnalysis {
            page_url: snapshot.url.clone(),
            sale_type: self.categorizer.categorize(&text),
            banner_url: if on_sale {
                self.banner.locate(&document, &snapshot.url)
            } else {
                String::new()
            },
            sale_link: if on_sale {
                self.links.best_link(&document, &snapshot.url)
            } else {
                None
            },
            matched_keyword: classification.matched_keyword,
            status,
            discount,
            text,
        }
    }

    /// Check the sale against the first date interval on the sale page,
    /// or on the main page when no separate sale page was found.
    async fn refine_status(&self, analysis: &PageAnalysis, today: NaiveDate) -> SaleStatus {
        let link = analysis
            .sale_link
            .as_ref()
            .filter(|link| link.url != analysis.page_url);

        let Some(link) = link else {
            return self.dates.refine(analysis.status, &analysis.text, today);
        };

        let timeout = Duration::from_secs(self.config.crawler.date_timeout_secs);
        match self.fetch_snapshot(&link.url, timeout).await {
            Ok(snapshot) => {
                let document = Html::parse_document(&snapshot.raw_html);
                let text = NormalizedText::from_document(&document);
                self.dates.refine(analysis.status, &text, today)
            }
            Err(e) => {
                log::debug!("Date source {} unavailable: {}", link.url, e);
                analysis.status
            }
        }
    }
}
