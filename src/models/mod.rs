// src/models/mod.rs

//! Domain models for the scanner.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod brand;
mod config;
mod page;
mod result;

// Re-export all public types
pub use brand::{BrandConfig, BrandOverride, BrandRow, ManualStatus, split_keywords};
pub use config::{
    BannerConfig, CategoryRule, Config, CrawlerConfig, DiscountConfig, LinkConfig, OutputConfig,
    RulesConfig, SourcesConfig,
};
pub use page::{FetchedPage, PageSnapshot};
pub use result::{EvaluationResult, SaleStatus, SaleType, ScanReport};

/// Counters for one scan run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScanOutcome {
    pub total_rows: usize,
    pub skipped_disabled: usize,
    pub evaluated: usize,
    pub sale: usize,
    pub upcoming: usize,
    pub nosale: usize,
    pub error: usize,
    pub invalid_url: usize,
}

impl ScanOutcome {
    /// Count one finished evaluation.
    pub fn record(&mut self, status: SaleStatus) {
        self.evaluated += 1;
        match status {
            SaleStatus::Sale => self.sale += 1,
            SaleStatus::Upcoming => self.upcoming += 1,
            SaleStatus::NoSale => self.nosale += 1,
            SaleStatus::Error => self.error += 1,
            SaleStatus::InvalidUrl => self.invalid_url += 1,
        }
    }
}
