//! Evaluation results and the emitted feed.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::BrandConfig;

/// Closed set of campaign styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleType {
    #[serde(alias = "SEASON OFF")]
    SeasonOff,
    Clearance,
    Refurb,
    Outlet,
    #[default]
    Sale,
}

impl SaleType {
    /// Category priority, most specific first.
    pub const PRIORITY: [SaleType; 5] = [
        SaleType::SeasonOff,
        SaleType::Clearance,
        SaleType::Refurb,
        SaleType::Outlet,
        SaleType::Sale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::SeasonOff => "SEASON_OFF",
            SaleType::Clearance => "CLEARANCE",
            SaleType::Refurb => "REFURB",
            SaleType::Outlet => "OUTLET",
            SaleType::Sale => "SALE",
        }
    }

    /// Parse a known category name, tolerating spaces and dashes.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_uppercase().replace([' ', '-'], "_");
        Self::PRIORITY.into_iter().find(|t| t.as_str() == key)
    }
}

impl fmt::Display for SaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SaleStatus {
    #[serde(rename = "sale")]
    Sale,
    #[default]
    #[serde(rename = "nosale")]
    NoSale,
    #[serde(rename = "upcoming")]
    Upcoming,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "invalid_url")]
    InvalidUrl,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Sale => "sale",
            SaleStatus::NoSale => "nosale",
            SaleStatus::Upcoming => "upcoming",
            SaleStatus::Error => "error",
            SaleStatus::InvalidUrl => "invalid_url",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result record for one evaluated brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub brand_en: String,
    pub brand_ko: String,
    pub official_url: String,

    /// Best link to the sale; never empty when `official_url` is set
    pub sale_url: String,

    /// Promotional image, empty when none qualified
    pub banner_url: String,

    pub status: SaleStatus,

    /// 0, or a percentage within 5..=95
    pub discount: u8,

    pub sale_type: SaleType,
    pub region: String,

    /// First positive keyword found on the page
    pub matched_keyword: Option<String>,

    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl EvaluationResult {
    /// Baseline record before anything is computed: `nosale`, no discount,
    /// default category, official URL as the sale link.
    pub fn baseline(brand: &BrandConfig) -> Self {
        Self {
            brand_en: brand.brand_en.clone(),
            brand_ko: brand.brand_ko.clone(),
            official_url: brand.official_url.clone(),
            sale_url: brand.official_url.clone(),
            banner_url: String::new(),
            status: SaleStatus::NoSale,
            discount: 0,
            sale_type: SaleType::default(),
            region: brand.region.clone(),
            matched_keyword: None,
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn identity_key(&self) -> (String, String) {
        (self.brand_en.to_lowercase(), self.brand_ko.clone())
    }
}

/// Full feed written at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub sales: Vec<EvaluationResult>,
    /// Editorial rows passed through untouched
    #[serde(default)]
    pub editorials: Vec<BTreeMap<String, String>>,
}

impl ScanReport {
    pub fn new(sales: Vec<EvaluationResult>, editorials: Vec<BTreeMap<String, String>>) -> Self {
        Self {
            generated_at: Utc::now(),
            sales,
            editorials,
        }
    }
}
