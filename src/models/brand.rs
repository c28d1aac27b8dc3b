//! Brand rows and per-brand override entries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::SaleType;

/// Status forced by a human instead of computed from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualStatus {
    Sale,
    NoSale,
}

impl ManualStatus {
    /// Parse a sheet cell; anything other than a sale/nosale spelling is
    /// not an override.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "sale" => Some(Self::Sale),
            "nosale" | "no sale" | "no_sale" | "no-sale" => Some(Self::NoSale),
            _ => None,
        }
    }
}

/// One brand to scan, as configured by the editors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandConfig {
    pub brand_en: String,
    pub brand_ko: String,
    pub official_url: String,
    pub sale_url_override: Option<String>,
    pub banner_url_override: Option<String>,
    pub manual_status: Option<ManualStatus>,
    /// Raw integer from the sheet; only 5..=95 is honored later
    pub manual_discount: Option<i64>,
    pub manual_sale_type: Option<SaleType>,
    /// Extra positive keywords, upper-cased
    pub keyword_overrides: BTreeSet<String>,
    pub region: String,
    pub enabled: bool,
}

impl BrandConfig {
    /// Create an enabled brand with no overrides.
    pub fn new(
        brand_en: impl Into<String>,
        brand_ko: impl Into<String>,
        official_url: impl Into<String>,
    ) -> Self {
        Self {
            brand_en: brand_en.into(),
            brand_ko: brand_ko.into(),
            official_url: official_url.into(),
            sale_url_override: None,
            banner_url_override: None,
            manual_status: None,
            manual_discount: None,
            manual_sale_type: None,
            keyword_overrides: BTreeSet::new(),
            region: "KR".to_string(),
            enabled: true,
        }
    }

    /// Name used in logs: the Korean name when present.
    pub fn display_name(&self) -> &str {
        if self.brand_ko.is_empty() {
            &self.brand_en
        } else {
            &self.brand_ko
        }
    }

    /// Ordering key used when results arrive out of order.
    pub fn identity_key(&self) -> (String, String) {
        (self.brand_en.to_lowercase(), self.brand_ko.clone())
    }
}

/// Raw sheet row. Column names follow the published sheet; the older
/// spellings are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandRow {
    #[serde(default, alias = "brand")]
    pub brand_en: Option<String>,
    #[serde(default)]
    pub brand_ko: Option<String>,
    #[serde(default)]
    pub official_url: Option<String>,
    #[serde(default, alias = "sale_url")]
    pub sale_url_override: Option<String>,
    #[serde(default, alias = "banner_url")]
    pub banner_url_override: Option<String>,
    #[serde(default)]
    pub manual_discount: Option<String>,
    #[serde(default)]
    pub manual_status: Option<String>,
    #[serde(default, alias = "manual_type")]
    pub manual_sale_type: Option<String>,
    #[serde(default, alias = "keywords")]
    pub keywords_override: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub enabled: Option<String>,
}

impl BrandRow {
    /// Convert into a brand configuration. Rows without any brand name
    /// yield `None`.
    pub fn into_config(self, default_region: &str) -> Option<BrandConfig> {
        let brand_en = cell(self.brand_en).unwrap_or_default();
        let brand_ko = cell(self.brand_ko).unwrap_or_default();
        if brand_en.is_empty() && brand_ko.is_empty() {
            return None;
        }

        let manual_discount = cell(self.manual_discount).and_then(|raw| {
            raw.parse::<i64>()
                .map_err(|_| {
                    log::warn!("Ignoring invalid manual_discount for {brand_en}{brand_ko}: {raw}")
                })
                .ok()
        });

        Some(BrandConfig {
            official_url: cell(self.official_url).unwrap_or_default(),
            sale_url_override: cell(self.sale_url_override),
            banner_url_override: cell(self.banner_url_override),
            manual_status: cell(self.manual_status).and_then(|s| ManualStatus::parse(&s)),
            manual_discount,
            manual_sale_type: cell(self.manual_sale_type).and_then(|s| SaleType::parse(&s)),
            keyword_overrides: cell(self.keywords_override)
                .map(|s| split_keywords(&s))
                .unwrap_or_default(),
            region: cell(self.region)
                .map(|r| r.to_uppercase())
                .unwrap_or_else(|| default_region.to_uppercase()),
            enabled: cell(self.enabled).is_none_or(|s| parse_enabled(&s)),
            brand_en,
            brand_ko,
        })
    }
}

/// Entry of the per-brand override table in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandOverride {
    /// Matches `brand_ko` or `brand_en`, case-insensitively
    pub brand: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub discount: Option<i64>,
    #[serde(default)]
    pub sale_type: Option<String>,
    #[serde(default)]
    pub sale_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Split a comma- or pipe-delimited keyword cell into upper-cased terms.
pub fn split_keywords(raw: &str) -> BTreeSet<String> {
    raw.split([',', '|'])
        .map(|k| k.trim().to_uppercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn parse_enabled(raw: &str) -> bool {
    !matches!(
        raw.trim().to_lowercase().as_str(),
        "false" | "0" | "no" | "n" | "off"
    )
}

fn cell(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> BrandRow {
        BrandRow {
            brand_en: Some(" Hane ".to_string()),
            brand_ko: Some("하네".to_string()),
            official_url: Some("https://hane.example.com".to_string()),
            ..BrandRow::default()
        }
    }

    #[test]
    fn test_row_defaults() {
        let brand = row().into_config("kr").unwrap();
        assert_eq!(brand.brand_en, "Hane");
        assert_eq!(brand.region, "KR");
        assert!(brand.enabled);
        assert!(brand.manual_status.is_none());
        assert!(brand.keyword_overrides.is_empty());
    }

    #[test]
    fn test_row_without_names_is_skipped() {
        let row = BrandRow {
            official_url: Some("https://nobody.example.com".to_string()),
            ..BrandRow::default()
        };
        assert!(row.into_config("KR").is_none());
    }

    #[test]
    fn test_row_overrides_parsed() {
        let brand = BrandRow {
            manual_discount: Some("40".to_string()),
            manual_status: Some("SALE".to_string()),
            manual_sale_type: Some("season off".to_string()),
            keywords_override: Some("archive sale| 아카이브 ,, final".to_string()),
            enabled: Some("FALSE".to_string()),
            region: Some("jp".to_string()),
            ..row()
        }
        .into_config("KR")
        .unwrap();

        assert_eq!(brand.manual_discount, Some(40));
        assert_eq!(brand.manual_status, Some(ManualStatus::Sale));
        assert_eq!(brand.manual_sale_type, Some(SaleType::SeasonOff));
        assert_eq!(brand.region, "JP");
        assert!(!brand.enabled);
        assert!(brand.keyword_overrides.contains("ARCHIVE SALE"));
        assert!(brand.keyword_overrides.contains("아카이브"));
        assert!(brand.keyword_overrides.contains("FINAL"));
        assert_eq!(brand.keyword_overrides.len(), 3);
    }

    #[test]
    fn test_unknown_overrides_ignored() {
        let brand = BrandRow {
            manual_discount: Some("forty".to_string()),
            manual_status: Some("maybe".to_string()),
            manual_sale_type: Some("NEW YEAR SALE".to_string()),
            ..row()
        }
        .into_config("KR")
        .unwrap();

        assert!(brand.manual_discount.is_none());
        assert!(brand.manual_status.is_none());
        assert!(brand.manual_sale_type.is_none());
    }

    #[test]
    fn test_manual_status_spellings() {
        assert_eq!(ManualStatus::parse("nosale"), Some(ManualStatus::NoSale));
        assert_eq!(ManualStatus::parse(" No Sale "), Some(ManualStatus::NoSale));
        assert_eq!(ManualStatus::parse("Sale"), Some(ManualStatus::Sale));
        assert_eq!(ManualStatus::parse(""), None);
    }

    #[test]
    fn test_display_name_prefers_korean() {
        let brand = BrandConfig::new("Hane", "하네", "https://hane.example.com");
        assert_eq!(brand.display_name(), "하네");
        let brand = BrandConfig::new("Hane", "", "https://hane.example.com");
        assert_eq!(brand.display_name(), "Hane");
    }
}
