//! Override resolution.
//!
//! Editors can pin any output field, either in the brand sheet or in the
//! `[[overrides]]` table of the config file. Precedence per field is:
//! manual value, then computed value, then the built-in default.

use std::collections::{BTreeSet, HashMap};

use crate::models::{BrandConfig, BrandOverride, ManualStatus, SaleType, split_keywords};
use crate::services::discount::{MAX_DISCOUNT, MIN_DISCOUNT};
use crate::utils::is_valid_url;

/// Validated overrides for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub status: Option<ManualStatus>,
    /// Only values inside 5..=95 survive
    pub discount: Option<u8>,
    pub sale_type: Option<SaleType>,
    /// Absolute http(s) URLs only
    pub sale_url: Option<String>,
    pub banner_url: Option<String>,
    /// Extra positive keywords, upper-cased
    pub keywords: BTreeSet<String>,
}

impl Overrides {
    /// A manual `nosale` skips the whole evaluation.
    pub fn suppresses_scan(&self) -> bool {
        self.status == Some(ManualStatus::NoSale)
    }

    pub fn discount_or(&self, computed: u8) -> u8 {
        self.discount.unwrap_or(computed)
    }

    pub fn sale_type_or(&self, computed: SaleType) -> SaleType {
        self.sale_type.unwrap_or(computed)
    }

    pub fn banner_url_or_else(&self, computed: impl FnOnce() -> String) -> String {
        self.banner_url.clone().unwrap_or_else(computed)
    }

    /// The page to scan: the pinned sale URL, else the official site.
    pub fn scan_url<'a>(&'a self, official_url: &'a str) -> &'a str {
        self.sale_url.as_deref().unwrap_or(official_url)
    }
}

/// Merges sheet columns with the per-brand override table.
#[derive(Debug, Clone, Default)]
pub struct OverrideResolver {
    table: HashMap<String, BrandOverride>,
}

impl OverrideResolver {
    pub fn new(entries: &[BrandOverride]) -> Self {
        let table = entries
            .iter()
            .map(|entry| (lookup_key(&entry.brand), entry.clone()))
            .collect();
        Self { table }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Table entry for a brand, looked up by Korean name first.
    pub fn entry_for(&self, brand: &BrandConfig) -> Option<&BrandOverride> {
        [&brand.brand_ko, &brand.brand_en]
            .into_iter()
            .filter(|name| !name.trim().is_empty())
            .find_map(|name| self.table.get(&lookup_key(name)))
    }

    /// Resolve the overrides that apply to one brand. Table entries win
    /// over the brand's own columns.
    pub fn resolve(&self, brand: &BrandConfig) -> Overrides {
        let mut overrides = Overrides {
            status: brand.manual_status,
            discount: brand.manual_discount.and_then(valid_discount),
            sale_type: brand.manual_sale_type,
            sale_url: url_override(brand, "sale_url", brand.sale_url_override.as_deref()),
            banner_url: url_override(brand, "banner_url", brand.banner_url_override.as_deref()),
            keywords: brand.keyword_overrides.clone(),
        };

        let Some(entry) = self.entry_for(brand) else {
            return overrides;
        };

        let explicit_status = entry.status.as_deref().and_then(ManualStatus::parse);
        if let Some(discount) = entry.discount {
            overrides.discount = valid_discount(discount);
            overrides.status = Some(if discount == 0 {
                ManualStatus::NoSale
            } else {
                ManualStatus::Sale
            });
        }
        if explicit_status.is_some() {
            overrides.status = explicit_status;
        }
        if let Some(sale_type) = entry.sale_type.as_deref().and_then(SaleType::parse) {
            overrides.sale_type = Some(sale_type);
        }
        if let Some(url) = url_override(brand, "sale_url", entry.sale_url.as_deref()) {
            overrides.sale_url = Some(url);
        }
        if let Some(url) = url_override(brand, "banner_url", entry.banner_url.as_deref()) {
            overrides.banner_url = Some(url);
        }
        for keyword in &entry.keywords {
            overrides.keywords.extend(split_keywords(keyword));
        }

        overrides
    }
}

fn valid_discount(value: i64) -> Option<u8> {
    u32::try_from(value)
        .ok()
        .filter(|v| (MIN_DISCOUNT..=MAX_DISCOUNT).contains(v))
        .and_then(|v| u8::try_from(v).ok())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A pinned URL that is not absolute http(s) is dropped so the computed
/// value stays in place.
fn url_override(brand: &BrandConfig, field: &str, value: Option<&str>) -> Option<String> {
    let url = non_empty(value)?;
    if is_valid_url(&url) {
        Some(url)
    } else {
        log::warn!(
            "{}: ignoring {field} override {url:?}, not an absolute http(s) URL",
            brand.display_name()
        );
        None
    }
}

fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand() -> BrandConfig {
        BrandConfig::new("Hane", "하네", "https://hane.example.com")
    }

    fn entry(brand: &str) -> BrandOverride {
        BrandOverride {
            brand: brand.to_string(),
            ..BrandOverride::default()
        }
    }

    #[test]
    fn test_no_overrides() {
        let overrides = OverrideResolver::default().resolve(&brand());
        assert_eq!(overrides, Overrides::default());
        assert_eq!(overrides.discount_or(40), 40);
        assert_eq!(overrides.sale_type_or(SaleType::Outlet), SaleType::Outlet);
        assert_eq!(overrides.scan_url("https://hane.example.com"), "https://hane.example.com");
        assert_eq!(overrides.banner_url_or_else(|| "computed".into()), "computed");
    }

    #[test]
    fn test_sheet_columns() {
        let mut brand = brand();
        brand.manual_discount = Some(35);
        brand.manual_sale_type = Some(SaleType::Refurb);
        brand.sale_url_override = Some(" https://hane.example.com/sale ".to_string());
        brand.banner_url_override = Some("".to_string());

        let overrides = OverrideResolver::default().resolve(&brand);
        assert_eq!(overrides.discount_or(80), 35);
        assert_eq!(overrides.sale_type_or(SaleType::Sale), SaleType::Refurb);
        assert_eq!(
            overrides.scan_url(&brand.official_url),
            "https://hane.example.com/sale"
        );
        assert!(overrides.banner_url.is_none());
    }

    #[test]
    fn test_out_of_band_manual_discount_ignored() {
        for raw in [0, 3, 96, 150, -20] {
            let mut brand = brand();
            brand.manual_discount = Some(raw);
            let overrides = OverrideResolver::default().resolve(&brand);
            assert_eq!(overrides.discount_or(42), 42, "manual {raw}");
        }
    }

    #[test]
    fn test_table_zero_discount_means_nosale() {
        let resolver = OverrideResolver::new(&[BrandOverride {
            discount: Some(0),
            sale_type: Some("NO SALE".to_string()),
            ..entry("하네")
        }]);
        let overrides = resolver.resolve(&brand());
        assert_eq!(overrides.status, Some(ManualStatus::NoSale));
        assert!(overrides.suppresses_scan());
        assert!(overrides.discount.is_none());
        assert!(overrides.sale_type.is_none());
    }

    #[test]
    fn test_table_discount_means_sale_and_wins_over_sheet() {
        let mut brand = brand();
        brand.manual_discount = Some(20);
        brand.manual_status = Some(ManualStatus::NoSale);
        let resolver = OverrideResolver::new(&[BrandOverride {
            discount: Some(80),
            sale_type: Some("CLEARANCE".to_string()),
            keywords: vec!["archive|final".to_string()],
            ..entry("HANE")
        }]);

        let overrides = resolver.resolve(&brand);
        assert_eq!(overrides.status, Some(ManualStatus::Sale));
        assert_eq!(overrides.discount, Some(80));
        assert_eq!(overrides.sale_type, Some(SaleType::Clearance));
        assert!(overrides.keywords.contains("ARCHIVE"));
        assert!(overrides.keywords.contains("FINAL"));
    }

    #[test]
    fn test_explicit_table_status_beats_discount_rule() {
        let resolver = OverrideResolver::new(&[BrandOverride {
            status: Some("sale".to_string()),
            discount: Some(0),
            ..entry("하네")
        }]);
        let overrides = resolver.resolve(&brand());
        assert_eq!(overrides.status, Some(ManualStatus::Sale));
        assert!(overrides.discount.is_none());
    }

    #[test]
    fn test_url_overrides_without_scheme_dropped() {
        let mut brand = brand();
        brand.sale_url_override = Some("hane.example.com/sale".to_string());
        brand.banner_url_override = Some("/img/banner.jpg".to_string());
        let overrides = OverrideResolver::default().resolve(&brand);
        assert!(overrides.sale_url.is_none());
        assert!(overrides.banner_url.is_none());
        assert_eq!(overrides.scan_url(&brand.official_url), "https://hane.example.com");

        let resolver = OverrideResolver::new(&[BrandOverride {
            sale_url: Some("javascript:void(0)".to_string()),
            banner_url: Some("https://cdn.example.com/hane.jpg".to_string()),
            ..entry("하네")
        }]);
        let mut brand = self::brand();
        brand.sale_url_override = Some("https://hane.example.com/outlet".to_string());
        let overrides = resolver.resolve(&brand);
        assert_eq!(overrides.sale_url.as_deref(), Some("https://hane.example.com/outlet"));
        assert_eq!(overrides.banner_url.as_deref(), Some("https://cdn.example.com/hane.jpg"));
    }

    #[test]
    fn test_lookup_is_case_insensitive_and_trimmed() {
        let resolver = OverrideResolver::new(&[entry("  hane ")]);
        assert_eq!(resolver.len(), 1);
        assert!(resolver.entry_for(&brand()).is_some());
        let other = BrandConfig::new("Other", "", "https://other.example.com");
        assert!(resolver.entry_for(&other).is_none());
    }
}
