//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{BrandOverride, SaleType};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and scanning behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Where brand and editorial rows come from
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Snapshot output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Keyword classification rules
    #[serde(default)]
    pub rules: RulesConfig,

    /// Discount extraction templates
    #[serde(default)]
    pub discount: DiscountConfig,

    /// Banner image selection rules
    #[serde(default)]
    pub banner: BannerConfig,

    /// Sale link scoring rules
    #[serde(default)]
    pub links: LinkConfig,

    /// Per-brand manual overrides
    #[serde(default)]
    pub overrides: Vec<BrandOverride>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.date_timeout_secs == 0 {
            return Err(AppError::validation(
                "crawler.date_timeout_secs must be > 0",
            ));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.sources.brands.trim().is_empty() {
            return Err(AppError::validation("sources.brands is empty"));
        }
        if self.output.path.trim().is_empty() {
            return Err(AppError::validation("output.path is empty"));
        }
        if self.rules.positive_keywords.is_empty() {
            return Err(AppError::validation("No positive keywords defined"));
        }
        if self.rules.categories.is_empty() {
            return Err(AppError::validation("No sale-type categories defined"));
        }
        if self.discount.patterns.is_empty() {
            return Err(AppError::validation("No discount patterns defined"));
        }
        if self.links.keywords.is_empty() {
            return Err(AppError::validation("No sale link keywords defined"));
        }
        if let Some(entry) = self.overrides.iter().find(|o| o.brand.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "Override entry without brand: {entry:?}"
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            sources: SourcesConfig::default(),
            output: OutputConfig::default(),
            rules: RulesConfig::default(),
            discount: DiscountConfig::default(),
            banner: BannerConfig::default(),
            links: LinkConfig::default(),
            overrides: Vec::new(),
        }
    }
}

/// HTTP client and scanning behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds for the brand page
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Shorter timeout for the optional date-range page
    #[serde(default = "defaults::date_timeout")]
    pub date_timeout_secs: u64,

    /// Delay between brands (per host when running concurrently)
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Number of brands evaluated at once; 1 keeps the run sequential
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Attempts when downloading a sheet over HTTP
    #[serde(default = "defaults::sheet_retries")]
    pub sheet_retries: u32,

    /// Pause between sheet download attempts
    #[serde(default = "defaults::sheet_retry_delay")]
    pub sheet_retry_delay_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            date_timeout_secs: defaults::date_timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            sheet_retries: defaults::sheet_retries(),
            sheet_retry_delay_secs: defaults::sheet_retry_delay(),
        }
    }
}

/// Row sources. Each value is a file path (relative to the storage
/// directory) or an http(s) URL of a published CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "defaults::brands_source")]
    pub brands: String,

    /// Editorial rows passed through to the feed untouched
    #[serde(default)]
    pub editorials: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            brands: defaults::brands_source(),
            editorials: None,
        }
    }
}

/// Snapshot output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Snapshot file, relative to the storage directory
    #[serde(default = "defaults::output_path")]
    pub path: String,

    /// Emit only brands currently on sale
    #[serde(default)]
    pub sales_only: bool,

    /// Region code used when a row leaves it blank
    #[serde(default = "defaults::region")]
    pub default_region: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
            sales_only: false,
            default_region: defaults::region(),
        }
    }
}

/// Keyword classification and categorization rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Terms whose presence signals an active promotion
    #[serde(default = "defaults::positive_keywords")]
    pub positive_keywords: Vec<String>,

    /// Terms that disqualify a page regardless of positive hits
    #[serde(default = "defaults::negative_keywords")]
    pub negative_keywords: Vec<String>,

    /// Sale-type categories in priority order
    #[serde(default = "defaults::categories")]
    pub categories: Vec<CategoryRule>,

    /// Treat a page with a plausible discount but no keyword as on sale
    #[serde(default = "defaults::enabled")]
    pub promote_on_discount: bool,

    /// Refine `sale` status with an explicit date range when one is found
    #[serde(default = "defaults::enabled")]
    pub date_refinement: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            positive_keywords: defaults::positive_keywords(),
            negative_keywords: defaults::negative_keywords(),
            categories: defaults::categories(),
            promote_on_discount: true,
            date_refinement: true,
        }
    }
}

/// Keywords that identify one sale-type category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: SaleType,
    pub keywords: Vec<String>,
}

/// Discount extraction templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountConfig {
    /// Regular expressions run over normalized (upper-case) text; every
    /// capture group is a candidate percentage
    #[serde(default = "defaults::discount_patterns")]
    pub patterns: Vec<String>,
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            patterns: defaults::discount_patterns(),
        }
    }
}

/// Banner image selection rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerConfig {
    /// Class name fragments that mark hero/banner images
    #[serde(default = "defaults::banner_classes")]
    pub class_patterns: Vec<String>,

    /// Image URL fragments that disqualify the fallback image
    #[serde(default = "defaults::banner_excludes")]
    pub exclude_terms: Vec<String>,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            class_patterns: defaults::banner_classes(),
            exclude_terms: defaults::banner_excludes(),
        }
    }
}

/// Sale link scoring rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Terms counted in anchor text and URL
    #[serde(default = "defaults::link_keywords")]
    pub keywords: Vec<String>,

    /// Terms that disqualify an anchor outright
    #[serde(default = "defaults::link_blacklist")]
    pub blacklist: Vec<String>,

    /// URL regexes of catalog/listing pages
    #[serde(default = "defaults::listing_patterns")]
    pub listing_patterns: Vec<String>,

    /// URL regexes of single product pages
    #[serde(default = "defaults::detail_patterns")]
    pub detail_patterns: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            keywords: defaults::link_keywords(),
            blacklist: defaults::link_blacklist(),
            listing_patterns: defaults::listing_patterns(),
            detail_patterns: defaults::detail_patterns(),
        }
    }
}

mod defaults {
    use super::CategoryRule;
    use crate::models::SaleType;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn date_timeout() -> u64 {
        10
    }
    pub fn request_delay() -> u64 {
        500
    }
    pub fn max_concurrent() -> usize {
        1
    }
    pub fn sheet_retries() -> u32 {
        3
    }
    pub fn sheet_retry_delay() -> u64 {
        5
    }
    pub fn enabled() -> bool {
        true
    }

    // Source and output defaults
    pub fn brands_source() -> String {
        "brands.csv".into()
    }
    pub fn output_path() -> String {
        "sales.json".into()
    }
    pub fn region() -> String {
        "KR".into()
    }

    // Keyword defaults
    pub fn positive_keywords() -> Vec<String> {
        strings(&[
            "SALE",
            "세일",
            "할인",
            "% OFF",
            "UP TO",
            "최대",
            "SEASON OFF",
            "시즌오프",
            "시즌 오프",
            "CLEARANCE",
            "클리어런스",
            "LAST CHANCE",
            "재고정리",
            "REFURB",
            "B-GRADE",
            "리퍼브",
            "B급",
            "OUTLET",
            "아울렛",
        ])
    }
    pub fn negative_keywords() -> Vec<String> {
        strings(&[
            "SALE END",
            "SALE CLOSED",
            "SOLD OUT",
            "세일 종료",
            "품절",
            "종료",
        ])
    }
    pub fn categories() -> Vec<CategoryRule> {
        vec![
            CategoryRule {
                category: SaleType::SeasonOff,
                keywords: strings(&["SEASON OFF", "시즌오프", "시즌 오프"]),
            },
            CategoryRule {
                category: SaleType::Clearance,
                keywords: strings(&["CLEARANCE", "클리어런스", "LAST CHANCE", "재고정리"]),
            },
            CategoryRule {
                category: SaleType::Refurb,
                keywords: strings(&["REFURB", "B-GRADE", "리퍼브", "B급"]),
            },
            CategoryRule {
                category: SaleType::Outlet,
                keywords: strings(&["OUTLET", "아울렛"]),
            },
            CategoryRule {
                category: SaleType::Sale,
                keywords: strings(&[
                    "SALE",
                    "세일",
                    "할인",
                    "파이널 세일",
                    "샘플세일",
                    "아카이브 세일",
                    "NEW YEAR SALE",
                    "뉴이어 세일",
                ]),
            },
        ]
    }

    // Discount defaults, most specific first
    pub fn discount_patterns() -> Vec<String> {
        strings(&[
            r"UP\s*TO\s*(\d{1,2})\s*%",
            r"최대\s*(\d{1,2})\s*%",
            r"(?:^|\D)(\d{1,2})\s*%\s*OFF",
            r"(?:^|\D)(\d{1,2})\s*%\s*DISCOUNT",
            r"SAVE\s*(\d{1,2})\s*%",
            r"(?:^|\D)(\d{1,2})\s*PERCENT",
            r"(?:^|\D)(\d{1,2})\s*%.{0,40}?SALE",
            r"SALE(?:.{0,40}?\D)?(\d{1,2})\s*%",
            r"(?:^|\D)(\d{1,2})\s*%?\s*[~～]\s*(\d{1,2})\s*%",
            r"(?:^|\D)(\d{1,2})\s*%",
        ])
    }

    // Banner defaults
    pub fn banner_classes() -> Vec<String> {
        strings(&[
            "main-banner",
            "hero",
            "visual",
            "top-banner",
            "banner-img",
            "promo-banner",
        ])
    }
    pub fn banner_excludes() -> Vec<String> {
        strings(&["logo", "icon"])
    }

    // Sale link defaults
    pub fn link_keywords() -> Vec<String> {
        strings(&[
            "SALE",
            "세일",
            "할인",
            "특가",
            "OUTLET",
            "아울렛",
            "SEASON OFF",
            "시즌오프",
            "CLEARANCE",
            "클리어런스",
            "REFURB",
            "리퍼브",
            "DISCOUNT",
        ])
    }
    pub fn link_blacklist() -> Vec<String> {
        strings(&[
            "login",
            "logout",
            "signup",
            "join",
            "cart",
            "basket",
            "account",
            "mypage",
            "member",
            "wishlist",
            "instagram",
            "facebook",
            "youtube",
            "twitter",
            "kakao",
            "tiktok",
            "pinterest",
            "press",
            "lookbook",
            "로그인",
            "회원가입",
            "장바구니",
            "마이페이지",
            "룩북",
        ])
    }
    pub fn listing_patterns() -> Vec<String> {
        strings(&[
            r"/categor(?:y|ies)",
            r"/collections?(?:/|$|\?)",
            r"/shop(?:/|$|\?)",
            r"/list",
            r"cate_no=",
            r"/sale(?:/|$|\?|\.)",
            r"/outlet",
        ])
    }
    pub fn detail_patterns() -> Vec<String> {
        strings(&[
            r"/products?/[^/?#]+/?$",
            r"/product/detail",
            r"detail\.html",
            r"product_no=",
            r"/goods/\d+",
            r"/item/\d+",
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_nameless_override() {
        let mut config = Config::default();
        config.overrides.push(BrandOverride {
            brand: " ".to_string(),
            ..BrandOverride::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_categories_follow_priority_order() {
        let order: Vec<SaleType> = Config::default()
            .rules
            .categories
            .iter()
            .map(|r| r.category)
            .collect();
        assert_eq!(order, SaleType::PRIORITY.to_vec());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            timeout_secs = 5

            [rules]
            date_refinement = false

            [[overrides]]
            brand = "니브"
            discount = 95
            sale_type = "CLEARANCE"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.timeout_secs, 5);
        assert_eq!(config.crawler.max_concurrent, 1);
        assert!(!config.rules.date_refinement);
        assert!(config.rules.promote_on_discount);
        assert!(!config.rules.negative_keywords.is_empty());
        assert_eq!(config.overrides.len(), 1);
        assert_eq!(config.overrides[0].discount, Some(95));
        assert!(config.validate().is_ok());
    }
}
