//! Promotional banner selection.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::BannerConfig;
use crate::utils::resolve_url;

const SOCIAL_IMAGE_META: [&str; 3] = [
    r#"meta[property="og:image"]"#,
    r#"meta[name="og:image"]"#,
    r#"meta[name="twitter:image"]"#,
];

/// Finds the image that best represents a brand's current campaign.
///
/// The cascade is an ordered list of strategies; the first one that yields
/// a URL wins and an empty string means nothing qualified.
#[derive(Debug, Clone)]
pub struct BannerLocator {
    meta_selectors: Vec<Selector>,
    img_selector: Selector,
    banner_class: Option<Regex>,
    exclude_terms: Vec<String>,
}

type Strategy = fn(&BannerLocator, &Html, &Url) -> Option<String>;

impl BannerLocator {
    const STRATEGIES: [Strategy; 3] = [
        BannerLocator::social_preview,
        BannerLocator::banner_class_image,
        BannerLocator::first_plain_image,
    ];

    pub fn new(config: &BannerConfig) -> Result<Self> {
        let meta_selectors = SOCIAL_IMAGE_META
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;

        let alternatives: Vec<String> = config
            .class_patterns
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| regex::escape(p.trim()))
            .collect();
        let banner_class = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("(?i){}", alternatives.join("|")))?)
        };

        Ok(Self {
            meta_selectors,
            img_selector: parse_selector("img")?,
            banner_class,
            exclude_terms: config
                .exclude_terms
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
        })
    }

    /// Banner URL for a page, or an empty string.
    pub fn locate(&self, document: &Html, page_url: &str) -> String {
        let Ok(base) = Url::parse(page_url) else {
            return String::new();
        };
        Self::STRATEGIES
            .iter()
            .find_map(|strategy| strategy(self, document, &base))
            .unwrap_or_default()
    }

    fn social_preview(&self, document: &Html, base: &Url) -> Option<String> {
        self.meta_selectors.iter().find_map(|selector| {
            document
                .select(selector)
                .filter_map(|meta| meta.value().attr("content"))
                .map(str::trim)
                .find(|content| !content.is_empty())
                .map(|content| resolve_url(base, content))
        })
    }

    fn banner_class_image(&self, document: &Html, base: &Url) -> Option<String> {
        let pattern = self.banner_class.as_ref()?;
        document
            .select(&self.img_selector)
            .filter(|img| {
                img.value()
                    .attr("class")
                    .is_some_and(|class| pattern.is_match(class))
            })
            .find_map(|img| image_source(&img))
            .map(|src| resolve_url(base, src))
    }

    fn first_plain_image(&self, document: &Html, base: &Url) -> Option<String> {
        document
            .select(&self.img_selector)
            .filter_map(|img| image_source(&img))
            .find(|src| self.is_plain_image(src))
            .map(|src| resolve_url(base, src))
    }

    /// Not a logo, not an icon, not a vector.
    fn is_plain_image(&self, src: &str) -> bool {
        let lower = src.to_lowercase();
        if self.exclude_terms.iter().any(|t| lower.contains(t.as_str())) {
            return false;
        }
        let path = lower.split(['?', '#']).next().unwrap_or_default();
        !path.ends_with(".svg") && !lower.starts_with("data:image/svg")
    }
}

fn image_source<'a>(img: &ElementRef<'a>) -> Option<&'a str> {
    ["src", "data-src"]
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .map(str::trim)
        .find(|src| !src.is_empty())
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://brand.example.com/shop/index.html";

    fn locate(html: &str) -> String {
        let locator = BannerLocator::new(&BannerConfig::default()).unwrap();
        locator.locate(&Html::parse_document(html), PAGE)
    }

    #[test]
    fn test_social_preview_first() {
        let html = r#"<head><meta property="og:image" content="/img/og.jpg"></head>
            <body><img class="main-banner" src="/img/hero.jpg"></body>"#;
        assert_eq!(locate(html), "https://brand.example.com/img/og.jpg");
    }

    #[test]
    fn test_twitter_image_counts_as_social_preview() {
        let html = r#"<head><meta name="twitter:image" content="https://cdn.example.net/t.jpg"></head>
            <body><img src="/img/a.jpg"></body>"#;
        assert_eq!(locate(html), "https://cdn.example.net/t.jpg");
    }

    #[test]
    fn test_banner_class_before_plain_image() {
        let html = r#"<body><img src="/img/first.jpg">
            <img class="slide main-visual" src="banners/winter.jpg"></body>"#;
        assert_eq!(
            locate(html),
            "https://brand.example.com/shop/banners/winter.jpg"
        );
    }

    #[test]
    fn test_plain_image_skips_logos_icons_and_vectors() {
        let html = r#"<body>
            <img src="/img/logo.png"><img src="/img/cart-icon.png">
            <img src="/img/mark.svg?v=2"><img data-src="/img/campaign.jpg"></body>"#;
        assert_eq!(locate(html), "https://brand.example.com/img/campaign.jpg");
    }

    #[test]
    fn test_nothing_qualifies_is_empty() {
        assert_eq!(locate(r#"<body><img src="/logo.png"></body>"#), "");
        assert_eq!(locate("<body><p>text only</p></body>"), "");
    }

    #[test]
    fn test_empty_og_content_falls_through() {
        let html = r#"<head><meta property="og:image" content=" "></head>
            <body><img class="hero" src="/hero.jpg"></body>"#;
        assert_eq!(locate(html), "https://brand.example.com/hero.jpg");
    }
}
