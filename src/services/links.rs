//! Sale link scoring.
//!
//! Guesses which anchor on a brand page leads to the sale. Only links on
//! the same host are followed, and anything that smells like a login,
//! cart, social profile or editorial page is thrown out before scoring.

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::LinkConfig;
use crate::services::NormalizedText;
use crate::utils::same_host;

const KEYWORD_WEIGHT: i32 = 5;
const LISTING_BONUS: i32 = 3;
const DETAIL_PENALTY: i32 = 2;

/// An anchor that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredLink {
    pub url: String,
    pub text: String,
    pub score: i32,
}

/// Ranks anchors on a page by how likely they lead to a sale listing.
#[derive(Debug, Clone)]
pub struct SaleLinkScorer {
    anchor_selector: Selector,
    keywords: Vec<String>,
    blacklist: Vec<String>,
    listing: Option<Regex>,
    detail: Option<Regex>,
}

impl SaleLinkScorer {
    pub fn new(config: &LinkConfig) -> Result<Self> {
        Ok(Self {
            anchor_selector: Selector::parse("a[href]")
                .map_err(|e| AppError::selector("a[href]", format!("{e:?}")))?,
            keywords: config
                .keywords
                .iter()
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
            blacklist: config
                .blacklist
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            listing: union_pattern(&config.listing_patterns)?,
            detail: union_pattern(&config.detail_patterns)?,
        })
    }

    /// Best sale link on the page, if any anchor scores above zero.
    pub fn best_link(&self, document: &Html, page_url: &str) -> Option<ScoredLink> {
        let base = Url::parse(page_url).ok()?;
        let mut best: Option<ScoredLink> = None;

        for candidate in self.candidates(document, &base) {
            let better = match &best {
                None => true,
                Some(current) => {
                    candidate.score > current.score
                        || (candidate.score == current.score
                            && candidate.text.chars().count() < current.text.chars().count())
                }
            };
            if better {
                best = Some(candidate);
            }
        }

        best
    }

    /// All anchors with a positive score, in document order.
    pub fn candidates(&self, document: &Html, base: &Url) -> Vec<ScoredLink> {
        document
            .select(&self.anchor_selector)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim();
                let mut label: String = anchor.text().collect();
                if label.trim().is_empty() {
                    label = anchor
                        .value()
                        .attr("title")
                        .or_else(|| anchor.value().attr("aria-label"))
                        .unwrap_or_default()
                        .to_string();
                }
                self.score(base, href, &label)
            })
            .collect()
    }

    /// Score one anchor. `None` when it is filtered out or scores <= 0.
    pub fn score(&self, base: &Url, href: &str, label: &str) -> Option<ScoredLink> {
        if href.is_empty() || href.starts_with('#') || is_non_navigational(href) {
            return None;
        }
        let resolved = base.join(href).ok()?;
        if !matches!(resolved.scheme(), "http" | "https") || !same_host(base, &resolved) {
            return None;
        }

        let text = NormalizedText::from_text(label);
        let url = resolved.to_string();
        // The host is the brand's own name; only path and query carry intent.
        let target = path_and_query(&resolved);
        if self.is_blacklisted(text.as_str(), &target) {
            return None;
        }

        let target_upper = target.to_uppercase();
        let hits = self
            .keywords
            .iter()
            .map(|kw| i32::from(text.contains(kw)) + i32::from(target_upper.contains(kw.as_str())))
            .sum::<i32>();

        let is_listing = self.listing.as_ref().is_some_and(|re| re.is_match(&url));
        let is_detail = self.detail.as_ref().is_some_and(|re| re.is_match(&url));

        let mut score = KEYWORD_WEIGHT * hits;
        if is_listing {
            score += LISTING_BONUS;
        }
        if is_detail && !is_listing {
            score -= DETAIL_PENALTY;
        }

        (score > 0).then(|| ScoredLink {
            url,
            text: text.as_str().to_string(),
            score,
        })
    }

    fn is_blacklisted(&self, text: &str, target: &str) -> bool {
        let text = text.to_lowercase();
        let target = target.to_lowercase();
        self.blacklist
            .iter()
            .any(|term| text.contains(term.as_str()) || target.contains(term.as_str()))
    }
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

fn is_non_navigational(href: &str) -> bool {
    let lower = href.to_lowercase();
    ["javascript:", "mailto:", "tel:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// One case-insensitive regex matching any of the given patterns.
fn union_pattern(patterns: &[String]) -> Result<Option<Regex>> {
    let parts: Vec<String> = patterns
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("(?:{p})"))
        .collect();
    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(Regex::new(&format!("(?i){}", parts.join("|")))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.brand.example.com/index.html";

    fn scorer() -> SaleLinkScorer {
        SaleLinkScorer::new(&LinkConfig::default()).unwrap()
    }

    fn best(html: &str) -> Option<ScoredLink> {
        scorer().best_link(&Html::parse_document(html), PAGE)
    }

    #[test]
    fn test_picks_sale_listing() {
        let html = r#"<nav>
            <a href="/about">About</a>
            <a href="/category/sale/42/">SALE</a>
            <a href="/product/new-arrivals">New</a></nav>"#;
        let link = best(html).unwrap();
        assert_eq!(link.url, "https://www.brand.example.com/category/sale/42/");
        // keyword in text + keyword in url + listing bonus
        assert_eq!(link.score, 5 * 2 + 3);
    }

    #[test]
    fn test_cross_host_links_ignored() {
        let html = r#"<a href="https://partner.example.org/sale">SALE</a>"#;
        assert!(best(html).is_none());
    }

    #[test]
    fn test_www_prefix_is_same_host() {
        let html = r#"<a href="https://brand.example.com/sale">SALE</a>"#;
        assert!(best(html).is_some());
    }

    #[test]
    fn test_blacklist_beats_keywords() {
        let html = r#"
            <a href="/member/login.html?return=/sale">Login for SALE prices</a>
            <a href="https://www.brand.example.com/lookbook/sale-2024">Sale lookbook</a>
            <a href="/cart">세일 장바구니</a>"#;
        assert!(best(html).is_none());
    }

    #[test]
    fn test_blacklist_and_keywords_ignore_host() {
        let s = scorer();
        let base = Url::parse("https://www.cartel.co.kr/").unwrap();
        let link = s.score(&base, "/event/sale", "Sale").unwrap();
        assert_eq!(link.url, "https://www.cartel.co.kr/event/sale");
        assert!(s.score(&base, "/cart", "Sale").is_none());

        let base = Url::parse("https://espresso-shop.com/").unwrap();
        assert!(s.score(&base, "/outlet", "Outlet").is_some());

        let base = Url::parse("https://salewear.example.com/").unwrap();
        assert!(s.score(&base, "/about", "About us").is_none());
    }

    #[test]
    fn test_blacklisted_link_never_wins_over_weaker_link() {
        let html = r#"
            <a href="/sale/instagram-event">SALE SALE SALE</a>
            <a href="/event/sale">Sale</a>"#;
        let link = best(html).unwrap();
        assert_eq!(link.url, "https://www.brand.example.com/event/sale");
    }

    #[test]
    fn test_detail_penalty() {
        let s = scorer();
        let base = Url::parse(PAGE).unwrap();
        let detail = s.score(&base, "/product/detail.html?product_no=9", "SALE").unwrap();
        assert_eq!(detail.score, 5 - 2);
        let listing = s.score(&base, "/product/list.html?cate_no=1", "SALE").unwrap();
        assert_eq!(listing.score, 5 + 3);
    }

    #[test]
    fn test_non_positive_scores_dropped() {
        let s = scorer();
        let base = Url::parse(PAGE).unwrap();
        assert!(s.score(&base, "/product/detail.html", "Coat").is_none());
        assert!(s.score(&base, "/about", "About us").is_none());
        assert!(s.score(&base, "javascript:void(0)", "SALE").is_none());
        assert!(s.score(&base, "#sale", "SALE").is_none());
    }

    #[test]
    fn test_listing_without_keyword_survives() {
        let base = Url::parse(PAGE).unwrap();
        let link = scorer().score(&base, "/category/new/", "New in").unwrap();
        assert_eq!(link.score, 3);
    }

    #[test]
    fn test_tie_prefers_shortest_label() {
        let html = r#"
            <a href="/event/a">Shop the big seasonal sale</a>
            <a href="/event/b">Sale</a>"#;
        let link = best(html).unwrap();
        assert_eq!(link.url, "https://www.brand.example.com/event/b");
        assert_eq!(link.text, "SALE");
    }

    #[test]
    fn test_image_anchor_uses_title() {
        let html = r#"<a href="/promo/1" title="Outlet"><img src="/b.jpg"></a>"#;
        let link = best(html).unwrap();
        assert_eq!(link.text, "OUTLET");
    }
}
