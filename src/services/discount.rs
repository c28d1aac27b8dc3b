//! Discount extraction.
//!
//! Campaign pages repeat their headline discount in several textual forms
//! and product cards show price pairs. Both are collected as candidates
//! and the largest plausible one wins. Values outside 5..=95 are noise
//! (tax rates, "100% cotton", watermarks) and never become candidates.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::DiscountConfig;
use crate::services::NormalizedText;

pub const MIN_DISCOUNT: u32 = 5;
pub const MAX_DISCOUNT: u32 = 95;

/// Element tags that carry a struck-through list price.
const ORIGINAL_TAGS: &str = "span, del, s, strike";
/// Element tags that carry the discounted price.
const SALE_TAGS: &str = "span, ins, b, strong, font, em";

const ORIGINAL_CLASS: &str = r"(?i)original|old|regular|normal|list-price|consumer";
const SALE_CLASS: &str = r"(?i)sale|discount|final|special|promo|selling";
const CARD_CLASS: &str = r"(?i)product|item|card|prd";

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Regex,
    PricePair,
}

/// A plausible discount not yet chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountCandidate {
    pub value: u32,
    pub source: CandidateSource,
}

impl DiscountCandidate {
    /// Admit a value only inside the plausible band.
    pub fn admit(value: u32, source: CandidateSource) -> Option<Self> {
        (MIN_DISCOUNT..=MAX_DISCOUNT)
            .contains(&value)
            .then_some(Self { value, source })
    }
}

/// Extracts the headline discount from a page.
#[derive(Debug, Clone)]
pub struct DiscountExtractor {
    patterns: Vec<Regex>,
    original_tags: Selector,
    sale_tags: Selector,
    original_class: Regex,
    sale_class: Regex,
    card_class: Regex,
}

impl DiscountExtractor {
    pub fn new(config: &DiscountConfig) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            original_tags: parse_selector(ORIGINAL_TAGS)?,
            sale_tags: parse_selector(SALE_TAGS)?,
            original_class: Regex::new(ORIGINAL_CLASS)?,
            sale_class: Regex::new(SALE_CLASS)?,
            card_class: Regex::new(CARD_CLASS)?,
        })
    }

    /// Largest admitted candidate, or 0.
    pub fn extract(&self, text: &NormalizedText, document: &Html) -> u8 {
        let candidates = self
            .text_candidates(text)
            .into_iter()
            .chain(self.price_pair_candidates(document));
        Self::select(candidates)
    }

    /// Pick the maximum candidate value, or 0 when there is none.
    pub fn select(candidates: impl IntoIterator<Item = DiscountCandidate>) -> u8 {
        candidates
            .into_iter()
            .map(|c| c.value)
            .max()
            .and_then(|v| u8::try_from(v).ok())
            .unwrap_or(0)
    }

    /// Candidates from the regex templates. For templates with several
    /// groups (ranges) the larger bound is taken.
    ///
    /// The search resumes right after the last captured number rather than
    /// after the whole match, so a leading separator consumed by one match
    /// stays available to the next (`10%20%` yields both values).
    pub fn text_candidates(&self, text: &NormalizedText) -> Vec<DiscountCandidate> {
        let haystack = text.as_str();
        let mut candidates = Vec::new();
        for pattern in &self.patterns {
            let mut start = 0;
            while let Some(caps) = pattern.captures_at(haystack, start) {
                let Some(whole) = caps.get(0) else { break };
                let groups: Vec<_> = caps.iter().skip(1).flatten().collect();
                let value = groups
                    .iter()
                    .filter_map(|m| m.as_str().parse::<u32>().ok())
                    .max();
                if let Some(candidate) =
                    value.and_then(|v| DiscountCandidate::admit(v, CandidateSource::Regex))
                {
                    candidates.push(candidate);
                }

                let group_end = groups.iter().map(|m| m.end()).max().unwrap_or(whole.end());
                start = if group_end > whole.start() {
                    group_end
                } else if whole.end() > whole.start() {
                    whole.end()
                } else {
                    match haystack[whole.start()..].chars().next() {
                        Some(c) => whole.start() + c.len_utf8(),
                        None => break,
                    }
                };
            }
        }
        candidates
    }

    /// Candidates computed from original/sale price pairs.
    pub fn price_pair_candidates(&self, document: &Html) -> Vec<DiscountCandidate> {
        let mut candidates = Vec::new();

        for original_el in document.select(&self.original_tags) {
            if !has_class(&original_el, &self.original_class) {
                continue;
            }
            let Some(sale_el) = self.find_sale_price(&original_el) else {
                continue;
            };
            let (Some(original), Some(sale)) = (price_value(&original_el), price_value(&sale_el))
            else {
                continue;
            };
            if let Some(candidate) = price_delta(original, sale)
                .and_then(|v| DiscountCandidate::admit(v, CandidateSource::PricePair))
            {
                candidates.push(candidate);
            }
        }

        candidates
    }

    /// Look for the sale price next to the original price, then anywhere in
    /// the enclosing product card.
    fn find_sale_price<'a>(&self, original_el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        let parent = original_el.parent().and_then(ElementRef::wrap)?;
        if let Some(found) = self.sale_price_within(&parent, original_el) {
            return Some(found);
        }

        let card = parent
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| has_class(el, &self.card_class))?;
        self.sale_price_within(&card, original_el)
    }

    fn sale_price_within<'a>(
        &self,
        scope: &ElementRef<'a>,
        original_el: &ElementRef<'a>,
    ) -> Option<ElementRef<'a>> {
        scope.select(&self.sale_tags).find(|el| {
            el.id() != original_el.id()
                && has_class(el, &self.sale_class)
                && !has_class(el, &self.original_class)
        })
    }
}

/// `round((1 - sale/original) * 100)` when the pair describes a reduction.
fn price_delta(original: u64, sale: u64) -> Option<u32> {
    if original == 0 || sale >= original {
        return None;
    }
    let ratio = 1.0 - (sale as f64 / original as f64);
    Some((ratio * 100.0).round() as u32)
}

/// Digits of a price element; percentage badges are not prices.
fn price_value(el: &ElementRef<'_>) -> Option<u64> {
    let text: String = el.text().collect();
    if text.contains('%') {
        return None;
    }
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn has_class(el: &ElementRef<'_>, pattern: &Regex) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|class| pattern.is_match(class))
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
