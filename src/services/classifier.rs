//! Keyword classification and sale-type categorization.

use std::collections::BTreeSet;

use crate::models::{CategoryRule, RulesConfig, SaleStatus, SaleType};
use crate::services::NormalizedText;

/// Outcome of the keyword pass over one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: SaleStatus,
    /// First positive keyword found, in configured order
    pub matched_keyword: Option<String>,
    /// First negative keyword found
    pub negative_keyword: Option<String>,
}

impl Classification {
    /// No positive and no negative signal on the page.
    pub fn is_silent(&self) -> bool {
        self.matched_keyword.is_none() && self.negative_keyword.is_none()
    }
}

/// Decides sale/nosale from positive and negative keyword presence.
///
/// Negative keywords always win: a page that says both "SALE" and
/// "SOLD OUT" is not on sale.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            positive: upper_all(&rules.positive_keywords),
            negative: upper_all(&rules.negative_keywords),
        }
    }

    /// Classify a page. `extra` holds the brand's own positive keywords,
    /// checked after the global ones.
    pub fn classify(&self, text: &NormalizedText, extra: &BTreeSet<String>) -> Classification {
        let matched_keyword = self
            .positive
            .iter()
            .chain(extra.iter())
            .find(|kw| text.contains(kw))
            .cloned();
        let negative_keyword = self.negative.iter().find(|kw| text.contains(kw)).cloned();

        let status = if matched_keyword.is_some() && negative_keyword.is_none() {
            SaleStatus::Sale
        } else {
            SaleStatus::NoSale
        };

        Classification {
            status,
            matched_keyword,
            negative_keyword,
        }
    }
}

/// Maps page text to a campaign category by priority order.
#[derive(Debug, Clone)]
pub struct SaleTypeCategorizer {
    rules: Vec<(SaleType, Vec<String>)>,
}

impl SaleTypeCategorizer {
    pub fn new(rules: &[CategoryRule]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|r| (r.category, upper_all(&r.keywords)))
                .collect(),
        }
    }

    /// First category with a keyword on the page; `SALE` otherwise.
    pub fn categorize(&self, text: &NormalizedText) -> SaleType {
        self.rules
            .iter()
            .filter(|(category, _)| *category != SaleType::Sale)
            .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
            .map(|(category, _)| *category)
            .unwrap_or(SaleType::Sale)
    }
}

fn upper_all(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_uppercase())
        .filter(|k| !k.is_empty())
        .collect()
}
