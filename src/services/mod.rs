//! Service layer for the scanner.
//!
//! This module contains the business logic for:
//! - Text normalization (`NormalizedText`)
//! - Keyword classification and categorization (`KeywordClassifier`, `SaleTypeCategorizer`)
//! - Discount, banner and sale-link extraction
//! - Date-range refinement (`DateRangeRefiner`)
//! - Manual overrides (`OverrideResolver`)
//! - Per-brand orchestration (`BrandEvaluator`)
//! - Brand and editorial sheets (`sheet`)

mod banner;
mod classifier;
mod dates;
mod discount;
mod evaluator;
mod links;
mod normalizer;
mod overrides;
pub mod sheet;

pub use banner::BannerLocator;
pub use classifier::{Classification, KeywordClassifier, SaleTypeCategorizer};
pub use dates::{DateInterval, DateRangeRefiner};
pub use discount::{
    CandidateSource, DiscountCandidate, DiscountExtractor, MAX_DISCOUNT, MIN_DISCOUNT,
};
pub use evaluator::BrandEvaluator;
pub use links::{SaleLinkScorer, ScoredLink};
pub use normalizer::NormalizedText;
pub use overrides::{OverrideResolver, Overrides};
