//! Pipeline entry points for scanner operations.
//!
//! - `run_scan`: Evaluate every brand in the sheet and write the snapshot
//! - `run_validate`: Check configuration, patterns and a local sheet

pub mod scan;
pub mod validate;

pub use scan::{build_report, run_scan, scan_brands};
pub use validate::{ValidationSummary, run_validate};
