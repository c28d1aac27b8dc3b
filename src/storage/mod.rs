//! Storage abstractions for the sale snapshot.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml      # Scanner configuration
//! ├── brands.csv       # Brand sheet (when not fetched over HTTP)
//! └── sales.json       # Latest snapshot, replaced atomically per run
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::ScanReport;

pub use local::LocalStorage;

/// Metadata about a snapshot write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Records written to `sales`
    pub sale_count: usize,
    /// Editorial rows passed through
    pub editorial_count: usize,
    /// Size of the serialized snapshot
    pub bytes: usize,
    pub timestamp: DateTime<Utc>,
}

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Replace the snapshot at `key` with `report`.
    async fn write_report(&self, key: &str, report: &ScanReport) -> Result<WriteMetadata>;

    /// Load the snapshot at `key`, if one was written before.
    async fn load_report(&self, key: &str) -> Result<Option<ScanReport>>;
}
