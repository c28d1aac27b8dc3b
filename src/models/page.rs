//! Fetched pages.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};

/// Raw reply of the fetch collaborator.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Accept a 2xx reply as a page snapshot; anything else is a fetch error.
    pub fn into_snapshot(self) -> Result<PageSnapshot> {
        if !self.is_success() {
            return Err(AppError::fetch(
                self.url,
                format!("unexpected HTTP status {}", self.status),
            ));
        }
        Ok(PageSnapshot {
            url: self.url,
            raw_html: self.body,
            fetched_at: Utc::now(),
        })
    }
}

/// HTML of one page, owned by a single evaluation.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    pub raw_html: String,
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(status: u16) -> FetchedPage {
        FetchedPage {
            url: "https://brand.example.com/".to_string(),
            status,
            body: "<html></html>".to_string(),
            headers: HashMap::new(),
        }
    }

    #[test]
    fn test_success_becomes_snapshot() {
        let snapshot = page(200).into_snapshot().unwrap();
        assert_eq!(snapshot.url, "https://brand.example.com/");
        assert_eq!(snapshot.raw_html, "<html></html>");
    }

    #[test]
    fn test_non_2xx_is_error() {
        let err = page(503).into_snapshot().unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(page(301).into_snapshot().is_err());
    }
}
