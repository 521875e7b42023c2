//! Core data models used throughout Breed Scout.
//!
//! These types represent the breed documents that flow from the scraper
//! into the JSON store and out of the retriever, plus the report a scrape
//! run produces.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Minimum body length, in characters, for a page to be persisted.
/// Pages at or below this length are skipped.
pub const MIN_CONTENT_CHARS: usize = 100;

/// One breed page, normalized for storage and retrieval.
///
/// Serialized field order matches the on-disk JSON shape:
/// `{ "title", "content", "url", "source" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedDocument {
    #[serde(default = "default_title")]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_title() -> String {
    "Unknown".to_string()
}

fn default_source() -> String {
    "Scraped".to_string()
}

impl BreedDocument {
    /// Whether the body passes the write-time length threshold.
    pub fn has_sufficient_content(&self) -> bool {
        content_chars(&self.content) > MIN_CONTENT_CHARS
    }
}

/// Length of a body in Unicode scalar values, ignoring surrounding whitespace.
pub fn content_chars(content: &str) -> usize {
    content.trim().chars().count()
}

/// Why a breed page was not turned into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The page could not be fetched (network error or non-success status).
    Fetch(String),
    /// No heading could be found by any title strategy.
    NoTitle,
    /// The best body text was too short.
    InsufficientContent { chars: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Fetch(e) => write!(f, "fetch failed: {}", e),
            SkipReason::NoTitle => write!(f, "no heading found"),
            SkipReason::InsufficientContent { chars } => write!(
                f,
                "insufficient content ({} chars, need > {})",
                chars, MIN_CONTENT_CHARS
            ),
        }
    }
}

/// A page that was visited but rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    pub url: String,
    pub reason: SkipReason,
}

/// Outcome of one scrape run.
///
/// `found == visited + truncated` and `visited == accepted + skipped.len()`.
#[derive(Debug, Clone, Default)]
pub struct ScrapeReport {
    pub listing_url: String,
    /// Unique breed links discovered on the listing page.
    pub found: usize,
    /// Links actually fetched after applying the breed cap.
    pub visited: usize,
    pub accepted: usize,
    pub skipped: Vec<SkippedPage>,
    /// Links dropped because of the breed cap.
    pub truncated: usize,
    /// Where documents were written; `None` when nothing was written.
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strictly_greater() {
        let mut doc = BreedDocument {
            title: "Pug".to_string(),
            content: "a".repeat(MIN_CONTENT_CHARS),
            url: String::new(),
            source: "test".to_string(),
        };
        assert!(!doc.has_sufficient_content());
        doc.content.push('a');
        assert!(doc.has_sufficient_content());
    }

    #[test]
    fn threshold_counts_chars_not_bytes() {
        // 60 two-byte chars: 120 bytes but only 60 chars.
        let content = "é".repeat(60);
        assert_eq!(content_chars(&content), 60);
    }

    #[test]
    fn deserialize_fills_missing_fields() {
        let doc: BreedDocument = serde_json::from_str(r#"{"content": "short"}"#).unwrap();
        assert_eq!(doc.title, "Unknown");
        assert_eq!(doc.url, "");
        assert_eq!(doc.source, "Scraped");
        assert_eq!(doc.content, "short");
    }

    #[test]
    fn deserialize_requires_content() {
        let res: Result<BreedDocument, _> = serde_json::from_str(r#"{"title": "Pug"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::NoTitle.to_string(), "no heading found");
        assert_eq!(
            SkipReason::InsufficientContent { chars: 50 }.to_string(),
            "insufficient content (50 chars, need > 100)"
        );
        assert_eq!(
            SkipReason::Fetch("HTTP 404".to_string()).to_string(),
            "fetch failed: HTTP 404"
        );
    }
}
