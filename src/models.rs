//! Data models for normalized articles and the per-session search state.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: one news item in the unified shape every downstream step reads
//! - [`SearchParams`]: the user-supplied search controls
//! - [`SearchResult`]: the two article collections produced by one search
//! - [`Summary`]: the language model's grouped write-up of a search result
//!
//! Upstream payload shapes never appear here; they live next to their client in
//! [`crate::sources`] and are converted into [`Article`] immediately.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Which upstream search service an [`Article`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Domestic,
    International,
}

/// A news article after normalization.
///
/// Articles are built once per upstream record and only ever filtered in or
/// out of a working set afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Headline with any markup already removed.
    pub title: String,
    /// Teaser text; empty when the upstream record had none.
    pub description: String,
    /// Canonical link, used as the deduplication key.
    pub url: String,
    /// Publisher name, when the upstream service reports one.
    pub source_name: Option<String>,
    /// Publication instant in the offset the upstream service reported.
    pub published_at: DateTime<FixedOffset>,
    pub origin: Origin,
}

impl Article {
    /// Publication instant normalized to UTC, the only form used for comparisons.
    pub fn published_utc(&self) -> DateTime<Utc> {
        self.published_at.with_timezone(&Utc)
    }
}

/// A two-letter language code accepted by the international search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// ISO-639-1 codes the international service filters on.
    pub const SUPPORTED: [&'static str; 14] = [
        "ar", "de", "en", "es", "fr", "he", "it", "nl", "no", "pt", "ru", "sv", "ud", "zh",
    ];

    pub fn parse(code: &str) -> Result<Self, String> {
        let code = code.trim().to_ascii_lowercase();
        if Self::SUPPORTED.contains(&code.as_str()) {
            Ok(Self(code))
        } else {
            Err(format!(
                "unsupported language code `{}` (expected one of: {})",
                code,
                Self::SUPPORTED.join(", ")
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

/// Search controls as supplied by the user for one search invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub domestic_query: String,
    pub international_query: String,
    /// Requested time span in days. The international window is currently
    /// always one day regardless of this value.
    pub days: u32,
    /// Restrict the international query to article titles.
    pub title_only: bool,
    /// Accepted but not yet active; no outlet filtering is applied.
    pub major_outlets_only: bool,
    /// Single-language filter for the international query.
    pub language: Option<LanguageCode>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            domestic_query: "AI".to_string(),
            international_query: "AI".to_string(),
            days: 1,
            title_only: false,
            major_outlets_only: false,
            language: None,
        }
    }
}

/// The articles produced by one search, replaced wholesale by the next one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub params: SearchParams,
    /// Deduplicated domestic articles from the trailing 24 hours.
    pub domestic: Vec<Article>,
    /// Deduplicated international articles from the query's date range.
    pub international: Vec<Article>,
    /// Total match count reported by the international service, which may
    /// exceed the number of articles actually returned.
    pub international_total: u32,
    pub fetched_at: DateTime<Utc>,
}

impl SearchResult {
    /// International articles first, then domestic, which is the order the
    /// summarization manifest numbers them in.
    pub fn combined(&self) -> impl Iterator<Item = &Article> {
        self.international.iter().chain(self.domestic.iter())
    }

    pub fn article_count(&self) -> usize {
        self.domestic.len() + self.international.len()
    }
}

/// A generated summary of the current [`SearchResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Markdown text as returned by the language model.
    pub text: String,
    /// Model identifier that produced the text.
    pub model: String,
    /// Number of articles listed in the manifest sent to the model.
    pub article_count: usize,
    pub created_at: DateTime<Utc>,
}
