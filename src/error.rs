//! Error type shared by the search, summarize and export actions.

use std::fmt;
use thiserror::Error;

/// Upstream collaborator an error originated from.
///
/// The display name is what ends up in the user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Naver,
    NewsApi,
    Completion,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Naver => "Naver News",
            Service::NewsApi => "NewsAPI",
            Service::Completion => "language model",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {message}")]
    Status {
        service: Service,
        status: String,
        message: String,
    },

    #[error("{service} response could not be decoded: {detail}")]
    Decode { service: Service, detail: String },

    #[error("{service} credentials are not configured ({hint})")]
    MissingCredentials { service: Service, hint: &'static str },

    #[error("language model returned no completion text")]
    EmptyCompletion,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no search result in this session; run a search first")]
    NoSearchResult,

    #[error("no summary in this session; run summarization first")]
    NoSummary,

    #[error("PDF export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DigestError {
    /// The upstream service this error is attributed to, if any.
    pub fn service(&self) -> Option<Service> {
        match self {
            DigestError::Transport { service, .. }
            | DigestError::Status { service, .. }
            | DigestError::Decode { service, .. }
            | DigestError::MissingCredentials { service, .. } => Some(*service),
            DigestError::EmptyCompletion => Some(Service::Completion),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
