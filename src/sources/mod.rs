//! Upstream news search services.
//!
//! Each submodule owns one service: its request parameters, its payload shapes
//! and the normalizer that turns a payload record into an [`Article`].
//! Payload types stay private to their module.
//!
//! | Service | Module | Origin | Notes |
//! |---------|--------|--------|-------|
//! | Naver News search | [`naver`] | domestic | 100 items, relevance order, first page only |
//! | NewsAPI `/v2/everything` | [`newsapi`] | international | one-day range, optional title-only and language filter |
//!
//! [`Article`]: crate::models::Article

pub mod naver;
pub mod newsapi;

use crate::error::{DigestError, Result, Service};
use crate::utils::truncate_for_log;
use scraper::Html;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Page size requested from both services.
pub const PAGE_SIZE: u32 = 100;

/// Remove inline HTML markup and decode entities.
///
/// Search services highlight the matched keyword with `<b>` tags and escape
/// quotes as entities; neither belongs in a title shown to a reader or a model.
pub fn strip_markup(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.trim().to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

/// Decode a JSON body, turning a non-success status into [`DigestError::Status`].
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: Service,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| DigestError::Transport { service, source })?;

    if !status.is_success() {
        let message = upstream_message(&body);
        warn!(%service, %status, body = %truncate_for_log(&body, 300), "Upstream returned an error status");
        return Err(DigestError::Status {
            service,
            status: status.to_string(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| DigestError::Decode {
        service,
        detail: e.to_string(),
    })
}

/// Best-effort extraction of the human-readable error from an error payload.
fn upstream_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["errorMessage", "message"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()))
                .or_else(|| v.pointer("/error/message").and_then(|m| m.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| truncate_for_log(body.trim(), 200))
}
