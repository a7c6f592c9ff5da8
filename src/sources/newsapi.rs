//! NewsAPI `everything` search (international articles).
//!
//! API: `GET https://newsapi.org/v2/everything`
//! Auth: API key via the `X-Api-Key` header.
//!
//! Freshness is bounded by the explicit `from`/`to` date range rather than by
//! the domestic recency window.

use super::{PAGE_SIZE, read_json};
use crate::error::{DigestError, Result, Service};
use crate::models::{Article, LanguageCode, Origin};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EverythingResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewsApiArticle {
    #[serde(default)]
    pub source: Option<NewsApiSource>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// ISO-8601 timestamp, e.g. `2026-10-19T08:00:00Z`.
    #[serde(default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NewsApiSource {
    #[serde(default)]
    pub name: Option<String>,
}

/// Convert one `everything` record into an [`Article`].
///
/// Records without a url or with an unparseable `publishedAt` are dropped.
pub(crate) fn normalize(record: NewsApiArticle) -> Option<Article> {
    let url = record.url.filter(|u| !u.trim().is_empty())?;

    let raw_ts = record.published_at.unwrap_or_default();
    let published_at = match DateTime::parse_from_rfc3339(raw_ts.trim()) {
        Ok(ts) => ts,
        Err(e) => {
            debug!(%url, published_at = %raw_ts, error = %e, "Unparseable publishedAt; dropping");
            return None;
        }
    };

    Some(Article {
        title: record.title.unwrap_or_default(),
        description: record.description.unwrap_or_default(),
        url,
        source_name: record.source.and_then(|s| s.name),
        published_at,
        origin: Origin::International,
    })
}

/// Parameters of one `everything` request.
#[derive(Debug, Clone, PartialEq)]
pub struct EverythingRequest {
    pub query: String,
    /// Match against titles only (`qInTitle`) instead of full text (`q`).
    pub title_only: bool,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub page_size: u32,
    pub language: Option<LanguageCode>,
}

impl EverythingRequest {
    pub fn new(query: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            query: query.into(),
            title_only: false,
            from,
            to,
            page_size: PAGE_SIZE,
            language: None,
        }
    }

    /// Query string for this request. The language parameter is omitted
    /// entirely when no filter is set.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let query_key = if self.title_only { "qInTitle" } else { "q" };
        let mut params = vec![
            (query_key, self.query.clone()),
            ("from", self.from.format("%Y-%m-%d").to_string()),
            ("to", self.to.format("%Y-%m-%d").to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(language) = &self.language {
            params.push(("language", language.as_str().to_string()));
        }
        params
    }
}

/// Articles from one `everything` call after normalization.
#[derive(Debug)]
pub struct EverythingPage {
    pub articles: Vec<Article>,
    pub total_results: u32,
}

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl NewsApiClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    #[instrument(level = "info", skip_all, fields(query = %request.query, title_only = request.title_only))]
    pub async fn everything(&self, request: &EverythingRequest) -> Result<EverythingPage> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(DigestError::MissingCredentials {
                service: Service::NewsApi,
                hint: "set NEWSAPI_KEY",
            })?;

        let response = self
            .client
            .get(&self.endpoint)
            .header("X-Api-Key", api_key)
            .query(&request.query_params())
            .send()
            .await
            .map_err(|source| DigestError::Transport {
                service: Service::NewsApi,
                source,
            })?;

        let payload: EverythingResponse = read_json(Service::NewsApi, response).await?;
        if payload.status != "ok" {
            return Err(DigestError::Status {
                service: Service::NewsApi,
                status: payload.code.unwrap_or(payload.status),
                message: payload.message.unwrap_or_default(),
            });
        }

        let received = payload.articles.len();
        let articles: Vec<Article> = payload.articles.into_iter().filter_map(normalize).collect();
        if articles.len() < received {
            warn!(dropped = received - articles.len(), "Dropped NewsAPI records without url or timestamp");
        }

        info!(
            received,
            total_results = payload.total_results,
            "Fetched NewsAPI articles"
        );
        Ok(EverythingPage {
            articles,
            total_results: payload.total_results,
        })
    }
}
