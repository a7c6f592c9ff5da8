//! Naver News search (domestic articles).
//!
//! API: `GET https://openapi.naver.com/v1/search/news.json`
//! Auth: `X-Naver-Client-Id` and `X-Naver-Client-Secret` headers.
//!
//! Only the first page is requested; coverage is capped at [`PAGE_SIZE`] items
//! ordered by relevance.

use super::{PAGE_SIZE, read_json, strip_markup};
use crate::error::{DigestError, Result, Service};
use crate::models::{Article, Origin};
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Static credentials issued for the Naver developer application.
#[derive(Debug, Clone)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NaverResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: Vec<NaverItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NaverItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    /// RFC-1123 timestamp with explicit offset, e.g. `Mon, 19 Oct 2026 09:15:00 +0900`.
    #[serde(default)]
    pub pub_date: String,
}

/// Convert one search item into an [`Article`].
///
/// Returns `None` when the publication date cannot be parsed; such records are
/// dropped rather than reported.
pub(crate) fn normalize(item: NaverItem) -> Option<Article> {
    let published_at = match DateTime::parse_from_rfc2822(item.pub_date.trim()) {
        Ok(ts) => ts,
        Err(e) => {
            debug!(link = %item.link, pub_date = %item.pub_date, error = %e, "Unparseable pubDate; dropping");
            return None;
        }
    };

    Some(Article {
        title: strip_markup(&item.title),
        description: strip_markup(&item.description),
        url: item.link,
        source_name: None,
        published_at,
        origin: Origin::Domestic,
    })
}

/// Query string for a single relevance-ordered first page.
pub fn query_params(query: &str) -> Vec<(&'static str, String)> {
    vec![
        ("query", query.to_string()),
        ("display", PAGE_SIZE.to_string()),
        ("start", "1".to_string()),
        ("sort", "sim".to_string()),
    ]
}

#[derive(Debug, Clone)]
pub struct NaverClient {
    client: reqwest::Client,
    endpoint: String,
    credentials: Option<NaverCredentials>,
}

impl NaverClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        credentials: Option<NaverCredentials>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        }
    }

    /// Fetch the raw item list for `query`. Items with an empty link are
    /// discarded here since they carry no identity.
    #[instrument(level = "info", skip_all, fields(%query))]
    pub(crate) async fn search(&self, query: &str) -> Result<Vec<NaverItem>> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(DigestError::MissingCredentials {
                service: Service::Naver,
                hint: "set NAVER_CLIENT_ID and NAVER_CLIENT_SECRET",
            })?;

        let response = self
            .client
            .get(&self.endpoint)
            .header("X-Naver-Client-Id", &credentials.client_id)
            .header("X-Naver-Client-Secret", &credentials.client_secret)
            .query(&query_params(query))
            .send()
            .await
            .map_err(|source| DigestError::Transport {
                service: Service::Naver,
                source,
            })?;

        let payload: NaverResponse = read_json(Service::Naver, response).await?;
        let received = payload.items.len();
        let items: Vec<NaverItem> = payload
            .items
            .into_iter()
            .filter(|item| !item.link.trim().is_empty())
            .collect();
        if items.len() < received {
            warn!(dropped = received - items.len(), "Dropped Naver items without a link");
        }

        info!(received, total = payload.total, "Fetched Naver news items");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use mockito::Matcher;

    fn item(title: &str, link: &str, pub_date: &str) -> NaverItem {
        NaverItem {
            title: title.to_string(),
            link: link.to_string(),
            description: "<b>AI</b> | policy brief".to_string(),
            pub_date: pub_date.to_string(),
        }
    }

    #[test]
    fn test_normalize_maps_fields_and_strips_markup() {
        let article = normalize(item(
            "<b>AI</b> 반도체 수출 증가",
            "https://n.news.naver.com/article/001/1",
            "Mon, 19 Oct 2026 09:15:00 +0900",
        ))
        .unwrap();

        assert_eq!(article.title, "AI 반도체 수출 증가");
        assert_eq!(article.description, "AI | policy brief");
        assert_eq!(article.url, "https://n.news.naver.com/article/001/1");
        assert_eq!(article.origin, Origin::Domestic);
        assert_eq!(article.source_name, None);
        assert_eq!(
            article.published_at,
            FixedOffset::east_opt(9 * 3600)
                .unwrap()
                .with_ymd_and_hms(2026, 10, 19, 9, 15, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_normalize_drops_unparseable_date() {
        assert!(normalize(item("t", "https://n.example/1", "yesterday-ish")).is_none());
        assert!(normalize(item("t", "https://n.example/1", "")).is_none());
    }

    #[test]
    fn test_query_params_fixed_page() {
        let params = query_params("AI");
        assert_eq!(
            params,
            vec![
                ("query", "AI".to_string()),
                ("display", "100".to_string()),
                ("start", "1".to_string()),
                ("sort", "sim".to_string()),
            ]
        );
    }

    fn credentials() -> Option<NaverCredentials> {
        Some(NaverCredentials {
            client_id: "id-123".to_string(),
            client_secret: "secret-456".to_string(),
        })
    }

    #[tokio::test]
    async fn test_search_sends_credentials_and_fixed_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/search/news.json")
            .match_header("X-Naver-Client-Id", "id-123")
            .match_header("X-Naver-Client-Secret", "secret-456")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "AI".into()),
                Matcher::UrlEncoded("display".into(), "100".into()),
                Matcher::UrlEncoded("start".into(), "1".into()),
                Matcher::UrlEncoded("sort".into(), "sim".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "lastBuildDate": "Mon, 19 Oct 2026 12:00:00 +0900",
                    "total": 2,
                    "start": 1,
                    "display": 2,
                    "items": [
                        {"title": "a", "originallink": "", "link": "https://n.example/1", "description": "", "pubDate": "Mon, 19 Oct 2026 09:15:00 +0900"},
                        {"title": "b", "originallink": "", "link": "", "description": "", "pubDate": "Mon, 19 Oct 2026 09:15:00 +0900"}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let client = NaverClient::new(
            reqwest::Client::new(),
            format!("{}/v1/search/news.json", server.url()),
            credentials(),
        );
        let items = client.search("AI").await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://n.example/1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_error_status_names_service() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/search/news.json")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"errorMessage":"Authentication failed (인증에 실패했습니다.)","errorCode":"024"}"#)
            .create_async()
            .await;

        let client = NaverClient::new(
            reqwest::Client::new(),
            format!("{}/v1/search/news.json", server.url()),
            credentials(),
        );
        let err = client.search("AI").await.unwrap_err();

        assert_eq!(err.service(), Some(Service::Naver));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[tokio::test]
    async fn test_search_without_credentials() {
        let client = NaverClient::new(reqwest::Client::new(), "http://127.0.0.1:9", None);
        let err = client.search("AI").await.unwrap_err();
        assert!(matches!(
            err,
            DigestError::MissingCredentials {
                service: Service::Naver,
                ..
            }
        ));
    }
}
