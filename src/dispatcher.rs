//! Query dispatch: one search turns into two independent upstream requests.
//!
//! The domestic and international calls run one after the other. A failure on
//! either side becomes an error [`Notice`] and an empty article list for that
//! side; the other side's articles are still returned.

use crate::error::Result;
use crate::models::{Article, SearchParams, SearchResult};
use crate::pipeline::{dedup_articles, dedup_by_key, filter_recent};
use crate::session::Notice;
use crate::sources::naver::{self, NaverClient};
use crate::sources::newsapi::{EverythingRequest, NewsApiClient};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{error, info, instrument, warn};

/// Days covered by the international date range.
pub const INTERNATIONAL_WINDOW_DAYS: i64 = 1;

/// Combined counts outside this range produce an accuracy warning.
pub const COMFORTABLE_ARTICLE_RANGE: std::ops::RangeInclusive<u64> = 30..=500;

/// A search result together with the notices the search produced.
#[derive(Debug)]
pub struct SearchOutcome {
    pub result: SearchResult,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    naver: NaverClient,
    newsapi: NewsApiClient,
}

impl Dispatcher {
    pub fn new(naver: NaverClient, newsapi: NewsApiClient) -> Self {
        Self { naver, newsapi }
    }

    /// Run both searches for `params` as of `now`.
    #[instrument(level = "info", skip_all, fields(domestic = %params.domestic_query, international = %params.international_query))]
    pub async fn dispatch(&self, params: SearchParams, now: DateTime<Utc>) -> SearchOutcome {
        let mut notices = Vec::new();

        if params.days != INTERNATIONAL_WINDOW_DAYS as u32 {
            info!(
                requested = params.days,
                applied = INTERNATIONAL_WINDOW_DAYS,
                "Time span is fixed; ignoring requested days"
            );
        }
        if params.major_outlets_only {
            notices.push(Notice::warning(
                "The major-outlets-only option is not active yet; results include all outlets.",
            ));
        }

        let domestic = if params.domestic_query.trim().is_empty() {
            notices.push(Notice::warning("Domestic keyword is empty; skipped Naver News search."));
            None
        } else {
            match self.fetch_domestic(&params.domestic_query, now).await {
                Ok(articles) => Some(articles),
                Err(e) => {
                    error!(service = ?e.service(), error = %e, "Domestic search failed");
                    notices.push(Notice::error(e.to_string()));
                    None
                }
            }
        };

        let international = if params.international_query.trim().is_empty() {
            notices.push(Notice::warning("International keyword is empty; skipped NewsAPI search."));
            None
        } else {
            match self.fetch_international(&params, now).await {
                Ok(page) => Some(page),
                Err(e) => {
                    error!(service = ?e.service(), error = %e, "International search failed");
                    notices.push(Notice::error(e.to_string()));
                    None
                }
            }
        };

        if domestic.is_some() || international.is_some() {
            let domestic_count = domestic.as_ref().map_or(0, Vec::len);
            let international_total = international.as_ref().map_or(0, |(_, total)| *total);
            notices.push(Notice::success(format!(
                "Found {} domestic and {} international articles.",
                domestic_count, international_total
            )));

            let combined = domestic_count as u64 + u64::from(international_total);
            if !COMFORTABLE_ARTICLE_RANGE.contains(&combined) {
                notices.push(Notice::warning(
                    "Very few or very many articles can make the summary inaccurate. \
                     Select only key articles or adjust the search terms.",
                ));
            }
        }

        let (international, international_total) = international.unwrap_or_default();
        SearchOutcome {
            result: SearchResult {
                params,
                domestic: domestic.unwrap_or_default(),
                international,
                international_total,
                fetched_at: now,
            },
            notices,
        }
    }

    /// Domestic pipeline: dedup on link, normalize, then keep the last 24 hours.
    async fn fetch_domestic(&self, query: &str, now: DateTime<Utc>) -> Result<Vec<Article>> {
        let items = self.naver.search(query).await?;
        let received = items.len();
        let unique = dedup_by_key(items, |item| item.link.clone());
        let duplicates = received - unique.len();

        let report = filter_recent(unique.into_iter().map(naver::normalize), now);
        if report.dropped_unparsed > 0 {
            warn!(count = report.dropped_unparsed, "Skipped domestic items with unparseable pubDate");
        }
        info!(
            received,
            duplicates,
            stale = report.dropped_stale,
            kept = report.kept.len(),
            "Domestic articles ready"
        );
        Ok(report.kept)
    }

    /// International pipeline: one-day range request, then dedup on url.
    async fn fetch_international(
        &self,
        params: &SearchParams,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Article>, u32)> {
        let from = (now - TimeDelta::days(INTERNATIONAL_WINDOW_DAYS)).date_naive();
        let mut request = EverythingRequest::new(params.international_query.clone(), from, now.date_naive());
        request.title_only = params.title_only;
        request.language = params.language.clone();

        let page = self.newsapi.everything(&request).await?;
        let received = page.articles.len();
        let articles = dedup_articles(page.articles);
        info!(
            received,
            kept = articles.len(),
            total_results = page.total_results,
            "International articles ready"
        );
        Ok((articles, page.total_results))
    }
}
