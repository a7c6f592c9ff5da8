//! Deduplication and the domestic recency window.
//!
//! Both steps are stable filters: retained items keep their input order and
//! nothing is re-sorted.

use crate::models::Article;
use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;
use std::hash::Hash;
use tracing::debug;

/// Length of the trailing window domestic articles must fall in.
pub const RECENCY_WINDOW_HOURS: i64 = 24;

/// Keep the first item for every key, dropping later repeats.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let before = items.len();
    let kept: Vec<T> = items.into_iter().unique_by(key).collect();
    debug!(before, after = kept.len(), "Deduplicated");
    kept
}

/// Deduplicate articles on their canonical link.
pub fn dedup_articles(articles: Vec<Article>) -> Vec<Article> {
    dedup_by_key(articles, |a| a.url.clone())
}

/// Whether `published_at` lies inside the trailing window ending at `now`.
///
/// The bound is inclusive: an item exactly 24 hours old is still recent.
pub fn is_recent(published_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(published_at) <= TimeDelta::hours(RECENCY_WINDOW_HOURS)
}

/// Outcome of the recency filter, with the drop counts kept for logging.
#[derive(Debug, Default)]
pub struct RecencyReport {
    pub kept: Vec<Article>,
    /// Records whose timestamp could not be parsed.
    pub dropped_unparsed: usize,
    /// Records older than the window.
    pub dropped_stale: usize,
}

/// Apply the recency window to normalized domestic records.
///
/// `None` entries stand for records whose timestamp failed to parse; they are
/// counted and excluded, never reported as errors.
pub fn filter_recent<I>(records: I, now: DateTime<Utc>) -> RecencyReport
where
    I: IntoIterator<Item = Option<Article>>,
{
    let mut report = RecencyReport::default();
    for record in records {
        match record {
            Some(article) if is_recent(article.published_utc(), now) => report.kept.push(article),
            Some(_) => report.dropped_stale += 1,
            None => report.dropped_unparsed += 1,
        }
    }
    debug!(
        kept = report.kept.len(),
        dropped_unparsed = report.dropped_unparsed,
        dropped_stale = report.dropped_stale,
        "Applied recency window"
    );
    report
}
