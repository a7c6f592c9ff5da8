//! Per-session state and the three user actions that act on it.
//!
//! A [`Session`] holds at most one [`SearchResult`] and one [`Summary`]. Every
//! action replaces state wholesale and reports back through [`Notice`] values;
//! upstream failures never escape as errors.

use crate::api::{AskAsync, CompletionRequest, ask_timed};
use crate::config::FontConfig;
use crate::dispatcher::Dispatcher;
use crate::error::DigestError;
use crate::models::{SearchParams, SearchResult, Summary};
use crate::outputs::pdf;
use crate::prompt::build_prompt;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A user-visible banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Success => "[ok]",
            NoticeLevel::Warning => "[warning]",
            NoticeLevel::Error => "[error]",
        };
        write!(f, "{} {}", tag, self.message)
    }
}

#[derive(Debug, Default)]
pub struct Session {
    search: Option<SearchResult>,
    summary: Option<Summary>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_result(&self) -> Option<&SearchResult> {
        self.search.as_ref()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// Run a search and make its result current.
    ///
    /// The previous result and any summary of it are discarded.
    #[instrument(level = "info", skip_all)]
    pub async fn search(
        &mut self,
        dispatcher: &Dispatcher,
        params: SearchParams,
        now: DateTime<Utc>,
    ) -> Vec<Notice> {
        let outcome = dispatcher.dispatch(params, now).await;
        info!(
            domestic = outcome.result.domestic.len(),
            international = outcome.result.international.len(),
            articles = outcome.result.article_count(),
            "Search result replaced"
        );
        self.search = Some(outcome.result);
        self.summary = None;
        outcome.notices
    }

    /// Summarize the current result with `model`.
    ///
    /// On failure the current result and any earlier summary are left as they
    /// were.
    #[instrument(level = "info", skip_all, fields(%model))]
    pub async fn summarize<A>(
        &mut self,
        api: &A,
        model: &str,
        instruction: Option<&str>,
        language: &str,
    ) -> Notice
    where
        A: AskAsync<Response = String>,
    {
        let Some(result) = self.search.as_ref() else {
            return Notice::error(DigestError::NoSearchResult.to_string());
        };

        let prompt = build_prompt(result, instruction, language);
        info!(entries = prompt.entries, "Built summarization prompt");
        let request = CompletionRequest::new(model, prompt.system, prompt.user);

        match ask_timed(api, &request).await {
            Ok(text) => {
                self.summary = Some(Summary {
                    text,
                    model: model.to_string(),
                    article_count: prompt.entries,
                    created_at: Utc::now(),
                });
                Notice::success("Summary complete.")
            }
            Err(e) => {
                error!(error = %e, "Summarization failed; keeping previous state");
                Notice::error(e.to_string())
            }
        }
    }

    /// Render the current summary as a PDF document at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn export_pdf(&self, fonts: &FontConfig, path: &Path) -> Notice {
        let Some(summary) = self.summary.as_ref() else {
            return Notice::error(DigestError::NoSummary.to_string());
        };

        let fonts = match pdf::FontFiles::load(fonts).await {
            Ok(fonts) => fonts,
            Err(e) => {
                error!(error = %e, "Loading fonts failed");
                return Notice::error(e.to_string());
            }
        };

        let text = summary.text.clone();
        let rendered = tokio::task::spawn_blocking(move || pdf::render_summary(&text, &fonts))
            .await
            .unwrap_or_else(|e| Err(DigestError::Export(format!("render task failed: {}", e))));

        let bytes = match rendered {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "PDF rendering failed");
                return Notice::error(e.to_string());
            }
        };

        match tokio::fs::write(path, &bytes).await {
            Ok(()) => {
                info!(bytes = bytes.len(), "Wrote summary PDF");
                Notice::success(format!("Saved summary document to {}", path.display()))
            }
            Err(e) => {
                let e = DigestError::Export(format!("{}: {}", path.display(), e));
                error!(error = %e, "Writing PDF failed");
                Notice::error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, Service};
    use crate::models::{Article, Origin};
    use crate::sources::naver::NaverClient;
    use crate::sources::newsapi::NewsApiClient;
    use chrono::{FixedOffset, TimeZone};
    use std::cell::RefCell;

    /// Scripted stand-in for the completion service.
    struct ScriptedAsk {
        reply: Option<String>,
        seen: RefCell<Vec<CompletionRequest>>,
    }

    impl ScriptedAsk {
        fn ok(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl AskAsync for ScriptedAsk {
        type Response = String;

        async fn ask(&self, request: &CompletionRequest) -> Result<String> {
            self.seen.borrow_mut().push(request.clone());
            self.reply.clone().ok_or(DigestError::Status {
                service: Service::Completion,
                status: "500 Internal Server Error".to_string(),
                message: "overloaded".to_string(),
            })
        }
    }

    fn article(n: usize, origin: Origin) -> Article {
        Article {
            title: format!("Title {n}"),
            description: String::new(),
            url: format!("https://example.com/{n}"),
            source_name: None,
            published_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2026, 10, 19, 0, 0, 0)
                .unwrap(),
            origin,
        }
    }

    fn session_with_result() -> Session {
        Session {
            search: Some(SearchResult {
                params: SearchParams::default(),
                domestic: vec![article(1, Origin::Domestic)],
                international: vec![article(2, Origin::International), article(3, Origin::International)],
                international_total: 2,
                fetched_at: Utc::now(),
            }),
            summary: None,
        }
    }

    #[tokio::test]
    async fn test_summarize_requires_search() {
        let mut session = Session::new();
        let notice = session
            .summarize(&ScriptedAsk::ok("text"), "gpt-4.1-mini", None, "KOREAN")
            .await;
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(session.summary().is_none());
    }

    #[tokio::test]
    async fn test_summarize_stores_summary() {
        let mut session = session_with_result();
        let api = ScriptedAsk::ok("## Topic 1: Chips\n**Summary:** Demand grew.");
        let notice = session
            .summarize(&api, "gpt-4o", Some("short please"), "KOREAN")
            .await;

        assert_eq!(notice.level, NoticeLevel::Success);
        let summary = session.summary().unwrap();
        assert_eq!(summary.model, "gpt-4o");
        assert_eq!(summary.article_count, 3);
        assert!(summary.text.starts_with("## Topic 1"));

        let seen = api.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].max_tokens, 16_384);
        assert!(seen[0].prompt.contains("short please"));
    }

    #[tokio::test]
    async fn test_summarize_failure_keeps_state() {
        let mut session = session_with_result();
        session
            .summarize(&ScriptedAsk::ok("first summary"), "gpt-4.1", None, "KOREAN")
            .await;

        let notice = session
            .summarize(&ScriptedAsk::failing(), "gpt-4.1", None, "KOREAN")
            .await;

        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("language model"));
        assert_eq!(session.summary().unwrap().text, "first summary");
        assert_eq!(session.search_result().unwrap().article_count(), 3);
    }

    #[tokio::test]
    async fn test_new_search_replaces_result_and_clears_summary() {
        let mut session = session_with_result();
        session
            .summarize(&ScriptedAsk::ok("old"), "gpt-4.1", None, "KOREAN")
            .await;

        // Unreachable endpoints: both services fail, the session still ends
        // up with a fresh (empty) result.
        let http = reqwest::Client::new();
        let dispatcher = Dispatcher::new(
            NaverClient::new(http.clone(), "http://127.0.0.1:9/news.json", None),
            NewsApiClient::new(http, "http://127.0.0.1:9/everything", None),
        );
        let notices = session
            .search(&dispatcher, SearchParams::default(), Utc::now())
            .await;

        assert_eq!(
            notices.iter().filter(|n| n.level == NoticeLevel::Error).count(),
            2
        );
        assert_eq!(session.search_result().unwrap().article_count(), 0);
        assert!(session.summary().is_none());
    }

    #[tokio::test]
    async fn test_export_without_summary() {
        let session = session_with_result();
        let notice = session
            .export_pdf(&FontConfig::default(), Path::new("/tmp/never-written.pdf"))
            .await;
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("no summary"));
    }

    #[tokio::test]
    async fn test_export_missing_font_keeps_summary() {
        let mut session = session_with_result();
        session
            .summarize(&ScriptedAsk::ok("## Topic 1: Chips"), "gpt-4.1", None, "KOREAN")
            .await;

        let fonts = FontConfig {
            regular: "/nonexistent/regular.ttf".into(),
            bold: "/nonexistent/bold.ttf".into(),
            link: "/nonexistent/link.ttf".into(),
        };
        let out = std::env::temp_dir().join("news_digest_missing_font.pdf");
        let notice = session.export_pdf(&fonts, &out).await;

        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("regular.ttf"));
        assert_eq!(session.summary().unwrap().text, "## Topic 1: Chips");
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_export_writes_pdf_with_system_font() {
        let font = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
        if !Path::new(font).exists() {
            eprintln!("{font} not installed; skipping");
            return;
        }

        let mut session = session_with_result();
        session
            .summarize(
                &ScriptedAsk::ok("## Topic 1: Chips\n**Summary:** Demand grew.\n**Articles:**\n- [Title 2](https://example.com/2)"),
                "gpt-4.1",
                None,
                "KOREAN",
            )
            .await;

        let fonts = FontConfig {
            regular: font.into(),
            bold: font.into(),
            link: font.into(),
        };
        let out = std::env::temp_dir().join("news_digest_export_test.pdf");
        let notice = session.export_pdf(&fonts, &out).await;

        assert_eq!(notice.level, NoticeLevel::Success, "{}", notice);
        let bytes = tokio::fs::read(&out).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_notice_display() {
        assert_eq!(Notice::error("NewsAPI down").to_string(), "[error] NewsAPI down");
        assert_eq!(Notice::success("done").to_string(), "[ok] done");
    }
}
