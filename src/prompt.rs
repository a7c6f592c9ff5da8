//! Summarization prompt: a numbered manifest of every article wrapped in a
//! fixed instruction template.
//!
//! The output template requested here is the one [`crate::outputs::summary`]
//! parses back when rendering the document, so the two must change together.

use crate::models::{Article, SearchResult};
use std::fmt::Write;

/// System instruction sent with every summarization request.
pub const SYSTEM_ROLE: &str = "You are an expert assistant for National Strategy Technology policy, \
you will carefully read them and produce a concise summary.";

/// Prompt text plus the number of manifest entries it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPrompt {
    pub system: String,
    pub user: String,
    pub entries: usize,
}

/// Render the numbered manifest. Numbering starts at 1 and runs across every
/// article without resetting.
pub fn build_manifest<'a, I>(articles: I) -> (String, usize)
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut manifest = String::new();
    let mut count = 0;
    for (i, article) in articles.into_iter().enumerate() {
        count = i + 1;
        writeln!(manifest, "{}. Title: {}", count, article.title).unwrap();
        writeln!(manifest, "   Description: {}", article.description).unwrap();
        writeln!(manifest, "   URL: {}", article.url).unwrap();
        manifest.push('\n');
    }
    (manifest, count)
}

/// Build the full prompt for `result`.
///
/// `instruction` is the user's optional free-text style request; blank input
/// counts as absent. `language` is the natural language the whole answer must
/// be written in.
pub fn build_prompt(result: &SearchResult, instruction: Option<&str>, language: &str) -> SummaryPrompt {
    let (manifest, entries) = build_manifest(result.combined());

    let mut user = String::new();
    writeln!(
        user,
        "Group the news articles below into 3~5 major issues (depending on the number of articles) and summarize each issue."
    )
    .unwrap();
    writeln!(
        user,
        "Use a mix of domestic and international news, and you can exclude unnecessary articles."
    )
    .unwrap();
    user.push('\n');

    if let Some(extra) = instruction.map(str::trim).filter(|s| !s.is_empty()) {
        writeln!(user, "Additional instruction from the user: {}", extra).unwrap();
        user.push('\n');
    }

    writeln!(user, "0. Be written entirely in {}", language).unwrap();
    writeln!(user, "1. **Topic Title**: 10-20 words.").unwrap();
    writeln!(
        user,
        "2. **Summary**: 4-5 sentence overview of the core theme and some specific content that article says."
    )
    .unwrap();
    writeln!(user, "3. **Articles**: Markdown list of titles with URLs.").unwrap();
    user.push('\n');
    writeln!(user, "Format exactly like this:").unwrap();
    user.push('\n');
    writeln!(user, "## Topic 1: <Topic Title>").unwrap();
    writeln!(user, "**Summary:** ...").unwrap();
    user.push('\n');
    writeln!(user, "**Articles:**").unwrap();
    writeln!(user, "- [Title A](URL)").unwrap();
    writeln!(user, "- [Title B](URL)").unwrap();
    user.push('\n');
    writeln!(user, "Articles:").unwrap();
    user.push_str(&manifest);

    SummaryPrompt {
        system: SYSTEM_ROLE.to_string(),
        user,
        entries,
    }
}
