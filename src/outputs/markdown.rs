//! Markdown tables for the two article collections.
//!
//! Free-text cells are escaped so that a literal `|` in a title or description
//! never becomes a column boundary, and line breaks are flattened so a record
//! always stays on one row.

use crate::error::Result;
use crate::models::{Article, SearchResult, Summary};
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

/// Escape a value for use inside a table cell.
pub fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

/// Title rendered as a Markdown link to the article.
fn title_link(article: &Article) -> String {
    let title = escape_cell(&article.title)
        .replace('[', "\\[")
        .replace(']', "\\]");
    let url = escape_cell(&article.url).replace(' ', "%20").replace(')', "%29");
    format!("[{}]({})", title, url)
}

/// `Title | Description | Date` table of domestic articles.
pub fn domestic_table(articles: &[Article]) -> String {
    let mut md = String::new();
    md.push_str("| Title | Description | Date |\n");
    md.push_str("|---|---|---|\n");
    for article in articles {
        writeln!(
            md,
            "| {} | {} | {} |",
            title_link(article),
            escape_cell(&article.description),
            article.published_at.format("%a, %d %b %Y")
        )
        .unwrap();
    }
    md
}

/// `Title | Description | Source | Date` table of international articles.
pub fn international_table(articles: &[Article]) -> String {
    let mut md = String::new();
    md.push_str("| Title | Description | Source | Date |\n");
    md.push_str("|---|---|---|---|\n");
    for article in articles {
        writeln!(
            md,
            "| {} | {} | {} | {} |",
            title_link(article),
            escape_cell(&article.description),
            escape_cell(article.source_name.as_deref().unwrap_or("")),
            article.published_at.format("%Y-%m-%d")
        )
        .unwrap();
    }
    md
}

/// Both tables under their section headings.
pub fn result_to_markdown(result: &SearchResult) -> String {
    let mut md = String::new();
    writeln!(md, "## Domestic news (Naver News)\n").unwrap();
    md.push_str(&domestic_table(&result.domestic));
    writeln!(md, "\n## International news (NewsAPI)\n").unwrap();
    md.push_str(&international_table(&result.international));
    md
}

/// Write the tables, and the summary when there is one, into `dir`.
#[instrument(level = "info", skip_all, fields(%dir))]
pub async fn write_markdown(dir: &str, result: &SearchResult, summary: Option<&Summary>) -> Result<()> {
    let dir = dir.trim_end_matches('/');

    let domestic_path = format!("{}/domestic.md", dir);
    fs::write(
        &domestic_path,
        format!("# Domestic news (Naver News)\n\n{}", domestic_table(&result.domestic)),
    )
    .await?;
    info!(path = %domestic_path, rows = result.domestic.len(), "Wrote domestic table");

    let international_path = format!("{}/international.md", dir);
    fs::write(
        &international_path,
        format!(
            "# International news (NewsAPI)\n\n{}",
            international_table(&result.international)
        ),
    )
    .await?;
    info!(path = %international_path, rows = result.international.len(), "Wrote international table");

    if let Some(summary) = summary {
        let summary_path = format!("{}/summary.md", dir);
        fs::write(&summary_path, &summary.text).await?;
        info!(path = %summary_path, model = %summary.model, "Wrote summary");
    }
    Ok(())
}
