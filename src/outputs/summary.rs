//! Line parser for the model's summary.
//!
//! The summary is requested in a fixed template (see [`crate::prompt`]):
//!
//! ```text
//! ## Topic 1: <Topic Title>
//! **Summary:** ...
//! **Articles:**
//! - [Title A](URL)
//! ```
//!
//! Parsing is a small line-oriented state machine. Lines that match no
//! recognized prefix become plain paragraphs, so a model that drifts from the
//! template still renders, just with less structure.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const SECTION_PREFIX: &str = "## ";
const SUMMARY_LABEL: &str = "**Summary:**";
const ARTICLES_LABEL: &str = "**Articles:**";

static LINK_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*]\s+\[(.*?)\]\((.*?)\)").expect("link item pattern is valid"));

/// One renderable unit of the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Section title, taken verbatim after the `## ` prefix.
    Heading(String),
    /// Text following the `**Summary:**` label.
    Summary(String),
    /// The `**Articles:**` label opening a link list.
    ArticlesLabel,
    /// `- [title](url)` list item.
    Link { title: String, url: String },
    /// Bullet inside an article list that carries no link.
    Bullet(String),
    Paragraph(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingSection,
    InSummaryLine,
    InArticleList,
    PlainText,
}

/// Split the model output into [`Block`]s. Blank lines are dropped.
pub fn parse_summary(text: &str) -> Vec<Block> {
    let mut state = State::SeekingSection;
    let mut blocks = Vec::new();

    for raw in text.lines() {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        let (block, next) = classify(line, state);
        state = next;
        blocks.push(block);
    }

    debug!(
        blocks = blocks.len(),
        sections = blocks.iter().filter(|b| matches!(b, Block::Heading(_))).count(),
        "Parsed summary"
    );
    blocks
}

fn classify(line: &str, state: State) -> (Block, State) {
    if let Some(title) = line.strip_prefix(SECTION_PREFIX) {
        return (Block::Heading(title.trim().to_string()), State::InSummaryLine);
    }

    let trimmed = line.trim_start();
    if let Some(content) = trimmed.strip_prefix(SUMMARY_LABEL) {
        return (Block::Summary(content.trim().to_string()), State::InSummaryLine);
    }
    if line.contains(ARTICLES_LABEL) {
        return (Block::ArticlesLabel, State::InArticleList);
    }
    if let Some(caps) = LINK_ITEM.captures(trimmed) {
        return (
            Block::Link {
                title: caps[1].to_string(),
                url: caps[2].to_string(),
            },
            State::InArticleList,
        );
    }

    if state == State::InArticleList {
        if let Some(item) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
            return (Block::Bullet(item.trim().to_string()), State::InArticleList);
        }
    }

    (Block::Paragraph(line.to_string()), State::PlainText)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
## Topic 1: 반도체 수출 규제와 공급망 재편
**Summary:** 미국의 규제가 강화되었다. 업계는 대응에 나섰다.

**Articles:**
- [Chip curbs widen](https://r.example/1)
- [반도체 수출 감소](https://n.example/2)

## Topic 2: AI safety rules
**Summary:** Regulators moved.
**Articles:**
- [EU AI Act](https://e.example/3)
";

    #[test]
    fn test_parse_template() {
        let blocks = parse_summary(SAMPLE);
        assert_eq!(
            blocks,
            vec![
                Block::Heading("Topic 1: 반도체 수출 규제와 공급망 재편".to_string()),
                Block::Summary("미국의 규제가 강화되었다. 업계는 대응에 나섰다.".to_string()),
                Block::ArticlesLabel,
                Block::Link {
                    title: "Chip curbs widen".to_string(),
                    url: "https://r.example/1".to_string(),
                },
                Block::Link {
                    title: "반도체 수출 감소".to_string(),
                    url: "https://n.example/2".to_string(),
                },
                Block::Heading("Topic 2: AI safety rules".to_string()),
                Block::Summary("Regulators moved.".to_string()),
                Block::ArticlesLabel,
                Block::Link {
                    title: "EU AI Act".to_string(),
                    url: "https://e.example/3".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_unrecognized_lines_become_paragraphs() {
        let blocks = parse_summary("Here is your summary:\n### Not a section\n- loose bullet");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("Here is your summary:".to_string()),
                Block::Paragraph("### Not a section".to_string()),
                Block::Paragraph("- loose bullet".to_string()),
            ]
        );
    }

    #[test]
    fn test_bullet_without_link_inside_article_list() {
        let blocks = parse_summary("**Articles:**\n- Untitled wire report\nClosing remark");
        assert_eq!(
            blocks,
            vec![
                Block::ArticlesLabel,
                Block::Bullet("Untitled wire report".to_string()),
                Block::Paragraph("Closing remark".to_string()),
            ]
        );
    }

    #[test]
    fn test_link_item_with_trailing_text() {
        let blocks = parse_summary("- [Title](https://x.example/a) (Reuters)");
        assert_eq!(
            blocks,
            vec![Block::Link {
                title: "Title".to_string(),
                url: "https://x.example/a".to_string(),
            }]
        );
    }

    #[test]
    fn test_blank_input() {
        assert!(parse_summary("\n  \n").is_empty());
    }
}
