//! Command-line interface definitions for News Digest.
//!
//! One invocation is one session: search, print both tables, then optionally
//! summarize and export. Credentials can come from flags or environment
//! variables.

use crate::models::{LanguageCode, SearchParams};
use crate::sources::naver::NaverCredentials;
use clap::Parser;

/// Command-line arguments for the News Digest application.
///
/// # Examples
///
/// ```sh
/// # Search both services for the default keyword and print the tables
/// news_digest
///
/// # Title-only English international search, summarized and exported
/// news_digest -d 반도체 -g semiconductor --title-only --language en -s --pdf summary.pdf
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Keyword for the domestic (Naver News) search
    #[arg(short = 'd', long, default_value = "AI")]
    pub domestic_query: String,

    /// Keyword for the international (NewsAPI) search
    #[arg(short = 'g', long, default_value = "AI")]
    pub global_query: String,

    /// Search period in days (currently always one day)
    #[arg(long, default_value_t = 1)]
    pub days: u32,

    /// Model used for the summary; must be one of the configured models
    #[arg(long)]
    pub model: Option<String>,

    /// Match the international keyword against titles only
    #[arg(long)]
    pub title_only: bool,

    /// Major outlets only (not active yet)
    #[arg(long)]
    pub major_only: bool,

    /// Restrict international results to one ISO-639-1 language
    #[arg(long, value_parser = parse_language)]
    pub language: Option<LanguageCode>,

    /// Extra guidance for the summary's style or focus
    #[arg(long)]
    pub instruction: Option<String>,

    /// Summarize the search result with the language model
    #[arg(short, long)]
    pub summarize: bool,

    /// Write the summary as a PDF document to this path
    #[arg(long, requires = "summarize")]
    pub pdf: Option<String>,

    /// Output directory for Markdown tables and summary
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// Output directory for the JSON export of the session
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Naver developer client id
    #[arg(long, env = "NAVER_CLIENT_ID", hide_env_values = true)]
    pub naver_client_id: Option<String>,

    /// Naver developer client secret
    #[arg(long, env = "NAVER_CLIENT_SECRET", hide_env_values = true)]
    pub naver_client_secret: Option<String>,

    /// NewsAPI key
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

fn parse_language(value: &str) -> Result<LanguageCode, String> {
    LanguageCode::parse(value)
}

impl Cli {
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            domestic_query: self.domestic_query.clone(),
            international_query: self.global_query.clone(),
            days: self.days,
            title_only: self.title_only,
            major_outlets_only: self.major_only,
            language: self.language.clone(),
        }
    }

    /// Both halves of the Naver credential pair, or nothing.
    pub fn naver_credentials(&self) -> Option<NaverCredentials> {
        match (&self.naver_client_id, &self.naver_client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some(NaverCredentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        }
    }
}
