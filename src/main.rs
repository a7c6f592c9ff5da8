//! # News Digest
//!
//! Searches Korean domestic news (Naver News) and international news
//! (NewsAPI) for a keyword, prints both result sets as Markdown tables, and
//! optionally asks a language model to group the articles into topics and
//! summarize them. The summary can be exported as a styled PDF document.
//!
//! ## Usage
//!
//! ```sh
//! news_digest -d 반도체 -g semiconductor -s --pdf summary.pdf -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! One invocation is one session:
//! 1. **Search**: both services are queried, normalized into one article
//!    shape, deduplicated and filtered to the last day
//! 2. **Summarize**: the combined result is numbered into a manifest and sent
//!    to an OpenAI-compatible chat completion endpoint
//! 3. **Export**: the summary is parsed and laid out as a PDF; the tables and
//!    the session can also be written as Markdown and JSON
//!
//! Failures of one service are reported as notices and never stop the others.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dispatcher;
mod error;
mod models;
mod outputs;
mod pipeline;
mod prompt;
mod session;
mod sources;
mod utils;

use api::OpenAiChat;
use cli::Cli;
use config::load_config;
use dispatcher::Dispatcher;
use outputs::{json, markdown};
use session::Session;
use sources::{naver::NaverClient, newsapi::NewsApiClient};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_digest starting up");

    let args = Cli::parse();
    debug!(
        domestic_query = %args.domestic_query,
        global_query = %args.global_query,
        summarize = args.summarize,
        "Parsed CLI arguments"
    );

    let config = load_config(args.config.as_deref()).await?;
    let model = config.resolve_model(args.model.as_deref())?;

    // Check output directories before spending any API calls.
    for dir in [&args.markdown_output_dir, &args.json_output_dir].into_iter().flatten() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e.into());
        }
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let dispatcher = Dispatcher::new(
        NaverClient::new(http.clone(), &config.naver_endpoint, args.naver_credentials()),
        NewsApiClient::new(http.clone(), &config.newsapi_endpoint, args.newsapi_key.clone()),
    );
    let mut session = Session::new();

    // ---- Search ----
    for notice in session.search(&dispatcher, args.search_params(), Utc::now()).await {
        println!("{}", notice);
    }
    if let Some(result) = session.search_result() {
        println!();
        println!("{}", markdown::result_to_markdown(result));
    }

    // ---- Summarize ----
    if args.summarize {
        let api = OpenAiChat::new(http, &config.completion_endpoint, args.openai_api_key.clone());
        let notice = session
            .summarize(
                &api,
                &model,
                args.instruction.as_deref(),
                &config.summary_language,
            )
            .await;
        println!("{}", notice);

        if let Some(summary) = session.summary() {
            println!();
            println!("{}", summary.text);
        }

        if let Some(ref pdf_path) = args.pdf {
            let notice = session.export_pdf(&config.fonts, Path::new(pdf_path)).await;
            println!("{}", notice);
        }
    }

    // ---- File outputs ----
    if let Some(result) = session.search_result() {
        if let Some(ref dir) = args.markdown_output_dir {
            if let Err(e) = markdown::write_markdown(dir, result, session.summary()).await {
                error!(path = %dir, error = %e, "Failed writing Markdown");
            }
        }
        if let Some(ref dir) = args.json_output_dir {
            if let Err(e) = json::write_session(dir, result, session.summary()).await {
                error!(path = %dir, error = %e, "Failed writing session JSON");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
