//! YAML configuration: service endpoints, the model list, the summary
//! language and the font files used for the PDF export.
//!
//! Every field has a default, so an absent file or a partial file both work.
//!
//! ```yaml
//! models: [gpt-4.1-mini, gpt-4o, gpt-4.1]
//! summary_language: KOREAN
//! fonts:
//!   regular: ./fonts/NanumGothic.ttf
//!   bold: ./fonts/NanumGothicBold.ttf
//!   link: ./fonts/NotoSansCJKkr-Regular.ttf
//! ```

use crate::error::{DigestError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub naver_endpoint: String,
    pub newsapi_endpoint: String,
    pub completion_endpoint: String,
    /// Model identifiers the user may pick from; the first is the default.
    pub models: Vec<String>,
    /// Natural language the summary must be written in.
    pub summary_language: String,
    pub fonts: FontConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naver_endpoint: "https://openapi.naver.com/v1/search/news.json".to_string(),
            newsapi_endpoint: "https://newsapi.org/v2/everything".to_string(),
            completion_endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            models: vec![
                "gpt-4.1-mini".to_string(),
                "gpt-4o".to_string(),
                "gpt-4.1".to_string(),
            ],
            summary_language: "KOREAN".to_string(),
            fonts: FontConfig::default(),
        }
    }
}

/// TrueType files for the PDF export. They must cover every script the
/// summary may contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub regular: PathBuf,
    pub bold: PathBuf,
    /// Face used for hyperlinked article titles.
    pub link: PathBuf,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            regular: PathBuf::from("./fonts/NanumGothic.ttf"),
            bold: PathBuf::from("./fonts/NanumGothicBold.ttf"),
            link: PathBuf::from("./fonts/NotoSansCJKkr-Regular.ttf"),
        }
    }
}

impl Config {
    /// Parse and validate a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(text).map_err(|e| DigestError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, endpoint) in [
            ("naver_endpoint", &self.naver_endpoint),
            ("newsapi_endpoint", &self.newsapi_endpoint),
            ("completion_endpoint", &self.completion_endpoint),
        ] {
            Url::parse(endpoint)
                .map_err(|e| DigestError::Config(format!("{name} `{endpoint}` is not a valid URL: {e}")))?;
        }
        if self.models.is_empty() {
            return Err(DigestError::Config("models must list at least one model".to_string()));
        }
        if self.summary_language.trim().is_empty() {
            return Err(DigestError::Config("summary_language must not be empty".to_string()));
        }
        Ok(())
    }

    /// Pick the model to summarize with; `None` selects the first listed one.
    pub fn resolve_model(&self, requested: Option<&str>) -> Result<String> {
        match requested {
            None => self
                .models
                .first()
                .cloned()
                .ok_or_else(|| DigestError::Config("no models configured".to_string())),
            Some(model) if self.models.iter().any(|m| m == model) => Ok(model.to_string()),
            Some(model) => Err(DigestError::Config(format!(
                "model `{}` is not one of: {}",
                model,
                self.models.join(", ")
            ))),
        }
    }
}

/// Load configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<Config> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(Config::default());
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DigestError::Config(format!("cannot read {path}: {e}")))?;
    let config = Config::from_yaml(&text)?;
    info!(models = ?config.models, language = %config.summary_language, "Loaded configuration");
    Ok(config)
}
