//! Language-model completion over an OpenAI-compatible chat API.
//!
//! # Architecture
//!
//! - [`AskAsync`]: the seam the summarize action depends on
//! - [`OpenAiChat`]: the HTTP implementation talking to `/v1/chat/completions`
//! - [`ask_timed`]: entry point that wraps any [`AskAsync`] with latency logging
//!
//! One call is one request. Failures are returned to the caller untouched;
//! there is no retry.

use crate::error::{DigestError, Result, Service};
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Everything one completion call needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    /// System instruction describing the assistant's role.
    pub system: String,
    /// User prompt carrying the manifest and the output template.
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl CompletionRequest {
    /// Build a request with the fixed generation parameters used for summaries.
    pub fn new(model: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            max_tokens: max_tokens_for(&model),
            model,
            system: system.into(),
            prompt: prompt.into(),
            temperature: 0.2,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// Output token budget for a model.
pub fn max_tokens_for(model: &str) -> u32 {
    if model == "gpt-4o" { 16_384 } else { 32_768 }
}

/// Trait for async LLM interaction.
///
/// Implementors send one [`CompletionRequest`] and return the generated text.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    async fn ask(&self, request: &CompletionRequest) -> Result<Self::Response>;
}

/// Chat-completions client for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenAiChat {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

impl AskAsync for OpenAiChat {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn ask(&self, request: &CompletionRequest) -> Result<Self::Response> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(DigestError::MissingCredentials {
                service: Service::Completion,
                hint: "set OPENAI_API_KEY",
            })?;

        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
            response_format: ResponseFormat { kind: "text" },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| DigestError::Transport {
                service: Service::Completion,
                source,
            })?;

        let payload: ChatResponse = crate::sources::read_json(Service::Completion, response).await?;
        if let Some(usage) = &payload.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(DigestError::EmptyCompletion)
    }
}

/// Send one request through `api`, logging how long it took.
#[instrument(level = "info", skip_all, fields(model = %request.model))]
pub async fn ask_timed<A>(api: &A, request: &CompletionRequest) -> Result<String>
where
    A: AskAsync<Response = String>,
{
    let t0 = Instant::now();
    let res = api.ask(request).await;
    let dt = t0.elapsed();

    match &res {
        Ok(text) => info!(
            elapsed_ms = dt.as_millis() as u64,
            bytes = text.len(),
            preview = %truncate_for_log(text, 120),
            "Completion succeeded"
        ),
        Err(e @ DigestError::EmptyCompletion) => {
            warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "Completion was empty")
        }
        Err(e) => error!(elapsed_ms = dt.as_millis() as u64, error = %e, "Completion failed"),
    }
    res
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
