//! Transcription client: one remote multimodal call per page.
//!
//! The [`Transcriber`] trait is the seam between the orchestrator and the
//! network — tests drive the pipeline with an in-process fake, production
//! uses [`OpenAiTranscriber`] against any OpenAI-compatible chat-completions
//! endpoint.
//!
//! ## Retry strategy
//!
//! HTTP 429 means "slow down and try again"; the client recovers from it
//! locally with unbounded exponential backoff via
//! [`crate::retry::retry_with_backoff`]. Everything else — auth failures,
//! malformed requests, transport errors — propagates immediately, because
//! retrying will not change the outcome.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pipeline::encode::EncodedPage;
use crate::prompts::{SYSTEM_PROMPT, USER_INSTRUCTION};
use crate::retry::{retry_with_backoff, Backoff};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Turns one encoded page image into its Markdown fragment.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, page: &EncodedPage) -> Result<String, ConvertError>;
}

/// Transcriber backed by an OpenAI-compatible chat-completions endpoint.
///
/// One `reqwest::Client` (and therefore one connection pool and credential)
/// is shared read-only across all concurrent page calls.
pub struct OpenAiTranscriber {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    seed: u64,
    max_tokens: usize,
    backoff: Backoff,
}

impl OpenAiTranscriber {
    /// Build a transcriber from the conversion config.
    ///
    /// The credential comes from `config.api_key`, falling back to the
    /// `OPENAI_API_KEY` environment variable. The library never prompts;
    /// interactive credential entry is the CLI's job.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, ConvertError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
            .ok_or(ConvertError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ConvertError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            seed: config.seed,
            max_tokens: config.max_tokens,
            backoff: Backoff::from_millis(config.retry_base_ms),
        })
    }

    /// One request attempt, no retry.
    async fn request_once(&self, page: &EncodedPage) -> Result<String, ConvertError> {
        let body = build_request(
            &self.model,
            self.seed,
            self.temperature,
            self.max_tokens,
            &page.data_url,
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ConvertError::Network {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(ConvertError::RateLimited { retry_after_secs });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let detail = response.text().await.unwrap_or_default();
            return Err(ConvertError::AuthFailed { detail });
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ConvertError::ApiError {
                status: status.as_u16(),
                detail,
            });
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            ConvertError::Internal(format!("malformed completion response: {e}"))
        })?;

        let markdown = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ConvertError::Internal("completion contained no content".into()))?;

        debug!("Page {}: received {} bytes of Markdown", page.index + 1, markdown.len());
        Ok(markdown)
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, page: &EncodedPage) -> Result<String, ConvertError> {
        retry_with_backoff(
            || self.request_once(page),
            ConvertError::is_rate_limit,
            self.backoff,
        )
        .await
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    seed: u64,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Assemble the chat-completion request: the fixed system instruction, then
/// a user message pairing the fidelity instruction with the page image.
fn build_request<'a>(
    model: &'a str,
    seed: u64,
    temperature: f32,
    max_tokens: usize,
    data_url: &'a str,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        seed,
        temperature,
        max_tokens,
        messages: vec![
            Message {
                role: "system",
                content: vec![ContentPart::Text {
                    text: SYSTEM_PROMPT,
                }],
            },
            Message {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: USER_INSTRUCTION,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_is_deterministic_and_well_formed() {
        let req = build_request("gpt-4.1", 0, 0.0, 16384, "data:image/png;base64,AAAA");
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["model"], "gpt-4.1");
        assert_eq!(json["seed"], 0);
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 16384);

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");

        let user_parts = messages[1]["content"].as_array().unwrap();
        assert_eq!(user_parts[0]["type"], "text");
        assert_eq!(user_parts[1]["type"], "image_url");
        assert_eq!(
            user_parts[1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn response_parses_with_missing_content() {
        let raw = r#"{"choices":[{"message":{"content":null}}]}"#;
        let resp: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(resp.choices[0].message.content.is_none());
    }

    #[test]
    fn from_config_requires_a_key() {
        // Explicit empty key and a scrubbed env var → MissingApiKey.
        let config = ConversionConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        if std::env::var("OPENAI_API_KEY").is_err() {
            let err = OpenAiTranscriber::from_config(&config);
            assert!(matches!(err, Err(ConvertError::MissingApiKey)));
        }
    }
}
