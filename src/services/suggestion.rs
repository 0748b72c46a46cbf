//! Post suggestion client
//!
//! Thin wrapper over a Gemini-style `generateContent` endpoint. Callers always
//! get text back: upstream failures are logged and replaced by one of two
//! fixed fallback messages.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;

/// Returned when no API key is configured or the upstream rejects it
pub const KEY_UNAVAILABLE_MESSAGE: &str =
    "AI feature is not available. The API key is invalid or missing.";

/// Returned for any other upstream failure
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't come up with a suggestion right now. Please try again.";

const API_KEY_HEADER: &str = "x-goog-api-key";

const PROMPT_INSTRUCTIONS: &str = "You are a creative assistant for a social media platform for developers called DevConnect. Your goal is to help users write engaging posts.

Instructions:
- Keep the tone professional but friendly and concise.
- The output should be a short post, ideally 2-4 sentences long.
- Include 1-3 relevant hashtags like #dev, #coding, #software, etc.
- If the user provides a draft, refine it or expand upon it.
- If the user's input is empty, suggest a post about a current, interesting topic in software development (e.g., AI, new frameworks, WASM, etc.).";

#[derive(Debug, thiserror::Error)]
enum SuggestionError {
    #[error("No API key configured")]
    MissingKey,

    #[error("API key rejected (status {status}): {body}")]
    InvalidKey { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Response contained no suggestion text")]
    EmptyResponse,
}

impl SuggestionError {
    fn fallback_message(&self) -> &'static str {
        match self {
            Self::MissingKey | Self::InvalidKey { .. } => KEY_UNAVAILABLE_MESSAGE,
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Suggestion client for post drafts
pub struct SuggestionService {
    client: reqwest::Client,
    config: AiConfig,
}

impl SuggestionService {
    /// Create a suggestion client from configuration
    pub fn new(config: AiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        if api_key(&config).is_none() {
            tracing::warn!("No ai.api_key configured, post suggestions are disabled");
        }

        Ok(Self { client, config })
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        api_key(&self.config).is_some()
    }

    /// Suggest post text for a draft. Never fails; see the fallback messages.
    pub async fn suggest(&self, draft: &str) -> String {
        match self.request(draft).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Post suggestion failed");
                e.fallback_message().to_string()
            }
        }
    }

    async fn request(&self, draft: &str) -> Result<String, SuggestionError> {
        let key = api_key(&self.config).ok_or(SuggestionError::MissingKey)?;

        let prompt = build_prompt(draft);
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(generate_url(&self.config))
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_key_rejection(status.as_u16(), &body) {
                return Err(SuggestionError::InvalidKey {
                    status: status.as_u16(),
                    body,
                });
            }
            return Err(SuggestionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        extract_text(parsed).ok_or(SuggestionError::EmptyResponse)
    }
}

fn api_key(config: &AiConfig) -> Option<&str> {
    config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

fn generate_url(config: &AiConfig) -> String {
    format!(
        "{}/models/{}:generateContent",
        config.endpoint.trim_end_matches('/'),
        config.model
    )
}

fn build_prompt(draft: &str) -> String {
    format!("{}\n\nUser's draft: \"{}\"", PROMPT_INSTRUCTIONS, draft)
}

fn is_key_rejection(status: u16, body: &str) -> bool {
    status == 401 || status == 403 || body.contains("API key not valid")
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
