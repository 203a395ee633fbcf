use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::Serialize;

use crate::assistant::{GenerationConfig, Generator};
use crate::error::{Error, Result};
use crate::prompt::PromptPair;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini `generateContent` client
pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client,
            base_url: API_BASE.to_string(),
        }
    }

    /// Reads the key from `GEMINI_API_KEY`.
    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            Error::invalid_input("GEMINI_API_KEY environment variable not set (required for AI features)")
        })?;
        Ok(Self::new(client, api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn request_body<'a>(prompt: &'a PromptPair, config: &'a GenerationConfig) -> GenerateRequest<'a> {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part { text: &prompt.system }],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part { text: &prompt.user }],
        }],
        generation_config: config,
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    let message = format!("Gemini API returned {status}: {body}");
    if status == StatusCode::TOO_MANY_REQUESTS {
        Error::rate_limited(message)
    } else {
        Error::upstream(message)
    }
}

fn extract_text(json: &serde_json::Value) -> Result<String> {
    let text: String = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text")?.as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::upstream("unexpected Gemini API response format"));
    }
    Ok(text)
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, model: &str, prompt: &PromptPair, config: &GenerationConfig) -> Result<String> {
        debug!("Generating via Gemini API with model {model}");

        let url = format!("{}/{model}:generateContent", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt, config))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let json: serde_json::Value = resp.json().await?;
        extract_text(&json)
    }
}
