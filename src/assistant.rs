//! AI operations over a transcript: summarize, search, extract and chat.
//!
//! Prompts come from `prompt`, responses from any `Generator`. Results of
//! the first three operations are cached; chat is conversational and is
//! never cached.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::cache::{ResponseCache, fingerprint, generate_key};
use crate::error::{Error, Result};
use crate::presets::{self, Category, PresetCatalog};
use crate::prompt::{self, PromptOptions, PromptPair};

pub const PRIMARY_MODEL: &str = "gemini-3-flash-preview";
pub const FALLBACK_MODEL: &str = "gemini-2.5-flash";

/// Sampling parameters passed through to the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// A text generation backend
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &PromptPair, config: &GenerationConfig) -> Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct AiOptions {
    /// Overrides the primary model. Fallback only applies to the primary.
    pub model: Option<String>,
    pub generation: GenerationConfig,
    pub prompt: PromptOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiReply {
    pub text: String,
    pub mode: String,
    pub cached: bool,
}

/// Whether a failed primary-model attempt may be retried on the fallback
/// model. Rate limits are never retried.
pub fn should_fallback(err: &Error) -> bool {
    err.is_upstream() && !err.is_rate_limited()
}

pub struct Assistant<G> {
    generator: G,
    cache: Arc<ResponseCache>,
    primary_model: String,
    fallback_model: String,
}

impl<G: Generator> Assistant<G> {
    pub fn new(generator: G, cache: Arc<ResponseCache>) -> Self {
        Self {
            generator,
            cache,
            primary_model: PRIMARY_MODEL.to_string(),
            fallback_model: FALLBACK_MODEL.to_string(),
        }
    }

    pub fn with_models(mut self, primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.primary_model = primary.into();
        self.fallback_model = fallback.into();
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn presets(&self) -> PresetCatalog {
        presets::available_presets()
    }

    /// At most two attempts: the requested model, then the fallback model
    /// when the request was for the primary and `should_fallback` allows it.
    pub async fn generate(&self, prompt: &PromptPair, opts: &AiOptions) -> Result<String> {
        let requested = opts.model.as_deref().unwrap_or(&self.primary_model);
        let mut models = vec![requested];
        if requested == self.primary_model && self.fallback_model != self.primary_model {
            models.push(&self.fallback_model);
        }

        let mut last_err: Option<Error> = None;
        for model in models {
            if let Some(prev) = &last_err {
                if !should_fallback(prev) {
                    break;
                }
                info!("Primary model failed, trying fallback: {model}");
            }
            match self.generator.generate(model, prompt, &opts.generation).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!("Model {model} failed: {e}");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::upstream("no model attempted")))
    }

    async fn cached<F>(&self, key: String, mode: &str, build: F, opts: &AiOptions) -> Result<AiReply>
    where
        F: FnOnce() -> Result<PromptPair>,
    {
        if let Some(text) = self.cache.get(&key) {
            debug!("Cache hit for {key}");
            return Ok(AiReply {
                text,
                mode: mode.to_string(),
                cached: true,
            });
        }

        let prompt = build()?;
        let text = self.generate(&prompt, opts).await?;
        self.cache.set(key, text.clone());
        Ok(AiReply {
            text,
            mode: mode.to_string(),
            cached: false,
        })
    }

    pub async fn summarize(&self, text: &str, mode: &str, opts: &AiOptions) -> Result<AiReply> {
        require("Text", text)?;
        let extra = opts.prompt.additional_context.as_deref().map(fingerprint);
        let preset = presets::lookup(Category::Summary, mode)?;
        let key = generate_key("summarize", text, preset.id, extra.as_deref());
        self.cached(key, mode, || prompt::build_summary(text, mode, &opts.prompt), opts)
            .await
    }

    pub async fn search(&self, text: &str, query: &str, mode: &str, opts: &AiOptions) -> Result<AiReply> {
        require("Text", text)?;
        require("Query", query)?;
        let scope = match opts.prompt.previous_context.as_deref() {
            Some(ctx) if !ctx.is_empty() => format!("{query}\n{ctx}"),
            _ => query.to_string(),
        };
        let preset = presets::lookup(Category::Search, mode)?;
        let key = generate_key("search", text, preset.id, Some(&fingerprint(&scope)));
        self.cached(key, mode, || prompt::build_search(text, query, mode, &opts.prompt), opts)
            .await
    }

    pub async fn extract(&self, text: &str, extract_type: &str, opts: &AiOptions) -> Result<AiReply> {
        require("Text", text)?;
        require("Extract type", extract_type)?;
        let preset = presets::lookup(Category::Extract, extract_type)?;
        let key = generate_key("extract", text, preset.id, None);
        self.cached(key, extract_type, || prompt::build_extract(text, extract_type, &opts.prompt), opts)
            .await
    }

    /// Never cached.
    pub async fn chat(&self, text: &str, message: &str, mode: &str, opts: &AiOptions) -> Result<AiReply> {
        require("Text", text)?;
        require("Message", message)?;
        let prompt = prompt::build_chat(text, message, mode, &opts.prompt)?;
        let text = self.generate(&prompt, opts).await?;
        Ok(AiReply {
            text,
            mode: mode.to_string(),
            cached: false,
        })
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_input(format!("{field} is required")));
    }
    Ok(())
}
