use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::assistant::GenerationConfig;
use crate::cache::CacheOptions;
use crate::error::{Error, Result};

/// Which transcript source to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Ytdlp,
    Innertube,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_lang: Option<String>,
    pub default_format: Option<String>,
    pub prefer_generated: Option<bool>,
    pub source: Option<SourceKind>,
    pub model: Option<String>,
    pub fallback_model: Option<String>,
    pub max_chars: Option<usize>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub cache: CacheConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_size: Option<usize>,
    pub ttl_secs: Option<u64>,
    pub sweep_secs: Option<u64>,
}

const DEFAULT_SWEEP: Duration = Duration::from_secs(10 * 60);

impl Config {
    /// Load config from ~/.config/ytscribe/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            Self::parse(&content)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::parse(format!("invalid config: {e}")))
    }

    /// Generation parameters with config overrides applied.
    pub fn generation(&self) -> GenerationConfig {
        let defaults = GenerationConfig::default();
        GenerationConfig {
            temperature: self.temperature.unwrap_or(defaults.temperature),
            top_p: self.top_p.unwrap_or(defaults.top_p),
            top_k: self.top_k.unwrap_or(defaults.top_k),
            max_output_tokens: self.max_output_tokens.unwrap_or(defaults.max_output_tokens),
        }
    }

    pub fn cache_options(&self) -> CacheOptions {
        let defaults = CacheOptions::default();
        CacheOptions {
            max_size: self.cache.max_size.unwrap_or(defaults.max_size),
            ttl: self.cache.ttl_secs.map(Duration::from_secs).unwrap_or(defaults.ttl),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        self.cache
            .sweep_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SWEEP)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytscribe")
        .join("config.toml")
}
