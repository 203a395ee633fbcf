use thiserror::Error;

/// Result type for ytscribe operations.
pub type Result<T> = std::result::Result<T, Error>;

const RATE_LIMITED_MESSAGE: &str =
    "The AI service is currently busy or you have exceeded your free quota. Please try again later.";

/// Errors surfaced by the subtitle and AI pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("upstream failure: {message}")]
    Upstream { message: String, rate_limited: bool },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream {
            message: msg.into(),
            rate_limited: false,
        }
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::Upstream {
            message: msg.into(),
            rate_limited: true,
        }
    }

    /// True only for an explicit quota/rate-limit signal from a provider.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Upstream { rate_limited: true, .. })
    }

    /// Failures of an external collaborator (transcript source or AI provider).
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Http(_) | Self::Io(_) | Self::Json(_))
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream { rate_limited: true, .. } => RATE_LIMITED_MESSAGE.to_string(),
            Self::NotFound(what) => format!("No subtitles found: {what}"),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_flag() {
        assert!(Error::rate_limited("429").is_rate_limited());
        assert!(!Error::upstream("500").is_rate_limited());
        assert!(!Error::not_found("en").is_rate_limited());
    }

    #[test]
    fn test_user_message_for_rate_limit() {
        let msg = Error::rate_limited("quota exhausted").user_message();
        assert!(msg.contains("free quota"));
    }

    #[test]
    fn test_user_message_for_not_found() {
        let msg = Error::not_found("language 'de'").user_message();
        assert_eq!(msg, "No subtitles found: language 'de'");
    }

    #[test]
    fn test_is_upstream() {
        assert!(Error::upstream("boom").is_upstream());
        assert!(!Error::parse("bad clock").is_upstream());
        assert!(!Error::UnknownPreset("nope".into()).is_upstream());
    }
}
