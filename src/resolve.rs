//! Video identifier resolution.
//!
//! Inputs are tried against an ordered list of rules; the first rule that
//! yields a well-formed 11-character id wins.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{Error, Result};

const ID_LEN: usize = 11;

static FALLBACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:youtube\.com/watch\?(?:[^#]*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .expect("valid video id regex")
});

type Rule = fn(&str) -> Option<String>;

/// Resolution rules in priority order.
const RULES: &[(&str, Rule)] = &[("bare id", bare_id), ("url", from_url), ("pattern", from_pattern)];

pub fn is_video_id(s: &str) -> bool {
    s.len() == ID_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extract video ID from a bare id or any of the common YouTube URL shapes
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::invalid_input("URL or video ID is required"));
    }

    for (name, rule) in RULES {
        if let Some(id) = rule(input) {
            debug!("Resolved video id {id} via {name} rule");
            return Ok(id);
        }
    }

    Err(Error::invalid_input(format!("could not extract video ID from: {input}")))
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

fn bare_id(input: &str) -> Option<String> {
    is_video_id(input).then(|| input.to_string())
}

fn from_url(input: &str) -> Option<String> {
    let url = if input.starts_with("http://") || input.starts_with("https://") {
        Url::parse(input).ok()?
    } else if input.contains("youtube.com") || input.contains("youtu.be") {
        Url::parse(&format!("https://{input}")).ok()?
    } else {
        return None;
    };

    let host = url.host_str()?.to_ascii_lowercase();
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    if host.contains("youtube.com") || host.contains("youtube-nocookie.com") {
        if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
            if is_video_id(&v) {
                return Some(v.into_owned());
            }
        }
        return match (segments.next(), segments.next()) {
            (Some("embed" | "v" | "shorts" | "live"), Some(id)) if is_video_id(id) => Some(id.to_string()),
            _ => None,
        };
    }

    if host == "youtu.be" || host == "www.youtu.be" {
        return segments.next().filter(|id| is_video_id(id)).map(str::to_string);
    }

    None
}

fn from_pattern(input: &str) -> Option<String> {
    FALLBACK_RE.captures(input).map(|caps| caps[1].to_string())
}
