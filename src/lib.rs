pub mod assistant;
pub mod cache;
pub mod captions;
pub mod config;
pub mod error;
pub mod gemini;
pub mod output;
pub mod presets;
pub mod prompt;
pub mod resolve;
pub mod subtitles;
pub mod timecode;
pub mod youtube;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use resolve::extract_video_id;
pub use timecode::TimeOffset;

/// A single timed caption entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    start: TimeOffset,
    end: TimeOffset,
    text: String,
}

impl Cue {
    /// Returns `None` for empty text. A reversed range is clamped so that
    /// `end` is never before `start`.
    pub fn new(start: TimeOffset, end: TimeOffset, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            start,
            end: end.max(start),
            text,
        })
    }

    pub fn start(&self) -> TimeOffset {
        self.start
    }

    pub fn end(&self) -> TimeOffset {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The full ordered cue sequence for one video and language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub language_code: String,
    pub cues: Vec<Cue>,
}

impl Track {
    /// Flatten the track into prompt-ready text.
    pub fn text(&self) -> String {
        flatten(&self.cues)
    }
}

/// Cue texts joined by single spaces, no timestamps.
pub fn flatten(cues: &[Cue]) -> String {
    cues.iter().map(Cue::text).collect::<Vec<_>>().join(" ")
}

/// Video details reported by the transcript source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub channel: Option<String>,
    /// `YYYYMMDD`
    pub upload_date: Option<String>,
    pub view_count: Option<u64>,
    /// Seconds
    pub duration: Option<u64>,
    pub thumbnail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> TimeOffset {
        TimeOffset::from_millis(v)
    }

    #[test]
    fn test_cue_rejects_empty_text() {
        assert!(Cue::new(ms(0), ms(1000), "").is_none());
        assert!(Cue::new(ms(0), ms(1000), "   ").is_none());
    }

    #[test]
    fn test_cue_clamps_reversed_range() {
        let cue = Cue::new(ms(2000), ms(1000), "late").unwrap();
        assert_eq!(cue.start(), ms(2000));
        assert_eq!(cue.end(), ms(2000));
    }

    #[test]
    fn test_track_text() {
        let track = Track {
            language_code: "en".to_string(),
            cues: vec![
                Cue::new(ms(0), ms(1500), "Hello world").unwrap(),
                Cue::new(ms(1500), ms(3500), "This is a test").unwrap(),
            ],
        };
        assert_eq!(track.text(), "Hello world This is a test");
    }

    #[test]
    fn test_metadata_camel_case() {
        let meta = VideoMetadata {
            id: "dQw4w9WgXcQ".to_string(),
            title: "Song".to_string(),
            upload_date: Some("20091025".to_string()),
            view_count: Some(42),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["uploadDate"], "20091025");
        assert_eq!(json["viewCount"], 42);
    }
}
