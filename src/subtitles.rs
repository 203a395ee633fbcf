//! Subtitle export: resolve, fetch, parse, serialize.

use log::{debug, info};

use crate::error::{Error, Result};
use crate::output::{self, ExportFormat};
use crate::resolve::extract_video_id;
use crate::youtube::TranscriptSource;
use crate::{Track, VideoMetadata};

/// A rendered subtitle file plus what it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleResult {
    pub content: String,
    pub filename: String,
    pub format: ExportFormat,
    pub mime_type: &'static str,
    pub language_code: String,
    pub metadata: VideoMetadata,
}

/// Parsed captions for one video
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedTrack {
    pub metadata: VideoMetadata,
    pub track: Track,
    /// The source's own WebVTT text, when it delivered one.
    pub raw_vtt: Option<String>,
}

pub struct SubtitleService<S> {
    source: S,
}

impl<S: TranscriptSource> SubtitleService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and parse the caption track for `input` (URL or bare id).
    pub async fn fetch_track(&self, input: &str, lang: &str, prefer_generated: bool) -> Result<FetchedTrack> {
        let video_id = extract_video_id(input)?;
        let metadata = self.source.metadata(&video_id).await?;
        let payload = self.source.captions(&video_id, lang, prefer_generated).await?;

        let cues = payload.raw.to_cues();
        if cues.is_empty() {
            return Err(Error::not_found(format!("captions for {video_id} in '{lang}' contain no cues")));
        }
        debug!("Parsed {} cues for {video_id} ({})", cues.len(), payload.language_code);

        let raw_vtt = payload.raw.vtt_text().map(str::to_string);
        let track = Track {
            language_code: payload.language_code,
            cues,
        };
        Ok(FetchedTrack {
            metadata,
            track,
            raw_vtt,
        })
    }

    pub async fn get_subtitles(
        &self,
        input: &str,
        lang: &str,
        format: ExportFormat,
        prefer_generated: bool,
    ) -> Result<SubtitleResult> {
        let FetchedTrack {
            metadata,
            track,
            raw_vtt,
        } = self.fetch_track(input, lang, prefer_generated).await?;
        let export = output::serialize(&track.cues, format, raw_vtt.as_deref())?;
        let filename = output::export_filename(&metadata, format);
        info!("Exported {} as {filename}", metadata.id);

        Ok(SubtitleResult {
            content: export.content,
            filename,
            format,
            mime_type: export.mime_type,
            language_code: track.language_code,
            metadata,
        })
    }

    /// Flattened transcript text, as fed to the AI operations.
    pub async fn transcript_text(&self, input: &str, lang: &str) -> Result<(VideoMetadata, String)> {
        let fetched = self.fetch_track(input, lang, false).await?;
        Ok((fetched.metadata, fetched.track.text()))
    }
}
