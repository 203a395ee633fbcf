use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::{Cue, VideoMetadata, flatten};

const VTT_HEADER: &str = "WEBVTT";
const MAX_FILENAME_CHARS: usize = 100;
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Subtitle export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Json,
    Srt,
    Vtt,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain",
            ExportFormat::Json => "application/json",
            ExportFormat::Srt => "application/x-subrip",
            ExportFormat::Vtt => "text/vtt",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Srt => "srt",
            ExportFormat::Vtt => "vtt",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Txt),
            "json" => Ok(ExportFormat::Json),
            "srt" => Ok(ExportFormat::Srt),
            "vtt" => Ok(ExportFormat::Vtt),
            other => Err(Error::invalid_input(format!("unsupported format: '{other}'"))),
        }
    }
}

/// Rendered export, ready to be written or sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub content: String,
    pub mime_type: &'static str,
    pub filename_suffix: &'static str,
}

#[derive(Serialize)]
struct JsonCue<'a> {
    start: String,
    end: String,
    text: &'a str,
}

/// Render cues into `format`.
///
/// For VTT, `raw_original` is returned verbatim when it carries the WebVTT
/// header; otherwise the output is rebuilt from the cues.
pub fn serialize(cues: &[Cue], format: ExportFormat, raw_original: Option<&str>) -> Result<Export> {
    let content = match format {
        ExportFormat::Txt => render_text(cues),
        ExportFormat::Json => render_json(cues)?,
        ExportFormat::Srt => render_srt(cues),
        ExportFormat::Vtt => match raw_original.filter(|raw| is_well_formed_vtt(raw)) {
            Some(raw) => raw.to_string(),
            None => render_vtt(cues),
        },
    };
    Ok(Export {
        content,
        mime_type: format.mime_type(),
        filename_suffix: format.extension(),
    })
}

/// Render cues as plain text (single-space joined, no timestamps)
pub fn render_text(cues: &[Cue]) -> String {
    flatten(cues)
}

pub fn render_json(cues: &[Cue]) -> Result<String> {
    let rows: Vec<JsonCue> = cues
        .iter()
        .map(|c| JsonCue {
            start: c.start().to_vtt(),
            end: c.end().to_vtt(),
            text: c.text(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn render_srt(cues: &[Cue]) -> String {
    cues.iter()
        .enumerate()
        .map(|(i, c)| format!("{}\n{} --> {}\n{}\n", i + 1, c.start().to_srt(), c.end().to_srt(), c.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_vtt(cues: &[Cue]) -> String {
    let mut out = format!("{VTT_HEADER}\n\n");
    let body = cues
        .iter()
        .map(|c| {
            // cue text is plain, so markup characters must be escaped
            let text = html_escape::encode_text(c.text());
            format!("{} --> {}\n{text}\n", c.start().to_vtt(), c.end().to_vtt())
        })
        .collect::<Vec<_>>()
        .join("\n");
    out.push_str(&body);
    out
}

fn is_well_formed_vtt(raw: &str) -> bool {
    raw.trim_start_matches('\u{feff}').starts_with(VTT_HEADER)
}

/// Strip filesystem-invalid and control characters, collapse whitespace and
/// cap the length. Falls back to `untitled`.
pub fn sanitize_filename(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| !INVALID_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_FILENAME_CHARS).collect();
    let truncated = truncated.trim_end();

    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated.to_string()
    }
}

/// `"{channel} - {title}.{ext}"`, channel omitted when unknown.
pub fn export_filename(metadata: &VideoMetadata, format: ExportFormat) -> String {
    let base = match metadata.channel.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(channel) => format!("{channel} - {}", metadata.title),
        None => metadata.title.clone(),
    };
    format!("{}.{}", sanitize_filename(&base), format.extension())
}

/// Header value suggesting a download filename.
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename.replace('"', ""))
}
