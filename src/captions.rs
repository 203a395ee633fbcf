//! Caption parsing into the canonical cue model.
//!
//! Two inputs are accepted: WebVTT-like text (as written by yt-dlp) and a
//! structured cue list with millisecond offsets (as returned by the timedtext
//! endpoint). Both end up as `Vec<Cue>` with tags stripped and empty cues
//! dropped.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::timecode::{TimeOffset, parse_clock};
use crate::Cue;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

const HEADER: &str = "WEBVTT";
const ARROW: &str = "-->";

/// One entry of a structured caption list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCue {
    pub offset_ms: u64,
    pub duration_ms: u64,
    pub text: String,
}

/// Caption payload as delivered by a transcript source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCaptions {
    Vtt(String),
    Cues(Vec<SourceCue>),
}

impl RawCaptions {
    pub fn to_cues(&self) -> Vec<Cue> {
        match self {
            RawCaptions::Vtt(raw) => parse_vtt(raw),
            RawCaptions::Cues(list) => from_source_cues(list),
        }
    }

    /// The original WebVTT text, when the source delivered one.
    pub fn vtt_text(&self) -> Option<&str> {
        match self {
            RawCaptions::Vtt(raw) => Some(raw),
            RawCaptions::Cues(_) => None,
        }
    }
}

enum State {
    Seeking,
    InCue {
        start: TimeOffset,
        end: TimeOffset,
        text: String,
    },
}

impl State {
    fn flush(self, cues: &mut Vec<Cue>) {
        if let State::InCue { start, end, text } = self {
            // Cue::new drops empty text
            cues.extend(Cue::new(start, end, text));
        }
    }
}

/// Parse WebVTT-like caption text. Never fails: any line that is not a
/// valid timing line is cue text, and text outside a cue is ignored.
pub fn parse_vtt(raw: &str) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut state = State::Seeking;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line == HEADER {
            continue;
        }

        if line.contains(ARROW) {
            match parse_timing(line) {
                Some((start, end)) => {
                    std::mem::replace(&mut state, State::Seeking).flush(&mut cues);
                    state = State::InCue {
                        start,
                        end,
                        text: String::new(),
                    };
                    continue;
                }
                // not a timing line, so it is cue text
                None => debug!("Treating unparsable arrow line as text: {line}"),
            }
        }

        if let State::InCue { text, .. } = &mut state {
            let clean = clean_text(line);
            if clean.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&clean);
        }
    }

    state.flush(&mut cues);
    cues
}

/// Convert a structured cue list, applying the same text cleanup as
/// `parse_vtt`.
pub fn from_source_cues(list: &[SourceCue]) -> Vec<Cue> {
    list.iter()
        .filter_map(|sc| {
            let start = TimeOffset::from_millis(sc.offset_ms);
            let end = start.saturating_add(sc.duration_ms);
            let text = sc.text.lines().map(clean_text).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ");
            Cue::new(start, end, text)
        })
        .collect()
}

/// `TIME --> TIME [settings]`
fn parse_timing(line: &str) -> Option<(TimeOffset, TimeOffset)> {
    let (left, right) = line.split_once(ARROW)?;
    let end_token = right.split_whitespace().next()?;
    let start = parse_clock(left).ok()?;
    let end = parse_clock(end_token).ok()?;
    Some((start, end))
}

fn clean_text(line: &str) -> String {
    let stripped = TAG_RE.replace_all(line, "");
    let decoded = html_escape::decode_html_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> TimeOffset {
        TimeOffset::from_millis(v)
    }

    #[test]
    fn test_parse_basic() {
        let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nHello world\n\n00:00:01.500 --> 00:00:03.000\nThis is a test\n";
        let cues = parse_vtt(raw);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start(), ms(0));
        assert_eq!(cues[0].end(), ms(1500));
        assert_eq!(cues[0].text(), "Hello world");
        assert_eq!(cues[1].text(), "This is a test");
    }

    #[test]
    fn test_multiline_cue_joined_with_space() {
        let raw = "WEBVTT\n\n00:00:01.000 --> 00:00:04.000\nfirst line\nsecond line\n";
        let cues = parse_vtt(raw);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text(), "first line second line");
    }

    #[test]
    fn test_inline_tags_and_settings_stripped() {
        let raw = "WEBVTT\nKind: captions\nLanguage: en\n\n\
00:00:00.160 --> 00:00:02.790 align:start position:0%\n\
we<00:00:00.400><c> are</c><00:00:00.640><c> live</c>\n\
<v Roger>and <b>bold</b>\n";
        let cues = parse_vtt(raw);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start(), ms(160));
        assert_eq!(cues[0].end(), ms(2790));
        assert_eq!(cues[0].text(), "we are live and bold");
    }

    #[test]
    fn test_html_entities_decoded() {
        let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nit&#39;s &amp; done\n";
        assert_eq!(parse_vtt(raw)[0].text(), "it's & done");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_vtt("").is_empty());
    }

    #[test]
    fn test_no_timestamp_lines() {
        assert!(parse_vtt("WEBVTT\n\njust some words\nand more\n").is_empty());
    }

    #[test]
    fn test_cue_without_text_dropped() {
        let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\n00:00:01.000 --> 00:00:02.000\nkept\n00:00:02.000 --> 00:00:03.000\n";
        let cues = parse_vtt(raw);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text(), "kept");
        assert_eq!(cues[0].start(), ms(1000));
    }

    #[test]
    fn test_tag_only_text_dropped() {
        let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\n<c></c>\n";
        assert!(parse_vtt(raw).is_empty());
    }

    #[test]
    fn test_overlapping_cues_kept() {
        let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:05.000\none\n\n00:00:02.000 --> 00:00:03.000\ntwo\n";
        let cues = parse_vtt(raw);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1].start(), ms(2000));
    }

    #[test]
    fn test_malformed_lines_tolerated() {
        let raw = "garbage before\n1\n00:00:00.000 --> 00:00:01.000\nok\nxx --> yy\nstill in cue\n";
        let cues = parse_vtt(raw);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text(), "ok xx --> yy still in cue");
    }

    #[test]
    fn test_arrow_text_only_cue_kept() {
        let raw = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nPress A --> then B\n";
        let cues = parse_vtt(raw);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text(), "Press A --> then B");
    }

    #[test]
    fn test_out_of_range_hours_skipped() {
        let raw = "WEBVTT\n\n99999999999999999:00:00.000 --> 99999999999999999:00:01.000\nboom\n\n00:00:01.000 --> 00:00:02.000\nfine\n";
        let cues = parse_vtt(raw);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text(), "fine");
    }

    #[test]
    fn test_crlf_and_srt_style_commas() {
        let raw = "WEBVTT\r\n\r\n00:00:01,000 --> 00:00:02,000\r\nwindows\r\n";
        let cues = parse_vtt(raw);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text(), "windows");
    }

    #[test]
    fn test_from_source_cues() {
        let list = vec![
            SourceCue {
                offset_ms: 210,
                duration_ms: 2340,
                text: "Hello\nworld".to_string(),
            },
            SourceCue {
                offset_ms: 2550,
                duration_ms: 1500,
                text: "<font color=\"#fff\"></font>".to_string(),
            },
        ];
        let cues = from_source_cues(&list);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start(), ms(210));
        assert_eq!(cues[0].end(), ms(2550));
        assert_eq!(cues[0].text(), "Hello world");
    }

    #[test]
    fn test_raw_captions_dispatch() {
        let raw = RawCaptions::Vtt("WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nhi\n".to_string());
        assert_eq!(raw.to_cues().len(), 1);
        assert!(raw.vtt_text().is_some());
        assert!(RawCaptions::Cues(vec![]).vtt_text().is_none());
    }
}
