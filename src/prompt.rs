//! Prompt assembly for the four AI operations.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::presets::{self, Category, Preset};

/// Roughly 200k tokens of transcript.
pub const DEFAULT_MAX_CHARS: usize = 800_000;

pub const TRUNCATION_MARKER: &str = "\n\n[Transcript truncated due to length]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn of a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Extra inputs that shape a prompt
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    pub max_chars: Option<usize>,
    /// Appended to summarize prompts.
    pub additional_context: Option<String>,
    /// Prepended to search prompts.
    pub previous_context: Option<String>,
    pub history: Vec<ChatTurn>,
}

impl PromptOptions {
    fn ceiling(&self) -> usize {
        self.max_chars.unwrap_or(DEFAULT_MAX_CHARS)
    }
}

/// Cut `text` to at most `max_chars` characters, preferring the last
/// sentence end or newline when it lies past 80% of the ceiling.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let Some((ceiling_byte, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let kept = &text[..ceiling_byte];

    let boundary = kept.rfind(['.', '\n']).map(|byte| (byte, kept[..byte].chars().count()));
    let mut out = match boundary {
        // both '.' and '\n' are one byte wide
        Some((byte, chars)) if chars as f64 > max_chars as f64 * 0.8 => kept[..=byte].to_string(),
        _ => kept.to_string(),
    };
    out.push_str(TRUNCATION_MARKER);
    out
}

fn instruction_block(preset: &Preset) -> String {
    let mut prompt = format!("{}\n\n", preset.user_instruction);
    if let Some(hint) = preset.output_format_hint {
        prompt.push_str(&format!("Output format: {hint}\n\n"));
    }
    prompt
}

pub fn build_summary(text: &str, preset_id: &str, opts: &PromptOptions) -> Result<PromptPair> {
    let preset = presets::lookup(Category::Summary, preset_id)?;
    let mut user = instruction_block(preset);
    user.push_str(&format!("Video Transcript:\n{}", truncate(text, opts.ceiling())));

    if let Some(ctx) = opts.additional_context.as_deref().filter(|c| !c.is_empty()) {
        user.push_str(&format!("\n\nAdditional Context: {ctx}"));
    }

    Ok(PromptPair {
        system: preset.system_instruction.to_string(),
        user,
    })
}

pub fn build_search(text: &str, query: &str, preset_id: &str, opts: &PromptOptions) -> Result<PromptPair> {
    let preset = presets::lookup(Category::Search, preset_id)?;
    let mut user = instruction_block(preset);
    user.push_str(&format!("Video Transcript:\n{}\n\n", truncate(text, opts.ceiling())));
    user.push_str(&format!("Question: {query}"));

    if let Some(ctx) = opts.previous_context.as_deref().filter(|c| !c.is_empty()) {
        user = format!("Previous conversation:\n{ctx}\n\n{user}");
    }

    Ok(PromptPair {
        system: preset.system_instruction.to_string(),
        user,
    })
}

pub fn build_extract(text: &str, preset_id: &str, opts: &PromptOptions) -> Result<PromptPair> {
    let preset = presets::lookup(Category::Extract, preset_id)?;
    let mut user = instruction_block(preset);
    user.push_str(&format!("Video Transcript:\n{}", truncate(text, opts.ceiling())));

    Ok(PromptPair {
        system: preset.system_instruction.to_string(),
        user,
    })
}

/// Chat carries the transcript in the system prompt; the user prompt is the
/// live message, prefixed with prior turns when there are any.
pub fn build_chat(text: &str, message: &str, preset_id: &str, opts: &PromptOptions) -> Result<PromptPair> {
    let preset = presets::lookup(Category::Chat, preset_id)?;
    let system = format!(
        "{}\n\nYou have access to the following video transcript for reference:\n{}",
        preset.system_instruction,
        truncate(text, opts.ceiling())
    );

    let user = if opts.history.is_empty() {
        message.to_string()
    } else {
        format!(
            "Previous conversation:\n{}\n\nCurrent message: {message}",
            flatten_history(&opts.history)
        )
    };

    Ok(PromptPair { system, user })
}

fn flatten_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| {
            let who = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{who}: {}", turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
