//! Built-in AI interaction presets.
//!
//! Presets are grouped by category and looked up by id. Only the public
//! projection (`PresetInfo`) leaves this crate's prompt layer; instruction
//! text stays internal.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Summary,
    Search,
    Extract,
    Chat,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Summary, Category::Search, Category::Extract, Category::Chat];

    /// Fallback preset id; extraction has none.
    pub fn default_id(self) -> Option<&'static str> {
        match self {
            Category::Summary => Some("standard"),
            Category::Search => Some("direct"),
            Category::Chat => Some("default"),
            Category::Extract => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Summary => "summary",
            Category::Search => "search",
            Category::Extract => "extract",
            Category::Chat => "chat",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub system_instruction: &'static str,
    pub user_instruction: &'static str,
    pub output_format_hint: Option<&'static str>,
}

/// What callers outside the prompt layer may see of a preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

impl From<&Preset> for PresetInfo {
    fn from(p: &Preset) -> Self {
        Self {
            id: p.id,
            label: p.label,
            description: p.description,
        }
    }
}

/// Public preset listing, grouped by category
#[derive(Debug, Clone, Serialize)]
pub struct PresetCatalog {
    pub summary: Vec<PresetInfo>,
    pub search: Vec<PresetInfo>,
    pub extract: Vec<PresetInfo>,
    pub chat: Vec<PresetInfo>,
}

struct PresetTable {
    order: Vec<&'static str>,
    by_id: HashMap<&'static str, Preset>,
}

impl PresetTable {
    fn new(presets: Vec<Preset>) -> Self {
        Self {
            order: presets.iter().map(|p| p.id).collect(),
            by_id: presets.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    fn infos(&self) -> Vec<PresetInfo> {
        self.order.iter().filter_map(|id| self.by_id.get(id)).map(PresetInfo::from).collect()
    }
}

const fn preset(
    id: &'static str,
    label: &'static str,
    description: &'static str,
    system_instruction: &'static str,
    user_instruction: &'static str,
    output_format_hint: &'static str,
) -> Preset {
    Preset {
        id,
        label,
        description,
        system_instruction,
        user_instruction,
        output_format_hint: Some(output_format_hint),
    }
}

static REGISTRY: Lazy<HashMap<Category, PresetTable>> = Lazy::new(|| {
    HashMap::from([
        (Category::Summary, PresetTable::new(summary_presets())),
        (Category::Search, PresetTable::new(search_presets())),
        (Category::Extract, PresetTable::new(extract_presets())),
        (Category::Chat, PresetTable::new(chat_presets())),
    ])
});

/// Look up a preset. Unknown ids fall back to the category default, except
/// for extraction where they are an error.
pub fn lookup(category: Category, id: &str) -> Result<&'static Preset> {
    let table = &REGISTRY[&category];
    if let Some(preset) = table.by_id.get(id) {
        return Ok(preset);
    }

    match category.default_id().and_then(|fallback| table.by_id.get(fallback)) {
        Some(preset) => {
            debug!("Unknown {category} preset '{id}', using '{}'", preset.id);
            Ok(preset)
        }
        None => Err(Error::UnknownPreset(format!("{category}/{id}"))),
    }
}

pub fn list(category: Category) -> Vec<PresetInfo> {
    REGISTRY[&category].infos()
}

pub fn available_presets() -> PresetCatalog {
    PresetCatalog {
        summary: list(Category::Summary),
        search: list(Category::Search),
        extract: list(Category::Extract),
        chat: list(Category::Chat),
    }
}

fn summary_presets() -> Vec<Preset> {
    vec![
        preset(
            "tldr",
            "TL;DR",
            "Very short summary for quick scanning",
            "You are a concise summarization expert who distills complex content into its absolute essence.",
            "Create an ultra-brief TL;DR summary in 2-3 sentences. Focus only on the most critical takeaway. Be direct and eliminate all fluff.",
            "Plain text, 2-3 sentences maximum",
        ),
        preset(
            "standard",
            "Standard",
            "Balanced summary with key points",
            "You are a professional content analyst who creates clear, balanced summaries.",
            "Provide a comprehensive yet concise summary that captures the main ideas and important details. Organize into coherent paragraphs. Aim for 5-8 sentences.",
            "Plain text paragraphs",
        ),
        preset(
            "bulletPoints",
            "Bullet Points",
            "Structured list of key takeaways",
            "You are an expert at extracting and organizing information into clear, actionable points.",
            "Extract the main ideas and present them as concise bullet points. Each point should be self-contained and meaningful. Group related points under headings if applicable. Aim for 5-10 key points.",
            "Markdown bullet list with optional headings",
        ),
        preset(
            "eli5",
            "ELI5",
            "Explain like I am 5 - simple explanations",
            "You are a patient teacher who explains complex topics in the simplest possible terms using analogies and everyday language.",
            "Summarize the content as if explaining to someone with no background knowledge. Use simple language, relatable analogies, and avoid jargon. Make it accessible and easy to understand.",
            "Plain, simple language",
        ),
        preset(
            "structured",
            "Structured Summary",
            "Well-organized summary with sections",
            "You are an expert editor and technical writer.",
            "Summarize the transcript using clear sections. Preserve technical accuracy. Do not invent information.",
            "1. Overview\n2. Key Points\n3. Examples or Demonstrations\n4. Final Takeaway",
        ),
    ]
}

fn search_presets() -> Vec<Preset> {
    vec![
        preset(
            "direct",
            "Direct Answer",
            "Concise, straight-to-the-point response",
            "You are a precise question-answering assistant who provides direct, accurate answers without unnecessary elaboration.",
            "Answer the question directly and concisely based on the transcript. If the information is not in the transcript, clearly state that. Cite specific parts when possible.",
            "Direct answer, 2-5 sentences",
        ),
        preset(
            "detailed",
            "Detailed Answer",
            "Comprehensive response with context",
            "You are a thorough analyst who provides complete, well-contextualized answers.",
            "Provide a detailed answer that includes relevant context, explanations, and supporting details from the transcript. Ensure the answer is comprehensive yet well-organized.",
            "Structured detailed response",
        ),
        preset(
            "quote",
            "With Quotes",
            "Answer with relevant quotes from transcript",
            "You are a research assistant who supports answers with direct quotations.",
            "Answer the question and include relevant direct quotes from the transcript to support your response. Indicate quoted material clearly.",
            "Answer with embedded quotes",
        ),
        preset(
            "comparative",
            "Comparative",
            "Compare multiple perspectives or points",
            "You are an analytical thinker who excels at identifying and comparing different viewpoints or aspects.",
            "If the question involves comparison or multiple aspects, structure the answer to clearly present different perspectives, options, or facets. Show relationships and contrasts.",
            "Comparative structure",
        ),
        preset(
            "explained",
            "Explained",
            "Answer with simplified explanations",
            "You are an educator who makes complex information accessible.",
            "Answer the question and explain the concepts in simple terms. Break down any technical or complex ideas into understandable components.",
            "Explained in simple terms",
        ),
    ]
}

fn extract_presets() -> Vec<Preset> {
    vec![
        preset(
            "keyPoints",
            "Key Points",
            "Extract main points and arguments",
            "You are an expert at identifying and extracting the most important points from content.",
            "Extract and list the key points, main arguments, and central ideas from the transcript. Present them in order of importance or logical flow.",
            "Numbered or bulleted list of key points",
        ),
        preset(
            "facts",
            "Facts & Data",
            "Extract factual information, statistics, and data",
            "You are a fact-finder who identifies concrete information, statistics, and verifiable claims.",
            "Extract all factual information, statistics, numbers, dates, and concrete data mentioned in the transcript. Organize them clearly.",
            "Organized list of facts and data",
        ),
        preset(
            "quotes",
            "Notable Quotes",
            "Extract memorable or important quotes",
            "You are a curator of meaningful statements and insights.",
            "Extract the most notable, insightful, or memorable quotes from the transcript. Choose quotes that capture key ideas or powerful statements.",
            "List of quotes with context",
        ),
        preset(
            "resources",
            "Resources & References",
            "Extract mentioned books, tools, links, etc.",
            "You are a resource collector who identifies all mentioned references, tools, and resources.",
            "Extract all mentioned resources including books, tools, websites, people, companies, products, or any other references. Categorize them if helpful.",
            "Categorized list of resources",
        ),
        preset(
            "steps",
            "Steps & Process",
            "Extract procedural information and how-tos",
            "You are a process analyst who identifies and organizes step-by-step information.",
            "Extract any processes, procedures, or step-by-step instructions mentioned in the content. Present them as clear, actionable steps.",
            "Sequential steps or procedures",
        ),
        preset(
            "definitions",
            "Concepts & Definitions",
            "Extract explained terms and concepts",
            "You are a knowledge organizer who identifies and clarifies explained concepts.",
            "Extract all terms, concepts, and ideas that are defined or explained in the transcript. Present each with its explanation.",
            "Term/concept pairs with definitions",
        ),
    ]
}

fn chat_presets() -> Vec<Preset> {
    vec![
        preset(
            "default",
            "Default Chat",
            "Balanced conversational assistant",
            "You are a helpful, knowledgeable assistant who engages in natural conversation about video content. You provide accurate information based on the transcript while being conversational and approachable.",
            "Respond to the user naturally while staying grounded in the transcript content. Be conversational but accurate.",
            "Natural conversation",
        ),
        preset(
            "tutor",
            "Tutor Mode",
            "Educational, patient explanations",
            "You are a patient tutor who helps learners understand the video content. You break down complex ideas, provide examples, and check for understanding.",
            "Engage as a tutor would - explain concepts clearly, use examples, and help the user learn from the video content. Encourage questions and deeper understanding.",
            "Educational dialogue",
        ),
        preset(
            "critic",
            "Critical Analysis",
            "Analytical, questioning perspective",
            "You are a thoughtful critic who analyzes content with a discerning eye. You identify strengths, weaknesses, gaps, and assumptions.",
            "Engage with the content critically. Point out logical gaps, question assumptions, identify what's missing, and provide balanced analysis.",
            "Critical analysis",
        ),
        preset(
            "enthusiast",
            "Enthusiast",
            "Excited, engaging discussion",
            "You are an enthusiastic expert who loves discussing and exploring ideas from the content. You're engaging, excited about interesting points, and help users dive deeper.",
            "Discuss the content with genuine enthusiasm. Highlight fascinating aspects, make connections to broader ideas, and encourage exploration.",
            "Enthusiastic discussion",
        ),
        preset(
            "debater",
            "Devil's Advocate",
            "Challenge ideas and present counterpoints",
            "You are a skilled debater who presents alternative viewpoints and challenges ideas constructively.",
            "Play devil's advocate by presenting counterarguments and alternative perspectives to ideas in the content. Be intellectually honest and constructive.",
            "Argumentative dialogue",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known() {
        assert_eq!(lookup(Category::Summary, "tldr").unwrap().id, "tldr");
        assert_eq!(lookup(Category::Extract, "facts").unwrap().label, "Facts & Data");
    }

    #[test]
    fn test_lookup_falls_back_to_default() {
        assert_eq!(lookup(Category::Summary, "nope").unwrap().id, "standard");
        assert_eq!(lookup(Category::Search, "nope").unwrap().id, "direct");
        assert_eq!(lookup(Category::Chat, "nope").unwrap().id, "default");
    }

    #[test]
    fn test_lookup_unknown_extract_is_error() {
        assert!(matches!(lookup(Category::Extract, "nope"), Err(Error::UnknownPreset(_))));
    }

    #[test]
    fn test_catalog_order_and_shape() {
        let catalog = available_presets();
        let ids: Vec<_> = catalog.summary.iter().map(|p| p.id).collect();
        assert_eq!(ids, ["tldr", "standard", "bulletPoints", "eli5", "structured"]);
        assert_eq!(catalog.search.len(), 5);
        assert_eq!(catalog.extract.len(), 6);
        assert_eq!(catalog.chat.len(), 5);

        let json = serde_json::to_value(&catalog).unwrap();
        let first = json["extract"][0].as_object().unwrap();
        let mut keys: Vec<_> = first.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["description", "id", "label"]);
    }

    #[test]
    fn test_every_category_has_its_default() {
        for category in Category::ALL {
            if let Some(id) = category.default_id() {
                assert!(REGISTRY[&category].by_id.contains_key(id));
            }
        }
    }
}
