use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceArg {
    Ytdlp,
    Innertube,
}

#[derive(Parser)]
#[command(
    name = "ytscribe",
    about = "YouTube subtitle exporter with AI summaries, Q&A, extraction and chat",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Transcript source (default from config, else yt-dlp)
    #[arg(long, value_enum, global = true)]
    pub source: Option<SourceArg>,

    /// Show metadata and cache statistics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export subtitles as txt, json, srt or vtt
    Subs {
        /// YouTube video URL or video ID
        url: String,

        /// Preferred caption language
        #[arg(short, long)]
        lang: Option<String>,

        /// Output format: txt, json, srt, vtt
        #[arg(short, long)]
        format: Option<String>,

        /// Prefer auto-generated captions over manual ones
        #[arg(long)]
        prefer_generated: bool,

        /// Write output to file instead of stdout
        #[arg(short, long, conflicts_with = "save")]
        output: Option<PathBuf>,

        /// Write output to a file named after the video
        #[arg(long)]
        save: bool,
    },

    /// Summarize a video
    Summarize {
        #[command(flatten)]
        input: TranscriptArgs,

        /// Summary style (see `ytscribe presets`)
        #[arg(short, long, default_value = "standard")]
        mode: String,

        /// Extra context appended to the prompt
        #[arg(long)]
        context: Option<String>,

        #[command(flatten)]
        ai: AiArgs,
    },

    /// Ask a question about a video
    Search {
        #[command(flatten)]
        input: TranscriptArgs,

        /// The question
        #[arg(short, long, required = true, num_args = 1..)]
        query: Vec<String>,

        /// Answer style (see `ytscribe presets`)
        #[arg(short, long, default_value = "direct")]
        mode: String,

        #[command(flatten)]
        ai: AiArgs,
    },

    /// Extract structured information from a video
    Extract {
        #[command(flatten)]
        input: TranscriptArgs,

        /// What to extract (see `ytscribe presets`)
        #[arg(short = 't', long = "type")]
        extract_type: String,

        #[command(flatten)]
        ai: AiArgs,
    },

    /// Chat about a video, one message per line on stdin
    Chat {
        #[command(flatten)]
        input: TranscriptArgs,

        /// Chat persona (see `ytscribe presets`)
        #[arg(short, long, default_value = "default")]
        mode: String,

        #[command(flatten)]
        ai: AiArgs,
    },

    /// List the available AI presets
    Presets,
}

#[derive(Args)]
pub struct TranscriptArgs {
    /// YouTube video URL or video ID
    #[arg(required_unless_present = "text_file")]
    pub url: Option<String>,

    /// Use a local transcript instead of fetching one
    #[arg(long, conflicts_with = "url")]
    pub text_file: Option<PathBuf>,

    /// Preferred caption language
    #[arg(short, long)]
    pub lang: Option<String>,
}

#[derive(Args)]
pub struct AiArgs {
    /// Gemini model (no fallback when set)
    #[arg(long)]
    pub model: Option<String>,

    /// Transcript character limit before truncation
    #[arg(long)]
    pub max_chars: Option<usize>,
}
