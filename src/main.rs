use std::path::PathBuf;
use std::process::{Command, ExitCode};
use std::sync::Arc;

use eyre::Result;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

mod cli;

use cli::{AiArgs, Cli, SourceArg, TranscriptArgs};
use ytscribe::assistant::{AiOptions, Assistant};
use ytscribe::cache::{ResponseCache, Sweeper};
use ytscribe::config::{Config, SourceKind};
use ytscribe::gemini::GeminiClient;
use ytscribe::output::{ExportFormat, content_disposition};
use ytscribe::prompt::{ChatTurn, PromptOptions, Role};
use ytscribe::subtitles::SubtitleService;
use ytscribe::youtube::{InnerTube, TranscriptSource, YtDlp};
use ytscribe::{VideoMetadata, presets};

const EXIT_RATE_LIMITED: u8 = 3;
const EXIT_NOT_FOUND: u8 = 4;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytscribe.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytscribe")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp_line = match tool_version("yt-dlp") {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp          {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp          (not found, needed for --source ytdlp)".to_string(),
    };
    let key_line = if std::env::var_os("GEMINI_API_KEY").is_some() {
        "  \x1b[32m✅\x1b[0m GEMINI_API_KEY  set".to_string()
    } else {
        "  \x1b[31m❌\x1b[0m GEMINI_API_KEY  (not set, needed for AI commands)".to_string()
    };

    format!(
        "\nREQUIREMENTS:\n{yt_dlp_line}\n{key_line}\n\nConfig: {}\nLogs are written to: {}",
        ytscribe::config::config_path().display(),
        log_dir().join("ytscribe.log").display()
    )
}

/// Maps library failures onto distinct exit codes.
fn exit_code(report: &eyre::Report) -> ExitCode {
    match report.downcast_ref::<ytscribe::Error>() {
        Some(e) if e.is_rate_limited() => ExitCode::from(EXIT_RATE_LIMITED),
        Some(ytscribe::Error::NotFound(_)) => ExitCode::from(EXIT_NOT_FOUND),
        _ => ExitCode::FAILURE,
    }
}

fn report_error(report: &eyre::Report) {
    match report.downcast_ref::<ytscribe::Error>() {
        Some(e) => eprintln!("Error: {}", e.user_message()),
        None => eprintln!("Error: {report:?}"),
    }
}

fn make_source(cli: &Cli, config: &Config) -> Box<dyn TranscriptSource> {
    let kind = match cli.source {
        Some(SourceArg::Ytdlp) => SourceKind::Ytdlp,
        Some(SourceArg::Innertube) => SourceKind::Innertube,
        None => config.source.unwrap_or_default(),
    };
    debug!("Using transcript source {kind:?}");
    match kind {
        SourceKind::Ytdlp => Box::new(YtDlp::new()),
        SourceKind::Innertube => Box::new(InnerTube::new(reqwest::Client::new())),
    }
}

fn print_metadata(meta: &VideoMetadata) {
    eprintln!("Video: {} ({})", meta.title, meta.id);
    if let Some(channel) = &meta.channel {
        eprintln!("Channel: {channel}");
    }
    if let Some(date) = &meta.upload_date {
        eprintln!("Uploaded: {date}");
    }
    if let Some(duration) = meta.duration {
        eprintln!("Duration: {duration}s");
    }
}

struct App {
    config: Config,
    verbose: bool,
    service: SubtitleService<Box<dyn TranscriptSource>>,
    cache: Arc<ResponseCache>,
}

impl App {
    fn lang(&self, flag: Option<&str>) -> String {
        flag.or(self.config.default_lang.as_deref()).unwrap_or("en").to_string()
    }

    async fn transcript(&self, input: &TranscriptArgs) -> Result<String> {
        if let Some(path) = &input.text_file {
            debug!("Reading transcript from {}", path.display());
            return Ok(std::fs::read_to_string(path)?);
        }
        let url = input
            .url
            .as_deref()
            .ok_or_else(|| eyre::eyre!("no URL, video ID or --text-file provided"))?;
        let lang = self.lang(input.lang.as_deref());
        let (meta, text) = self.service.transcript_text(url, &lang).await?;
        if self.verbose {
            print_metadata(&meta);
        }
        Ok(text)
    }

    fn assistant(&self) -> Result<Assistant<GeminiClient>> {
        let gemini = GeminiClient::from_env(reqwest::Client::new())?;
        let mut assistant = Assistant::new(gemini, self.cache.clone());
        if self.config.model.is_some() || self.config.fallback_model.is_some() {
            assistant = assistant.with_models(
                self.config
                    .model
                    .clone()
                    .unwrap_or_else(|| ytscribe::assistant::PRIMARY_MODEL.to_string()),
                self.config
                    .fallback_model
                    .clone()
                    .unwrap_or_else(|| ytscribe::assistant::FALLBACK_MODEL.to_string()),
            );
        }
        Ok(assistant)
    }

    fn ai_options(&self, ai: &AiArgs, prompt: PromptOptions) -> AiOptions {
        AiOptions {
            model: ai.model.clone(),
            generation: self.config.generation(),
            prompt: PromptOptions {
                max_chars: ai.max_chars.or(self.config.max_chars),
                ..prompt
            },
        }
    }

    fn print_reply(&self, reply: &ytscribe::assistant::AiReply) {
        println!("{}", reply.text);
        if self.verbose {
            eprintln!("Mode: {}{}", reply.mode, if reply.cached { " (cached)" } else { "" });
        }
    }

    async fn subs(
        &self,
        url: &str,
        lang: Option<&str>,
        format: Option<&str>,
        prefer_generated: bool,
        output: Option<&PathBuf>,
        save: bool,
    ) -> Result<()> {
        let format: ExportFormat = format
            .or(self.config.default_format.as_deref())
            .unwrap_or("txt")
            .parse()?;
        let lang = self.lang(lang);
        let prefer_generated = prefer_generated || self.config.prefer_generated.unwrap_or(false);

        let result = self.service.get_subtitles(url, &lang, format, prefer_generated).await?;

        if self.verbose {
            print_metadata(&result.metadata);
            eprintln!("Language: {}\nFormat: {} ({})", result.language_code, result.format, result.mime_type);
            eprintln!("Content-Disposition: {}", content_disposition(&result.filename));
        }

        let target = match (output, save) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(PathBuf::from(&result.filename)),
            (None, false) => None,
        };
        match target {
            Some(path) => {
                std::fs::write(&path, &result.content)?;
                eprintln!("Saved: {}", path.display());
            }
            None => print!("{}", result.content),
        }
        Ok(())
    }

    async fn chat(&self, input: &TranscriptArgs, mode: &str, ai: &AiArgs) -> Result<()> {
        let text = self.transcript(input).await?;
        let assistant = self.assistant()?;
        let mut history: Vec<ChatTurn> = Vec::new();

        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        eprintln!("Chatting about the video. Empty line or 'exit' to quit.");

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let message = line.trim();
            if message.is_empty() || message == "exit" || message == "quit" {
                break;
            }

            let opts = self.ai_options(
                ai,
                PromptOptions {
                    history: history.clone(),
                    ..Default::default()
                },
            );
            match assistant.chat(&text, message, mode, &opts).await {
                Ok(reply) => {
                    self.print_reply(&reply);
                    history.push(ChatTurn {
                        role: Role::User,
                        content: message.to_string(),
                    });
                    history.push(ChatTurn {
                        role: Role::Assistant,
                        content: reply.text,
                    });
                }
                Err(e) if e.is_upstream() => {
                    warn!("Chat turn failed: {e}");
                    eprintln!("Error: {}", e.user_message());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn dispatch(&self, command: &cli::Command) -> Result<()> {
        use cli::Command as C;

        match command {
            C::Subs {
                url,
                lang,
                format,
                prefer_generated,
                output,
                save,
            } => {
                self.subs(
                    url,
                    lang.as_deref(),
                    format.as_deref(),
                    *prefer_generated,
                    output.as_ref(),
                    *save,
                )
                .await
            }
            C::Summarize { input, mode, context, ai } => {
                let text = self.transcript(input).await?;
                let opts = self.ai_options(
                    ai,
                    PromptOptions {
                        additional_context: context.clone(),
                        ..Default::default()
                    },
                );
                let reply = self.assistant()?.summarize(&text, mode, &opts).await?;
                self.print_reply(&reply);
                Ok(())
            }
            C::Search { input, query, mode, ai } => {
                let text = self.transcript(input).await?;
                let opts = self.ai_options(ai, PromptOptions::default());
                let reply = self.assistant()?.search(&text, &query.join(" "), mode, &opts).await?;
                self.print_reply(&reply);
                Ok(())
            }
            C::Extract { input, extract_type, ai } => {
                let text = self.transcript(input).await?;
                let opts = self.ai_options(ai, PromptOptions::default());
                let reply = self.assistant()?.extract(&text, extract_type, &opts).await?;
                self.print_reply(&reply);
                Ok(())
            }
            C::Chat { input, mode, ai } => self.chat(input, mode, ai).await,
            C::Presets => {
                let catalog = presets::available_presets();
                for (name, list) in [
                    ("summary", &catalog.summary),
                    ("search", &catalog.search),
                    ("extract", &catalog.extract),
                    ("chat", &catalog.chat),
                ] {
                    println!("{name}:");
                    for p in list {
                        println!("  {:<16} {} - {}", p.id, p.label, p.description);
                    }
                }
                Ok(())
            }
        }
    }
}

async fn run() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Config is non-fatal if missing/invalid
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config: {e}");
        Config::default()
    });
    if cli.verbose {
        let config_path = ytscribe::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    let cache = Arc::new(ResponseCache::new(config.cache_options()));
    let sweeper = Sweeper::spawn(cache.clone(), config.sweep_interval());

    let app = App {
        service: SubtitleService::new(make_source(&cli, &config)),
        verbose: cli.verbose,
        cache,
        config,
    };
    let result = app.dispatch(&cli.command).await;

    if app.verbose {
        let stats = app.cache.stats();
        eprintln!("Cache: {}/{} entries", stats.size, stats.max_size);
    }
    sweeper.shutdown().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            report_error(&report);
            exit_code(&report)
        }
    }
}
