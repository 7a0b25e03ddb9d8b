// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

use crate::app_config::{Config, SummarizerProvider};
use crate::volume_packer::OverflowPolicy;
use app_controller::Controller;

mod annotated_writer;
mod app_config;
mod app_controller;
mod caption_processor;
mod errors;
mod file_utils;
mod metadata;
mod providers;
mod summarization;
mod volume_packer;
mod volume_sink;

/// CLI Wrapper for SummarizerProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSummarizerProvider {
    Gemini,
    Ollama,
}

impl From<CliSummarizerProvider> for SummarizerProvider {
    fn from(cli_provider: CliSummarizerProvider) -> Self {
        match cli_provider {
            CliSummarizerProvider::Gemini => SummarizerProvider::Gemini,
            CliSummarizerProvider::Ollama => SummarizerProvider::Ollama,
        }
    }
}

/// CLI Wrapper for OverflowPolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOverflowPolicy {
    DeferToNext,
    SealAfterAppend,
}

impl From<CliOverflowPolicy> for OverflowPolicy {
    fn from(cli_policy: CliOverflowPolicy) -> Self {
        match cli_policy {
            CliOverflowPolicy::DeferToNext => OverflowPolicy::DeferToNext,
            CliOverflowPolicy::SealAfterAppend => OverflowPolicy::SealAfterAppend,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clean subtitle files into annotated transcripts, one .txt per source
    Clean(CleanArgs),

    /// Consolidate channel transcripts into size-bounded volumes
    #[command(alias = "join")]
    Consolidate(ConsolidateArgs),

    /// Generate shell completions for lexis
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct CleanArgs {
    /// Directory containing subtitle files to clean
    #[arg(value_name = "INPUT_DIR", default_value = ".")]
    input_dir: PathBuf,

    /// Force overwrite of existing annotated outputs
    #[arg(short, long)]
    force_overwrite: bool,

    /// Leave fully processed sources in place instead of archiving them
    #[arg(long)]
    no_archive: bool,

    /// Skip summary generation entirely
    #[arg(long)]
    no_summaries: bool,

    /// Summarization provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliSummarizerProvider>,

    /// Model name to use for summarization
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct ConsolidateArgs {
    /// Base directory; itself and each subdirectory is one channel
    #[arg(value_name = "INPUT_DIR", default_value = ".")]
    input_dir: PathBuf,

    /// Volume character budget
    #[arg(short, long)]
    budget: Option<usize>,

    /// What to do when a document would push a volume past the budget
    #[arg(long, value_enum)]
    overflow_policy: Option<CliOverflowPolicy>,

    /// Archive member sources after their volume is durably written
    #[arg(long)]
    archive: bool,

    /// Skip summary generation entirely
    #[arg(long)]
    no_summaries: bool,

    /// Directory consolidated volumes are written into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Summarization provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliSummarizerProvider>,

    /// Model name to use for summarization
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Lexis - Subtitle Transcript Consolidation
///
/// Cleans streaming-caption subtitle files and consolidates them into
/// size-bounded transcript volumes for document-QA ingestion.
#[derive(Parser, Debug)]
#[command(name = "lexis")]
#[command(version = "1.0.0")]
#[command(about = "Subtitle transcript cleaning and consolidation tool")]
#[command(long_about = "Lexis cleans streaming-caption subtitle files (removing roll-up repetition,
timestamps and markup), enriches them with sidecar metadata and AI-generated
summaries, and consolidates channels of transcripts into size-bounded volumes.

EXAMPLES:
    lexis clean ./downloads                 # Annotate every .srt in a folder
    lexis clean -f --no-summaries ./subs    # Re-annotate offline
    lexis consolidate ./channels            # One volume set per channel
    lexis consolidate -b 500000 --archive . # Smaller volumes, move sources
    lexis completions bash > lexis.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different file with --config-path. If the config file doesn't exist, a
    default one will be created automatically. The Gemini credential can be
    supplied via the GEMINI_API_KEY environment variable.

SUPPORTED PROVIDERS:
    gemini - Google Gemini API (requires API key)
    ollama - Local Ollama server (default: llama2)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "lexis", &mut std::io::stdout());
            Ok(())
        }
        Commands::Clean(args) => run_clean(args).await,
        Commands::Consolidate(args) => run_consolidate(args).await,
    }
}

/// Load the configuration file, creating a default one when missing, and
/// apply the shared CLI overrides.
fn load_config(
    config_path: &str,
    provider: Option<CliSummarizerProvider>,
    model: Option<String>,
    log_level: Option<CliLogLevel>,
    no_summaries: bool,
) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Override config with CLI options if provided
    if let Some(cli_provider) = provider {
        config.summarization.provider = cli_provider.into();
    }

    if let Some(model) = model {
        // Find the provider config and update the model
        let provider_str = config.summarization.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .summarization
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model;
        }
    }

    if no_summaries {
        config.summarization.enabled = false;
    }

    if let Some(cli_level) = log_level {
        config.log_level = cli_level.into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    config.apply_env_overrides();
    Ok(config)
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

async fn run_clean(args: CleanArgs) -> Result<()> {
    let config = load_config(
        &args.config_path,
        args.provider,
        args.model,
        args.log_level,
        args.no_summaries,
    )?;

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller
        .run_clean(args.input_dir, args.force_overwrite, !args.no_archive)
        .await
}

async fn run_consolidate(args: ConsolidateArgs) -> Result<()> {
    let mut config = load_config(
        &args.config_path,
        args.provider,
        args.model,
        args.log_level,
        args.no_summaries,
    )?;

    if let Some(budget) = args.budget {
        config.packing.max_volume_chars = budget;
    }
    if let Some(policy) = args.overflow_policy {
        config.packing.overflow_policy = policy.into();
    }
    if let Some(output_dir) = args.output_dir {
        config.processing.output_dir = Some(output_dir.to_string_lossy().into_owned());
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller.run_consolidate(args.input_dir, args.archive).await
}
