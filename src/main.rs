// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use vidnarrate::app_config::{self, Config};
use vidnarrate::app_controller::Controller;
use vidnarrate::server::shutdown_signal;

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
    /// Serve the HTTP API (default command)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate one video from a prompt and print its path
    Generate {
        /// What the video should be about
        #[arg(value_name = "PROMPT")]
        prompt: String,
    },

    /// Download vertical background videos for a topic
    FetchBackgrounds {
        /// Search topic, e.g. "ocean waves"
        #[arg(value_name = "TOPIC")]
        topic: String,
    },

    /// Generate shell completions for vidnarrate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// vidnarrate - narrated short videos from a prompt
#[derive(Parser, Debug)]
#[command(name = "vidnarrate")]
#[command(version)]
#[command(about = "Generate narrated videos from a text prompt")]
#[command(long_about = "vidnarrate writes a narration with a language model, turns it into speech,
and composes it over a background video with burned-in captions.

EXAMPLES:
    vidnarrate                                   # Serve the HTTP API on the configured port
    vidnarrate serve --port 8080                 # Serve on another port
    vidnarrate generate \"Explain gravity\"        # One-shot generation
    vidnarrate fetch-backgrounds \"ocean waves\"   # Fill the background pool from Pixabay
    vidnarrate completions bash > vidnarrate.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. OLLAMA_URL, OLLAMA_MODEL, TEXT_PROVIDER,
    SPEECH_GENERATION_API, SPEECH_PROVIDER, PIXABAY_API_KEY and PIXABAY_VIDEO_API
    override it (a .env file is read too).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long = "config", global = true, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
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

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
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
            let (color, tag) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Max level is lowered or raised once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "vidnarrate", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let controller = Controller::with_config(config)?;

    match cli.command {
        Some(Commands::Generate { prompt }) => {
            let video = controller.run_generate(&prompt).await?;
            println!("{}", video.display());
        }
        Some(Commands::FetchBackgrounds { topic }) => {
            let saved = controller.fetch_backgrounds(&topic).await?;
            for path in saved {
                println!("{}", path.display());
            }
        }
        Some(Commands::Serve { port: Some(port) }) => {
            let mut config = controller.config().clone();
            config.server.port = port;
            Controller::with_config(config)?.run_server(shutdown_signal()).await?;
        }
        Some(Commands::Serve { port: None }) | None => {
            controller.run_server(shutdown_signal()).await?;
        }
        Some(Commands::Completions { .. }) => {}
    }

    Ok(())
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("Failed to read .env file"),
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    config.apply_env_overrides();

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}
