//! `rally` binary: runs the bot or inspects a rally record offline.

mod inspect;

use std::io::{IsTerminal, stdout};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rally_core::RallyConfig;
use rally_telegram::{RallyDaemon, TelegramService};

/// Color output mode for terminal display.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if stdout is a TTY
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorMode {
    fn should_use_colors(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stdout().is_terminal(),
        }
    }
}

/// Rally - Telegram sign-up sheets that live in the message itself
#[derive(Parser, Debug)]
#[command(name = "rally", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, default_value = "rally.yml", global = true)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Color output mode (auto, always, never)
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    color: ColorMode,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot (default if no subcommand given)
    Run,

    /// Decode a rally message text and check that it re-encodes exactly
    Inspect {
        /// File holding the message text, or `-` for stdin
        #[arg(default_value = "-")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_ansi(cli.color.should_use_colors())
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&cli.config).await,
        Commands::Inspect { path } => inspect::run(&path, &mut stdout().lock()),
    }
}

async fn run(config_path: &std::path::Path) -> anyhow::Result<()> {
    let config = RallyConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    info!(config = ?config, "configuration loaded");

    let service = TelegramService::new(config.bot_token.clone(), config.poll_timeout_secs)?;
    RallyDaemon::new(service, config).run().await
}
