//! LoreWiki CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config file
//! - `build`   — Run the book through the agent and save the wiki
//! - `show`    — Print a saved wiki
//! - `chunks`  — Preview how the input is split
//! - `config`  — Show, locate or validate the configuration
//! - `doctor`  — Diagnose setup problems

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "lorewiki",
    about = "LoreWiki — build a fan wiki from a book with an LLM agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default lookup
    #[arg(short, long, global = true, env = "LOREWIKI_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard {
        /// Write ./lorewiki.toml instead of ~/.lorewiki/config.toml
        #[arg(long)]
        local: bool,
    },

    /// Build the wiki from the input documents
    Build {
        /// Update every attribute at the end, whatever its buffer size
        #[arg(long)]
        force: bool,

        /// Directory of input documents
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory the wiki is written to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a saved wiki
    Show {
        /// Directory the wiki was written to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only this section (characters, settings)
        #[arg(short, long)]
        section: Option<String>,

        /// Only this entity (name or alias)
        #[arg(short, long)]
        entity: Option<String>,
    },

    /// Preview how the input documents are chunked
    Chunks {
        /// Directory of input documents
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and provider health
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path in use
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Onboard { local } => commands::onboard::run(local).await?,
        Commands::Build {
            force,
            input,
            output,
        } => commands::build::run(config, force, input, output).await?,
        Commands::Show {
            output,
            section,
            entity,
        } => commands::show::run(config, output, section, entity).await?,
        Commands::Chunks { input } => commands::chunks::run(config, input).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config).await?,
            ConfigAction::Path => commands::config_cmd::path(config).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config).await?,
        },
        Commands::Doctor => commands::doctor::run(config).await?,
    }

    Ok(())
}
