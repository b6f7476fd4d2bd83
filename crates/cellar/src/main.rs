//! Cellar - embedded server-side session store
//!
//! Operator CLI for inspecting and maintaining a session database.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, inspect, list, remove, sweep, token};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Cellar - embedded server-side session store
#[derive(Parser)]
#[command(name = "cellar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file, layered over the discovered ones
    #[arg(long, global = true, env = "CELLAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Session database path (overrides [database] path)
    #[arg(long, global = true, env = "CELLAR_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List stored sessions
    List(list::ListArgs),

    /// Show a stored session's record and values
    Inspect(inspect::InspectArgs),

    /// Delete a stored session
    Remove(remove::RemoveArgs),

    /// Delete expired sessions
    Sweep(sweep::SweepArgs),

    /// Encode or decode session tokens with the configured keys
    Token(token::TokenArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "cellar=debug,cellar_session=debug,cellar_store=debug,cellar_cookie=debug,cellar_config=debug,info"
    } else {
        "cellar=info,cellar_session=info,cellar_store=warn,cellar_config=warn,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
                ),
        )
        .init();

    let loaded = cellar_config::load_config(cli.config.as_deref())?;
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let ctx = commands::Context {
        db_path: cli.db.or_else(|| loaded.config.database_path()),
        loaded,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::List(args) => list::run(args, &ctx).await,
        Commands::Inspect(args) => inspect::run(args, &ctx).await,
        Commands::Remove(args) => remove::run(args, &ctx).await,
        Commands::Sweep(args) => sweep::run(args, &ctx).await,
        Commands::Token(args) => token::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
