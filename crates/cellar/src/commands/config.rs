//! Config command - configuration inspection.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration (key material redacted)
    Show,

    /// Show which config files were checked and loaded
    Which,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let config = &ctx.loaded.config;
    let session = config.session_config();
    let cookie = config.cookie_options();

    if ctx.json_output {
        let output = serde_json::json!({
            "database": ctx.db_path,
            "bucket": String::from_utf8_lossy(session.bucket_name()),
            "max_length": session.max_length,
            "default_max_age": session.default_max_age,
            "keys": config.keys.len(),
            "cookie": cookie,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("# Cellar Configuration\n");
    let sources = ctx.loaded.loaded_from();
    if sources.is_empty() {
        println!("# No config files loaded (using defaults)\n");
    } else {
        for source in sources {
            println!("# Loaded from {}", source.display());
        }
        println!();
    }
    print!("{}", config.redacted().to_toml()?);

    if ctx.verbose {
        let dim = Style::new().dim();
        println!();
        println!(
            "{}",
            dim.apply_to(format!(
                "# Effective: bucket={} max_length={} default_max_age={}s cookie.max_age={}s",
                String::from_utf8_lossy(session.bucket_name()),
                session.max_length,
                session.default_max_age,
                cookie.max_age
            ))
        );
    }
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    if ctx.json_output {
        let sources: Vec<_> = ctx
            .loaded
            .sources
            .iter()
            .map(|s| serde_json::json!({ "path": s.path, "loaded": s.loaded }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style("Config sources (lowest precedence first)").bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    for source in &ctx.loaded.sources {
        let status = if source.loaded {
            style("loaded").green()
        } else {
            style("not found").dim()
        };
        println!("{}  {}", source.path.display(), status);
    }
    for warning in &ctx.loaded.warnings {
        println!("{}", style(warning).yellow());
    }
    Ok(())
}
