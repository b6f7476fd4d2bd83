//! Inspect command - one session's record and values.

use anyhow::{Result, bail};
use clap::Args;
use console::{Style, style};

use super::{Context, format_timestamp};

/// Arguments for the inspect command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Session ID
    pub id: String,
}

/// Run the inspect command.
pub async fn run(args: InspectArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let Some((record, values)) = store.inspect(&args.id)? else {
        bail!("session '{}' not found", args.id);
    };
    let expired = record.is_expired(store.now());

    if ctx.json_output {
        let output = serde_json::json!({
            "id": args.id,
            "created_at": record.created_at,
            "max_age": record.max_age,
            "expires_at": record.expires_at(),
            "expired": expired,
            "values": values,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style("Session").bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    println!("ID:         {}", args.id);
    println!("Created:    {}", format_timestamp(record.created_at));
    println!("Max age:    {}s", record.max_age);
    if let Some(expires_at) = record.expires_at() {
        let label = if expired {
            style("expired").yellow()
        } else {
            style("active").green()
        };
        println!("Expires:    {} ({})", format_timestamp(expires_at), label);
    }
    println!();
    println!("{}", style("Values").bold());
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}
