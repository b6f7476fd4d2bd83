//! Sweep command - delete expired sessions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use cellar_session::{SessionStore, SweepReport};
use clap::Args;
use console::Style;
use tracing::info;

use super::Context;

/// Arguments for the sweep command.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Keep running, sweeping every N seconds until Ctrl-C
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,
}

/// Run the sweep command.
pub async fn run(args: SweepArgs, ctx: &Context) -> Result<()> {
    let store = Arc::new(ctx.open_store()?);

    let Some(secs) = args.watch else {
        let report = sweep_once(&store).await?;
        print_report(&report, ctx)?;
        return Ok(());
    };

    info!("Sweeping every {}s, Ctrl-C to stop", secs);
    let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = sweep_once(&store).await?;
                print_report(&report, ctx)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping sweeper");
                break;
            }
        }
    }
    Ok(())
}

async fn sweep_once(store: &Arc<SessionStore>) -> Result<SweepReport> {
    let store = Arc::clone(store);
    let report = tokio::task::spawn_blocking(move || cellar_session::sweep(&store)).await??;
    Ok(report)
}

fn print_report(report: &SweepReport, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    let green = Style::new().green();
    let dim = Style::new().dim();
    println!(
        "{} Removed {} expired of {} sessions",
        green.apply_to("✓"),
        report.removed,
        report.scanned
    );
    if report.corrupt > 0 {
        let yellow = Style::new().yellow();
        println!(
            "{}",
            yellow.apply_to(format!("{} unreadable records left in place", report.corrupt))
        );
    } else if ctx.verbose {
        println!("{}", dim.apply_to("No unreadable records"));
    }
    Ok(())
}
