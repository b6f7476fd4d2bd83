//! Remove command - delete a session by ID.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the remove command.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Session ID
    pub id: String,
}

/// Run the remove command.
pub async fn run(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    store.remove(&args.id)?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "removed": args.id }));
    } else {
        let green = Style::new().green();
        println!("{} Session removed: {}", green.apply_to("✓"), args.id);
    }
    Ok(())
}
