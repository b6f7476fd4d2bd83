//! Token command - exercise the configured key ring.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the token command.
#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Issue a token for a session ID with the newest key
    Encode {
        /// Session name (the cookie name)
        name: String,

        /// Session ID to seal
        id: String,
    },

    /// Open a token with any configured key
    Decode {
        /// Session name the token was issued for
        name: String,

        /// The token
        token: String,

        /// Oldest acceptable token age in seconds [default: configured cookie max age]
        #[arg(long)]
        max_age: Option<i64>,
    },
}

/// Run the token command.
pub async fn run(args: TokenArgs, ctx: &Context) -> Result<()> {
    let codecs = ctx.codecs()?;

    match args.command {
        TokenCommand::Encode { name, id } => {
            let token = codecs
                .encode_multi(&name, &id)
                .context("failed to encode token")?;
            if ctx.json_output {
                println!("{}", serde_json::json!({ "name": name, "token": token }));
            } else {
                println!("{}", token);
            }
        }
        TokenCommand::Decode {
            name,
            token,
            max_age,
        } => {
            let max_age = max_age.unwrap_or_else(|| ctx.loaded.config.cookie_options().max_age);
            let id = codecs
                .decode_multi(&name, &token, max_age)
                .context("failed to decode token")?;
            if ctx.json_output {
                println!("{}", serde_json::json!({ "name": name, "id": id }));
            } else {
                println!("{}", id);
            }
        }
    }
    Ok(())
}
