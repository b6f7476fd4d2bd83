//! CLI command handlers.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use cellar_config::LoadedConfig;
use cellar_session::{CodecSet, KeyPair, SessionStore};
use cellar_store::Database;

pub mod config;
pub mod inspect;
pub mod list;
pub mod remove;
pub mod sweep;
pub mod token;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Discovered and merged configuration.
    pub loaded: LoadedConfig,
    /// Database path from `--db` or the config.
    pub db_path: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Resolve the configured key pairs.
    pub fn key_pairs(&self) -> Result<Vec<KeyPair>> {
        cellar_config::resolve_key_pairs(&self.loaded.config.keys)
            .context("failed to resolve session keys")
    }

    /// Build the key ring, failing if no keys are configured.
    pub fn codecs(&self) -> Result<CodecSet> {
        let keys = self.key_pairs()?;
        if keys.is_empty() {
            bail!("no session keys configured; add a [[keys]] section to your config");
        }
        let max_length = self.loaded.config.session_config().max_length;
        Ok(CodecSet::from_key_pairs(&keys, max_length)?)
    }

    /// Open the database and the session store over it.
    pub fn open_store(&self) -> Result<SessionStore> {
        let Some(path) = self.db_path.as_deref() else {
            bail!("no database path; pass --db or set [database] path");
        };
        let db = Database::open(path)
            .with_context(|| format!("failed to open session database {}", path.display()))?;
        let store = SessionStore::new(&db, self.loaded.config.session_config(), &self.key_pairs()?)?;
        Ok(store)
    }
}

/// Render a unix timestamp for humans.
pub(crate) fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
