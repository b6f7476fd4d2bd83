//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [database]
//! path = "/var/lib/cellar/sessions.db"
//!
//! [store]
//! bucket = "sessions"
//! max_length = 4096
//! default_max_age = 2592000
//!
//! [[keys]]                 # newest first
//! hash_env = "CELLAR_HASH_KEY"
//! block_env = "CELLAR_BLOCK_KEY"
//!
//! [[keys]]                 # retired, still accepted
//! hash = "b2xkLWhhc2gta2V5"
//!
//! [cookie]
//! max_age = 86400
//! path = "/"
//! secure = true
//! ```

use std::path::PathBuf;

use cellar_session::{Config, CookieOptions};
use serde::{Deserialize, Serialize};

/// Application name used for config and data directories.
pub const APP_NAME: &str = "cellar";

/// Database filename inside the data directory.
const DATABASE_FILE: &str = "sessions.db";

/// Placeholder shown instead of key material.
const REDACTED: &str = "<redacted>";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial files can be layered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellarConfig {
    /// Database location.
    pub database: Option<DatabaseConfig>,

    /// Session store settings.
    pub store: Option<StoreConfig>,

    /// Token key pairs, newest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<KeyConfig>,

    /// Cookie attributes.
    pub cookie: Option<CookieConfig>,
}

impl CellarConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole. A non-empty key list replaces the
    /// existing one, since key order matters for rotation.
    pub fn merge(&mut self, other: CellarConfig) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.store.is_some() {
            self.store = other.store;
        }
        if !other.keys.is_empty() {
            self.keys = other.keys;
        }
        if other.cookie.is_some() {
            self.cookie = other.cookie;
        }
    }

    /// Copy with inline key material replaced by a placeholder.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for key in &mut config.keys {
            if key.hash.is_some() {
                key.hash = Some(REDACTED.to_string());
            }
            if key.block.is_some() {
                key.block = Some(REDACTED.to_string());
            }
        }
        config
    }

    /// The database path: configured, or `<data dir>/cellar/sessions.db`.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .as_ref()
            .and_then(|d| d.path.clone())
            .or_else(default_database_path)
    }

    /// Session store configuration, with library defaults for unset fields.
    pub fn session_config(&self) -> Config {
        let mut config = Config::new();
        if let Some(store) = &self.store {
            if let Some(bucket) = &store.bucket {
                config = config.with_bucket_name(bucket.as_bytes());
            }
            if let Some(max_length) = store.max_length {
                config = config.with_max_length(max_length);
            }
            if let Some(max_age) = store.default_max_age {
                config = config.with_default_max_age(max_age);
            }
        }
        config.with_defaults()
    }

    /// Cookie options, with library defaults for unset fields.
    pub fn cookie_options(&self) -> CookieOptions {
        let mut options = CookieOptions::default();
        if let Some(cookie) = &self.cookie {
            if let Some(max_age) = cookie.max_age {
                options.max_age = max_age;
            }
            if let Some(path) = &cookie.path {
                options.path = path.clone();
            }
            if cookie.domain.is_some() {
                options.domain = cookie.domain.clone();
            }
            if let Some(secure) = cookie.secure {
                options.secure = secure;
            }
            if let Some(http_only) = cookie.http_only {
                options.http_only = http_only;
            }
        }
        options
    }
}

/// Default database location in the platform data directory.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_NAME).join(DATABASE_FILE))
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// `[database]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the SQLite file.
    pub path: Option<PathBuf>,
}

/// `[store]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bucket holding session records.
    pub bucket: Option<String>,
    /// Maximum token length; 0 means unlimited.
    pub max_length: Option<usize>,
    /// TTL in seconds used when a cookie has no max age.
    pub default_max_age: Option<i64>,
}

/// One `[[keys]]` entry.
///
/// Each key is base64 (standard alphabet). The `_env` variants name an
/// environment variable holding the same, and win over inline values.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Inline HMAC key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Inline encryption key (32 bytes decoded).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    /// Environment variable holding the HMAC key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_env: Option<String>,
    /// Environment variable holding the encryption key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_env: Option<String>,
}

impl std::fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyConfig")
            .field("hash", &self.hash.as_ref().map(|_| REDACTED))
            .field("block", &self.block.as_ref().map(|_| REDACTED))
            .field("hash_env", &self.hash_env)
            .field("block_env", &self.block_env)
            .finish()
    }
}

/// `[cookie]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Seconds; negative deletes, 0 is a browser-session cookie.
    pub max_age: Option<i64>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
}
