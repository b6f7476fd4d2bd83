//! Configuration for Cellar.
//!
//! TOML files with:
//! - `[database]`: where the session database lives
//! - `[store]`: bucket name, token length limit, default record TTL
//! - `[[keys]]`: token key pairs, newest first, given inline or via env vars
//! - `[cookie]`: attributes for issued cookies
//!
//! Files are layered (user config dir, then `./cellar.toml`, then an
//! explicit `--config` file), later layers overriding earlier ones.

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options, xdg_config_dir,
    xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{KeySource, resolve_key_pairs, resolve_key_pairs_with};
pub use types::*;
