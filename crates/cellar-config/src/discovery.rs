//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `$CELLAR_CONFIG_DIR/config.toml`, or `~/.config/cellar/config.toml`
//! 2. `./cellar.toml` (project-local)
//! 3. An explicit file, e.g. from `--config`

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::APP_NAME;
use crate::{CellarConfig, ConfigError, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "cellar.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the user config directory.
const CONFIG_DIR_ENV: &str = "CELLAR_CONFIG_DIR";

/// One config file that was looked for.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Where the file was expected.
    pub path: PathBuf,
    /// Whether it existed and parsed.
    pub loaded: bool,
}

/// Merged configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: CellarConfig,
    /// Sources that were checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Problems with discovered files that were skipped.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Discover and merge config files, with an optional explicit file on top.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(None, None, explicit)
}

/// Load configuration with explicit control over every search location.
///
/// `project_dir` replaces the current directory when looking for
/// `cellar.toml`; `config_dir` overrides both `CELLAR_CONFIG_DIR` and the
/// platform default. Discovered files that fail to parse are skipped with a
/// warning. The explicit file must exist and parse.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = CellarConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    if let Some(path) = explicit {
        config.merge(load_config_file(path)?);
        sources.push(ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        });
    }

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Parse a single config file.
pub fn load_config_file(path: &Path) -> Result<CellarConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    CellarConfig::from_toml(&contents)
}

/// Path of the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// User config directory: `CELLAR_CONFIG_DIR` if set, else the platform
/// default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Merge `path` into `config` if it exists; parse failures become warnings.
fn load_layer(config: &mut CellarConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    let mut source = ConfigSource {
        path: path.to_path_buf(),
        loaded: false,
    };
    if !path.is_file() {
        return source;
    }

    match load_config_file(path) {
        Ok(layer) => {
            debug!("Loaded config layer {:?}", path);
            config.merge(layer);
            source.loaded = true;
        }
        Err(e) => warnings.push(format!("Failed to load {}: {}", path.display(), e)),
    }
    source
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/cellar.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();
        assert_eq!(loaded.config, CellarConfig::new());
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources.len(), 2);
    }

    #[test]
    fn test_layers_override_in_order() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let explicit_dir = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            r#"
[store]
bucket = "from-user"

[cookie]
max_age = 100
"#,
        )
        .unwrap();
        fs::write(
            project.path().join("cellar.toml"),
            r#"
[store]
bucket = "from-project"
"#,
        )
        .unwrap();
        let explicit = explicit_dir.path().join("override.toml");
        fs::write(
            &explicit,
            r#"
[[keys]]
hash = "c2VjcmV0"
"#,
        )
        .unwrap();

        let loaded =
            load_config_with_options(Some(project.path()), Some(user.path()), Some(&explicit))
                .unwrap();
        let config = &loaded.config;

        assert_eq!(config.session_config().bucket_name(), b"from-project");
        assert_eq!(config.cookie_options().max_age, 100);
        assert_eq!(config.keys.len(), 1);
        assert_eq!(loaded.loaded_from().len(), 3);
    }

    #[test]
    fn test_malformed_discovered_file_warns() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(project.path().join("cellar.toml"), "not valid toml {{{{").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("Failed to load"));
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_malformed_explicit_file_fails() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let explicit = project.path().join("bad.toml");
        fs::write(&explicit, "[store\n").unwrap();

        let err = load_config_with_options(Some(project.path()), Some(user.path()), Some(&explicit))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let missing = project.path().join("missing.toml");

        let err = load_config_with_options(Some(project.path()), Some(user.path()), Some(&missing))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
