//! Key material resolution.
//!
//! For each `[[keys]]` entry the hash key is taken from `hash_env` if that
//! variable is set, otherwise from the inline `hash` value. The block key
//! follows the same rule. Values are standard base64.

use base64::{Engine, engine::general_purpose::STANDARD};
use cellar_session::KeyPair;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::types::KeyConfig;

/// Where a piece of key material came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Environment variable.
    EnvVar(String),
    /// Inline in a config file.
    ConfigFile,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::EnvVar(var) => write!(f, "env var {}", var),
            KeySource::ConfigFile => write!(f, "config file"),
        }
    }
}

/// Resolve every key entry against the process environment.
pub fn resolve_key_pairs(keys: &[KeyConfig]) -> Result<Vec<KeyPair>> {
    resolve_key_pairs_with(keys, |var| std::env::var(var).ok())
}

/// Resolve every key entry, reading variables through `env`.
pub fn resolve_key_pairs_with(
    keys: &[KeyConfig],
    env: impl Fn(&str) -> Option<String>,
) -> Result<Vec<KeyPair>> {
    keys.iter()
        .enumerate()
        .map(|(index, key)| resolve_one(index, key, &env))
        .collect()
}

fn resolve_one(
    index: usize,
    key: &KeyConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<KeyPair> {
    let (hash, source) = lookup(index, key.hash_env.as_deref(), key.hash.as_deref(), env)?
        .ok_or(ConfigError::MissingHashKey { index })?;
    debug!(index, source = %source, "Resolved hash key");

    let mut pair = KeyPair::new(decode(index, "hash", &hash)?);
    if let Some((block, source)) =
        lookup(index, key.block_env.as_deref(), key.block.as_deref(), env)?
    {
        debug!(index, source = %source, "Resolved block key");
        pair = pair.with_block_key(decode(index, "block", &block)?);
    }
    Ok(pair)
}

fn lookup(
    index: usize,
    var: Option<&str>,
    inline: Option<&str>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Option<(String, KeySource)>> {
    if let Some(var) = var {
        return match env(var).filter(|v| !v.is_empty()) {
            Some(value) => Ok(Some((value, KeySource::EnvVar(var.to_string())))),
            None if inline.is_some() => Ok(inline.map(|v| (v.to_string(), KeySource::ConfigFile))),
            None => Err(ConfigError::MissingEnvVar {
                index,
                var: var.to_string(),
            }),
        };
    }
    Ok(inline.map(|v| (v.to_string(), KeySource::ConfigFile)))
}

fn decode(index: usize, field: &'static str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| ConfigError::InvalidKey {
            index,
            field,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn inline(hash: &str) -> KeyConfig {
        KeyConfig {
            hash: Some(hash.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_inline_key() {
        let pairs = resolve_key_pairs_with(&[inline("c2VjcmV0")], env(&[])).unwrap();
        assert_eq!(pairs, vec![KeyPair::new(b"secret".to_vec())]);
    }

    #[test]
    fn test_env_wins_over_inline() {
        let key = KeyConfig {
            hash: Some("c2VjcmV0".to_string()),
            hash_env: Some("HASH".to_string()),
            block_env: Some("BLOCK".to_string()),
            ..Default::default()
        };
        let block = STANDARD.encode([7u8; 32]);
        let pairs =
            resolve_key_pairs_with(&[key], env(&[("HASH", "ZnJvbS1lbnY="), ("BLOCK", &block)]))
                .unwrap();

        assert_eq!(pairs[0].hash_key, b"from-env".to_vec());
        assert_eq!(pairs[0].block_key, Some(vec![7u8; 32]));
    }

    #[test]
    fn test_unset_env_falls_back_to_inline() {
        let key = KeyConfig {
            hash: Some("c2VjcmV0".to_string()),
            hash_env: Some("UNSET".to_string()),
            ..Default::default()
        };
        let pairs = resolve_key_pairs_with(&[key], env(&[])).unwrap();
        assert_eq!(pairs[0].hash_key, b"secret".to_vec());
    }

    #[test]
    fn test_unset_env_without_inline() {
        let key = KeyConfig {
            hash_env: Some("UNSET".to_string()),
            ..Default::default()
        };
        let err = resolve_key_pairs_with(&[key], env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar { index: 0, ref var } if var == "UNSET"));
    }

    #[test]
    fn test_missing_hash_key() {
        let keys = [inline("c2VjcmV0"), KeyConfig::default()];
        let err = resolve_key_pairs_with(&keys, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingHashKey { index: 1 }));
    }

    #[test]
    fn test_invalid_base64() {
        let err = resolve_key_pairs_with(&[inline("not base64!")], env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey { field: "hash", .. }));
        assert!(err.to_string().starts_with("keys[0].hash"));
    }

    #[test]
    fn test_order_preserved() {
        let keys = [inline("bmV3"), inline("b2xk")];
        let pairs = resolve_key_pairs_with(&keys, env(&[])).unwrap();
        assert_eq!(pairs[0].hash_key, b"new".to_vec());
        assert_eq!(pairs[1].hash_key, b"old".to_vec());
    }
}
