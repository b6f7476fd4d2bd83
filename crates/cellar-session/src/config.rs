//! Configuration for the session store.

/// Bucket used when none is configured.
pub const DEFAULT_BUCKET_NAME: &str = "sessions";

/// TTL in seconds substituted for a zero max age at save time (30 days).
pub const DEFAULT_MAX_AGE: i64 = 86400 * 30;

/// Configuration for a [`SessionStore`](crate::SessionStore).
///
/// Applied once when the store is built; the store never changes it
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Bucket holding the session records.
    pub bucket_name: Option<Vec<u8>>,

    /// Maximum length of an issued or accepted token. 0 means unlimited.
    pub max_length: usize,

    /// Record TTL used when a session is saved with a max age of zero.
    pub default_max_age: i64,
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default().with_defaults()
    }

    /// Set the bucket name.
    pub fn with_bucket_name(mut self, name: impl Into<Vec<u8>>) -> Self {
        self.bucket_name = Some(name.into());
        self
    }

    /// Set the maximum token length.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the TTL substituted for a zero max age.
    pub fn with_default_max_age(mut self, seconds: i64) -> Self {
        self.default_max_age = seconds;
        self
    }

    /// Fill in unset values.
    pub fn apply_defaults(&mut self) {
        if self.bucket_name.is_none() {
            self.bucket_name = Some(DEFAULT_BUCKET_NAME.as_bytes().to_vec());
        }
        if self.default_max_age <= 0 {
            self.default_max_age = DEFAULT_MAX_AGE;
        }
    }

    /// Consuming form of [`apply_defaults`](Self::apply_defaults).
    pub fn with_defaults(mut self) -> Self {
        self.apply_defaults();
        self
    }

    /// The bucket name, falling back to [`DEFAULT_BUCKET_NAME`].
    pub fn bucket_name(&self) -> &[u8] {
        self.bucket_name
            .as_deref()
            .unwrap_or(DEFAULT_BUCKET_NAME.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_defaults() {
        let mut config = Config::default();
        config.apply_defaults();

        assert_eq!(config.bucket_name(), DEFAULT_BUCKET_NAME.as_bytes());
        assert_eq!(config.default_max_age, DEFAULT_MAX_AGE);
        assert_eq!(config.max_length, 0);
    }

    #[test]
    fn test_apply_defaults_keeps_explicit_values() {
        let config = Config::default()
            .with_bucket_name("carts")
            .with_max_length(4096)
            .with_default_max_age(60)
            .with_defaults();

        assert_eq!(config.bucket_name(), b"carts");
        assert_eq!(config.max_length, 4096);
        assert_eq!(config.default_max_age, 60);
    }

    #[test]
    fn test_non_positive_default_max_age_replaced() {
        let config = Config::default().with_default_max_age(-5).with_defaults();
        assert_eq!(config.default_max_age, DEFAULT_MAX_AGE);
    }
}
