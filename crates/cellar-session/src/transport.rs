//! Token transport: the request/response side of a session.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Cookie attributes applied when a token is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    /// Cookie path.
    pub path: String,
    /// Cookie domain, if restricted.
    pub domain: Option<String>,
    /// Lifetime in seconds. Negative deletes the session, zero means a
    /// browser-session cookie (the record gets the store's default TTL).
    pub max_age: i64,
    /// Only send over HTTPS.
    pub secure: bool,
    /// Hide from client-side scripts.
    pub http_only: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            max_age: 0,
            secure: false,
            http_only: true,
        }
    }
}

impl CookieOptions {
    /// Set the max age.
    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self
    }
}

/// Reads incoming tokens and writes outgoing ones.
///
/// Implement this over your HTTP framework's request/response pair.
pub trait Transport {
    /// The token the client sent for session `name`, if any.
    fn token(&self, name: &str) -> Option<String>;

    /// Cookie options for this request.
    fn options(&self) -> &CookieOptions;

    /// Write `token` for session `name`. An empty token clears the cookie.
    fn set_token(&mut self, name: &str, token: &str, options: &CookieOptions);
}

/// A token written to a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Session name.
    pub name: String,
    /// Token value; empty when the cookie was cleared.
    pub value: String,
    /// Options the token was written with.
    pub options: CookieOptions,
}

/// In-memory transport for tests, tools, and non-HTTP callers.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    incoming: HashMap<String, String>,
    options: CookieOptions,
    issued: Vec<IssuedToken>,
}

impl MemoryTransport {
    /// Create a transport with no incoming tokens and default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an incoming token.
    pub fn with_token(mut self, name: impl Into<String>, token: impl Into<String>) -> Self {
        self.incoming.insert(name.into(), token.into());
        self
    }

    /// Replace the cookie options.
    pub fn with_options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the max age of the cookie options.
    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.options.max_age = max_age;
        self
    }

    /// Mutable access to the cookie options.
    pub fn options_mut(&mut self) -> &mut CookieOptions {
        &mut self.options
    }

    /// Every token written so far, oldest first.
    pub fn issued(&self) -> &[IssuedToken] {
        &self.issued
    }

    /// The most recent token written for `name`.
    pub fn issued_token(&self, name: &str) -> Option<String> {
        self.issued
            .iter()
            .rev()
            .find(|t| t.name == name)
            .map(|t| t.value.clone())
    }
}

impl Transport for MemoryTransport {
    fn token(&self, name: &str) -> Option<String> {
        self.incoming.get(name).cloned()
    }

    fn options(&self) -> &CookieOptions {
        &self.options
    }

    fn set_token(&mut self, name: &str, token: &str, options: &CookieOptions) {
        self.issued.push(IssuedToken {
            name: name.to_string(),
            value: token.to_string(),
            options: options.clone(),
        });
    }
}
