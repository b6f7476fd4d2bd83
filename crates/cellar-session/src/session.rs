//! The in-memory session handle.

use serde_json::Value;

use crate::codec::Values;

/// Where a handle is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Just constructed; no token looked at yet.
    Unbound,
    /// No usable record: no token, a rejected token, or a missing/expired record.
    New,
    /// A fresh record was found and its values loaded.
    Loaded,
    /// Written to the store and a token issued.
    Saved,
    /// Removed from the store. Terminal.
    Deleted,
}

/// A named session as seen by request-handling code.
///
/// `values` can be changed freely between load and save. The identifier is
/// assigned on first save (or taken from a valid token) and never changes
/// afterwards.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    name: String,
    /// Application data.
    pub values: Values,
    is_new: bool,
    state: SessionState,
}

impl Session {
    /// Create an unbound handle for session `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            values: Values::new(),
            is_new: true,
            state: SessionState::Unbound,
        }
    }

    /// Create a handle bound to an existing identifier.
    pub fn with_id(name: impl Into<String>, id: impl Into<String>) -> Self {
        let mut session = Self::new(name);
        session.id = id.into();
        session
    }

    /// Storage identifier; empty until the first save.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Logical session name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True unless the last load found a valid record.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Bind an identifier if the handle has none yet.
    pub(crate) fn bind_id(&mut self, id: String) {
        if self.id.is_empty() {
            self.id = id;
        }
    }

    pub(crate) fn mark_new(&mut self) {
        self.is_new = true;
        self.state = SessionState::New;
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.is_new = false;
        self.state = SessionState::Loaded;
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_handle() {
        let session = Session::new("test");
        assert_eq!(session.name(), "test");
        assert!(session.id().is_empty());
        assert!(session.is_new());
        assert_eq!(session.state(), SessionState::Unbound);
    }

    #[test]
    fn test_id_never_changes_once_bound() {
        let mut session = Session::with_id("test", "first");
        session.bind_id("second".to_string());
        assert_eq!(session.id(), "first");

        let mut unbound = Session::new("test");
        unbound.bind_id("assigned".to_string());
        assert_eq!(unbound.id(), "assigned");
    }

    #[test]
    fn test_values() {
        let mut session = Session::new("test");
        assert_eq!(session.insert("foo", "bar"), None);
        assert_eq!(session.insert("foo", 42), Some(json!("bar")));
        assert_eq!(session.get("foo"), Some(&json!(42)));
        assert_eq!(session.remove("foo"), Some(json!(42)));
        assert!(session.values.is_empty());
    }
}
