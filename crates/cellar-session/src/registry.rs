//! Per-request session registry.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use cellar_store::Bucket;
use tracing::debug;

use crate::codec::PayloadCodec;
use crate::error::Result;
use crate::session::Session;
use crate::store::SessionStore;
use crate::transport::Transport;

/// Keeps one handle per session name for the life of a request.
///
/// Create one per request, fetch sessions with [`get`](Self::get), and call
/// [`save_all`](Self::save_all) before the response goes out.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<String, Session>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session called `name`, opening it on first use.
    ///
    /// A rejected token is not an error here: the caller just gets an empty
    /// new session. Store and corruption errors are returned and nothing is
    /// cached.
    pub fn get<B: Bucket, P: PayloadCodec>(
        &mut self,
        store: &SessionStore<B, P>,
        transport: &dyn Transport,
        name: &str,
    ) -> Result<&mut Session> {
        match self.sessions.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let (session, error) = store.new_session(transport, name);
                match error {
                    Some(e) if e.is_token() => {
                        debug!(name, error = %e, "Ignoring invalid session token");
                    }
                    Some(e) => return Err(e),
                    None => {}
                }
                Ok(entry.insert(session))
            }
        }
    }

    /// Save every session in the registry, stopping at the first error.
    pub fn save_all<B: Bucket, P: PayloadCodec>(
        &mut self,
        store: &SessionStore<B, P>,
        transport: &mut dyn Transport,
    ) -> Result<()> {
        for session in self.sessions.values_mut() {
            store.save(transport, session)?;
        }
        Ok(())
    }

    /// Number of sessions opened so far.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session has been opened.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, KeyPair, MemoryTransport};
    use cellar_store::Database;

    fn store() -> SessionStore {
        let db = Database::open_in_memory().unwrap();
        SessionStore::new(&db, Config::new(), &[KeyPair::new(b"secret".to_vec())]).unwrap()
    }

    #[test]
    fn test_get_returns_same_handle() {
        let store = store();
        let transport = MemoryTransport::new();
        let mut registry = Registry::new();

        registry
            .get(&store, &transport, "test")
            .unwrap()
            .insert("foo", "bar");
        let again = registry.get(&store, &transport, "test").unwrap();
        assert_eq!(again.get("foo").and_then(|v| v.as_str()), Some("bar"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_ignores_bad_token() {
        let store = store();
        let transport = MemoryTransport::new().with_token("test", "garbage");
        let mut registry = Registry::new();

        let session = registry.get(&store, &transport, "test").unwrap();
        assert!(session.is_new());
        assert!(session.id().is_empty());
    }

    #[test]
    fn test_save_all() {
        let store = store();
        let mut transport = MemoryTransport::new();
        let mut registry = Registry::new();

        for name in ["cart", "auth"] {
            registry.get(&store, &transport, name).unwrap().insert("n", name);
        }
        registry.save_all(&store, &mut transport).unwrap();

        assert!(transport.issued_token("cart").is_some());
        assert!(transport.issued_token("auth").is_some());
        assert_eq!(store.ids().unwrap().len(), 2);
    }

    #[test]
    fn test_get_surfaces_store_errors() {
        let db = Database::open_in_memory().unwrap();
        let keys = [KeyPair::new(b"secret".to_vec())];
        let store = SessionStore::new(&db, Config::new(), &keys).unwrap();
        let token = store.codecs().encode_multi("test", "some-id").unwrap();
        db.close();

        let transport = MemoryTransport::new().with_token("test", token);
        let mut registry = Registry::new();
        let err = registry.get(&store, &transport, "test").unwrap_err();
        assert!(err.is_unavailable());
        assert!(registry.is_empty());
    }
}
