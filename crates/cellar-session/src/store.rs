//! The session lifecycle engine.

use std::sync::Arc;

use cellar_cookie::{CodecSet, KeyPair};
use cellar_store::{Bucket, Database, SqliteBucket};
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::codec::{JsonCodec, PayloadCodec, Values};
use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::id::generate_id;
use crate::record::SessionRecord;
use crate::session::{Session, SessionState};
use crate::transport::Transport;

/// Creates, loads, saves, and deletes sessions.
///
/// One store is built per process and shared by every request. All
/// operations take `&self`; each storage access runs in its own transaction.
pub struct SessionStore<B: Bucket = SqliteBucket, P: PayloadCodec = JsonCodec> {
    bucket: B,
    codecs: CodecSet,
    payload: P,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl<B: Bucket, P: PayloadCodec> std::fmt::Debug for SessionStore<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("bucket", &String::from_utf8_lossy(self.bucket.name()))
            .field("codecs", &self.codecs.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Build a store over `db`.
    ///
    /// Applies config defaults, creates the bucket if it does not exist, and
    /// builds the key ring from `keys` (newest first) with the configured
    /// maximum token length.
    pub fn new(db: &Database, config: Config, keys: &[KeyPair]) -> Result<Self> {
        let config = config.with_defaults();
        let bucket = db.bucket(config.bucket_name())?;
        Self::with_bucket(bucket, config, keys)
    }
}

impl<B: Bucket> SessionStore<B> {
    /// Build a store over an already-opened bucket.
    pub fn with_bucket(bucket: B, config: Config, keys: &[KeyPair]) -> Result<Self> {
        let config = config.with_defaults();
        let codecs = CodecSet::from_key_pairs(keys, config.max_length)?;

        debug!(
            bucket = %String::from_utf8_lossy(bucket.name()),
            keys = codecs.len(),
            max_length = config.max_length,
            "Session store ready"
        );

        Ok(Self {
            bucket,
            codecs,
            payload: JsonCodec,
            clock: Arc::new(SystemClock),
            config,
        })
    }
}

impl<B: Bucket, P: PayloadCodec> SessionStore<B, P> {
    /// Swap the payload codec.
    pub fn with_payload_codec<Q: PayloadCodec>(self, payload: Q) -> SessionStore<B, Q> {
        SessionStore {
            bucket: self.bucket,
            codecs: self.codecs,
            payload,
            clock: self.clock,
            config: self.config,
        }
    }

    /// Swap the time source.
    ///
    /// Governs both record expiry and the issue time stamped into tokens.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The configuration in effect (defaults applied).
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The key ring.
    pub fn codecs(&self) -> &CodecSet {
        &self.codecs
    }

    /// The bucket holding the records.
    pub fn bucket(&self) -> &B {
        &self.bucket
    }

    /// The payload codec.
    pub fn payload_codec(&self) -> &P {
        &self.payload
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Open the session called `name` for the current request.
    ///
    /// The handle is always returned. With no incoming token it is a fresh
    /// session and the error is `None`. If the token is rejected, or the
    /// record behind it cannot be loaded, the handle is still new and the
    /// error comes back alongside it. Never writes to the store except to
    /// remove an expired record.
    pub fn new_session(
        &self,
        transport: &dyn Transport,
        name: &str,
    ) -> (Session, Option<SessionError>) {
        let mut session = Session::new(name);
        session.mark_new();

        let token = match transport.token(name) {
            Some(token) if !token.is_empty() => token,
            _ => return (session, None),
        };

        match self.codecs.decode_multi_at(
            name,
            &token,
            transport.options().max_age,
            self.clock.now(),
        ) {
            Ok(id) => {
                session.bind_id(id);
                match self.load(&mut session) {
                    Ok(_) => (session, None),
                    Err(e) => (session, Some(e)),
                }
            }
            Err(e) => {
                debug!(name, error = %e, "Session token rejected");
                (session, Some(e.into()))
            }
        }
    }

    /// Load the record for the handle's id into its values.
    ///
    /// Returns `true` if a fresh record was found. A missing or expired
    /// record returns `false` and leaves the handle new; an expired one is
    /// deleted on the way. A record that fails to decode is an error and is
    /// left in place.
    pub fn load(&self, session: &mut Session) -> Result<bool> {
        session.mark_new();
        if session.id().is_empty() {
            return Ok(false);
        }

        let id = session.id().as_bytes();
        let Some(bytes) = self.bucket.get(id)? else {
            trace!(name = session.name(), "No stored record");
            session.values.clear();
            return Ok(false);
        };

        let record = SessionRecord::decode(&bytes)?;
        let now = self.clock.now();
        if record.is_expired(now) {
            self.remove_expired(id, now)?;
            session.values.clear();
            return Ok(false);
        }

        session.values = record.values(&self.payload)?;
        session.mark_loaded();
        debug!(name = session.name(), "Session loaded");
        Ok(true)
    }

    /// Re-run [`load`](Self::load) on an existing handle.
    ///
    /// Keeps the identifier; only the values and the new flag change.
    pub fn reload(&self, session: &mut Session) -> Result<bool> {
        if session.state() == SessionState::Deleted {
            return Err(SessionError::Deleted(session.name().to_string()));
        }
        self.load(session)
    }

    /// Persist the handle and issue its token.
    ///
    /// The transport's max age decides what happens:
    /// - negative: the record is deleted and a clearing (empty) token written
    /// - zero: saved with the configured default TTL
    /// - positive: saved with that TTL
    ///
    /// An id is generated on first save. If encoding, the write, or token
    /// issue fails, no token is written.
    pub fn save(&self, transport: &mut dyn Transport, session: &mut Session) -> Result<()> {
        let options = transport.options().clone();

        if options.max_age < 0 {
            let result = self.delete(session);
            transport.set_token(session.name(), "", &options);
            return result;
        }
        if session.state() == SessionState::Deleted {
            return Err(SessionError::Deleted(session.name().to_string()));
        }

        if session.id().is_empty() {
            session.bind_id(generate_id()?);
        }

        let max_age = if options.max_age == 0 {
            self.config.default_max_age
        } else {
            options.max_age
        };
        let now = self.clock.now();
        let record = SessionRecord::from_values(&self.payload, &session.values, now, max_age)?;
        self.bucket.put(session.id().as_bytes(), &record.encode()?)?;

        let token = self.codecs.encode_multi_at(session.name(), session.id(), now)?;
        transport.set_token(session.name(), &token, &options);
        session.set_state(SessionState::Saved);

        debug!(name = session.name(), max_age, "Session saved");
        Ok(())
    }

    /// Delete the handle's record. The handle cannot be saved afterwards.
    pub fn delete(&self, session: &mut Session) -> Result<()> {
        self.remove(session.id())?;
        session.set_state(SessionState::Deleted);
        debug!(name = session.name(), "Session deleted");
        Ok(())
    }

    /// Delete a record by id. Deleting an unknown id succeeds.
    pub fn remove(&self, id: &str) -> Result<()> {
        self.bucket.delete(id.as_bytes())?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────

    /// Read a record and its values without any expiry side effects.
    pub fn inspect(&self, id: &str) -> Result<Option<(SessionRecord, Values)>> {
        let Some(bytes) = self.bucket.get(id.as_bytes())? else {
            return Ok(None);
        };
        let record = SessionRecord::decode(&bytes)?;
        let values = record.values(&self.payload)?;
        Ok(Some((record, values)))
    }

    /// Every stored id, in key order.
    pub fn ids(&self) -> Result<Vec<String>> {
        Ok(self
            .bucket
            .keys()?
            .into_iter()
            .map(|key| String::from_utf8_lossy(&key).into_owned())
            .collect())
    }

    /// Delete the record under `id` if it is still expired at `now`.
    ///
    /// The check is repeated inside the write transaction, so a record
    /// refreshed by a concurrent save survives.
    pub(crate) fn remove_expired(&self, id: &[u8], now: i64) -> Result<bool> {
        let removed = self.bucket.delete_if(id, &mut |current| {
            SessionRecord::decode(current).is_ok_and(|record| record.is_expired(now))
        })?;
        if removed {
            debug!(id = %String::from_utf8_lossy(id), "Expired session removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::transport::MemoryTransport;

    const NOW: i64 = 1_700_000_000;

    fn store() -> (SessionStore, Arc<ManualClock>) {
        let db = Database::open_in_memory().unwrap();
        let clock = Arc::new(ManualClock::new(NOW));
        let store = SessionStore::new(&db, Config::new(), &[KeyPair::new(b"secret".to_vec())])
            .unwrap()
            .with_clock(clock.clone());
        (store, clock)
    }

    #[test]
    fn test_new_store_creates_bucket() {
        let db = Database::open_in_memory().unwrap();
        let store = SessionStore::new(&db, Config::default(), &[]).unwrap();
        assert!(db.has_bucket(b"sessions").unwrap());
        assert_eq!(store.config().default_max_age, crate::DEFAULT_MAX_AGE);
        assert!(store.codecs().is_empty());
    }

    #[test]
    fn test_load_without_id() {
        let (store, _) = store();
        let mut session = Session::new("test");
        assert!(!store.load(&mut session).unwrap());
        assert!(session.is_new());
        assert_eq!(session.state(), SessionState::New);
    }

    #[test]
    fn test_save_then_inspect() {
        let (store, _) = store();
        let mut transport = MemoryTransport::new().with_max_age(60);
        let mut session = Session::new("test");
        session.insert("foo", "bar");
        store.save(&mut transport, &mut session).unwrap();

        let (record, values) = store.inspect(session.id()).unwrap().unwrap();
        assert_eq!(record.created_at, NOW);
        assert_eq!(record.max_age, 60);
        assert_eq!(values, session.values);
        assert_eq!(store.ids().unwrap(), vec![session.id().to_string()]);
    }

    #[test]
    fn test_remove_expired_spares_refreshed_record() {
        let (store, clock) = store();
        let mut transport = MemoryTransport::new().with_max_age(10);
        let mut session = Session::new("test");
        store.save(&mut transport, &mut session).unwrap();

        // Refreshed later, so it is no longer expired at the old deadline
        clock.advance(5);
        store.save(&mut transport, &mut session).unwrap();

        let id = session.id().as_bytes().to_vec();
        assert!(!store.remove_expired(&id, NOW + 10).unwrap());
        assert!(store.remove_expired(&id, NOW + 15).unwrap());
        assert!(store.inspect(session.id()).unwrap().is_none());
    }

    #[test]
    fn test_deleted_handle_cannot_be_saved() {
        let (store, _) = store();
        let mut transport = MemoryTransport::new();
        let mut session = Session::new("test");
        store.save(&mut transport, &mut session).unwrap();
        store.delete(&mut session).unwrap();

        assert!(matches!(
            store.save(&mut transport, &mut session),
            Err(SessionError::Deleted(name)) if name == "test"
        ));
        assert!(matches!(store.reload(&mut session), Err(SessionError::Deleted(_))));
        // Deleting twice is fine
        store.delete(&mut session).unwrap();
    }
}
