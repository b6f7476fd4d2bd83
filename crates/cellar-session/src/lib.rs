//! Session lifecycle engine for Cellar.
//!
//! This crate ties the pieces of a server-side session store together:
//! - [`SessionStore`]: creates, loads, saves, and deletes sessions
//! - [`SessionRecord`]: the persisted form (payload + creation time + max age)
//! - [`Transport`]: where tokens come from and go to (usually cookies)
//! - [`Registry`]: per-request deduplication of named sessions
//! - [`sweep`]: optional removal of expired records nobody reads anymore
//!
//! Expiry is lazy. A record past its max age is treated as absent the next
//! time it is read, and deleted as a side effect of that read.
//!
//! # Example
//!
//! ```rust
//! use cellar_session::{Config, KeyPair, MemoryTransport, SessionStore};
//! use cellar_store::Database;
//!
//! let db = Database::open_in_memory()?;
//! let store = SessionStore::new(&db, Config::default(), &[KeyPair::new(b"secret-key".to_vec())])?;
//!
//! // First request: no cookie yet
//! let mut response = MemoryTransport::new();
//! let (mut session, error) = store.new_session(&response, "session-key");
//! assert!(error.is_none() && session.is_new());
//! session.insert("foo", "bar");
//! store.save(&mut response, &mut session)?;
//!
//! // Second request carries the issued token
//! let token = response.issued_token("session-key").unwrap_or_default();
//! let request = MemoryTransport::new().with_token("session-key", token);
//! let (session, _) = store.new_session(&request, "session-key");
//! assert!(!session.is_new());
//! assert_eq!(session.get("foo").and_then(|v| v.as_str()), Some("bar"));
//! # Ok::<(), cellar_session::SessionError>(())
//! ```

mod clock;
mod codec;
mod config;
mod error;
mod id;
mod record;
mod registry;
mod session;
mod store;
mod sweep;
mod transport;

pub use cellar_cookie::{CodecSet, KeyPair};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{JsonCodec, PayloadCodec, Values};
pub use config::{Config, DEFAULT_BUCKET_NAME, DEFAULT_MAX_AGE};
pub use error::{Result, SessionError};
pub use id::{ID_BYTES, ID_LENGTH, generate_id};
pub use record::SessionRecord;
pub use registry::Registry;
pub use session::{Session, SessionState};
pub use store::SessionStore;
pub use sweep::{SweepReport, sweep};
pub use transport::{CookieOptions, IssuedToken, MemoryTransport, Transport};
