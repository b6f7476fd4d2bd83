//! Bucketed key-value storage for Cellar.
//!
//! This crate provides the transactional store the session engine persists
//! records into:
//! - [`Database`]: a shared handle to a single SQLite file (or in-memory db)
//! - [`Bucket`]: a named key space with atomic get/put/delete
//! - [`SqliteBucket`]: the SQLite-backed bucket returned by [`Database::bucket`]
//!
//! Every bucket operation runs inside exactly one transaction. Writes go
//! through a single writer connection (`BEGIN IMMEDIATE`), so writers are
//! serialized; file-backed databases use WAL mode and serve reads from
//! separate connections.
//!
//! # Example
//!
//! ```no_run
//! use cellar_store::{Bucket, Database};
//!
//! let db = Database::open("/var/lib/cellar/sessions.db")?;
//! let bucket = db.bucket(b"sessions")?;
//!
//! bucket.put(b"key", b"value")?;
//! assert_eq!(bucket.get(b"key")?, Some(b"value".to_vec()));
//! bucket.delete(b"key")?;
//! # Ok::<(), cellar_store::StoreError>(())
//! ```

mod bucket;
mod db;
mod error;

pub use bucket::{Bucket, SqliteBucket};
pub use db::Database;
pub use error::{Result, StoreError};
