//! Database handle and connection management.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, TransactionBehavior, params};
use tracing::{debug, info};

use crate::bucket::SqliteBucket;
use crate::error::{Result, StoreError};

// ─────────────────────────────────────────────────────────────────────────────
// Schema
// ─────────────────────────────────────────────────────────────────────────────

/// Current schema version, stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

/// Idle read connections kept around for reuse.
const MAX_IDLE_READERS: usize = 4;

const SCHEMA: &str = r#"
    -- Registered buckets
    CREATE TABLE IF NOT EXISTS cellar_buckets (
        name BLOB PRIMARY KEY
    ) WITHOUT ROWID;

    -- Key-value pairs, partitioned by bucket
    CREATE TABLE IF NOT EXISTS cellar_kv (
        bucket BLOB NOT NULL,
        key BLOB NOT NULL,
        value BLOB NOT NULL,
        PRIMARY KEY (bucket, key)
    ) WITHOUT ROWID;
"#;

// ─────────────────────────────────────────────────────────────────────────────
// Database
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct Inner {
    /// Backing file; `None` for in-memory databases.
    path: Option<PathBuf>,
    /// The single writer connection. `None` once the database is closed.
    writer: Mutex<Option<Connection>>,
    /// Idle read-only connections (file-backed databases only).
    readers: Mutex<Vec<Connection>>,
    closed: AtomicBool,
}

/// Shared handle to the embedded key-value database.
///
/// Cloning is cheap; all clones (and every bucket opened from them) share
/// the same connections. Safe to use from many threads at once.
#[derive(Clone)]
pub struct Database {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.inner.path)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directory and the schema if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // WAL lets readers proceed while a write transaction is open
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        initialize(&conn)?;

        info!("Session database opened at {:?}", path);
        Ok(Self::from_parts(Some(path.to_path_buf()), conn))
    }

    /// Create an in-memory database (useful for testing).
    ///
    /// Reads and writes share one connection, so reads wait for writes.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize(&conn)?;

        debug!("In-memory session database created");
        Ok(Self::from_parts(None, conn))
    }

    fn from_parts(path: Option<PathBuf>, conn: Connection) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                writer: Mutex::new(Some(conn)),
                readers: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Open a bucket, creating it if it doesn't exist yet.
    ///
    /// Creation is idempotent: opening an existing bucket never clears it.
    pub fn bucket(&self, name: &[u8]) -> Result<SqliteBucket> {
        self.write(|tx| {
            let created = tx.execute(
                "INSERT OR IGNORE INTO cellar_buckets (name) VALUES (?1)",
                params![name],
            )?;
            if created > 0 {
                debug!(bucket = %String::from_utf8_lossy(name), "Created bucket");
            }
            Ok(())
        })?;

        Ok(SqliteBucket::new(self.clone(), name.to_vec()))
    }

    /// Open an existing bucket without creating it.
    pub fn existing_bucket(&self, name: &[u8]) -> Result<SqliteBucket> {
        if !self.has_bucket(name)? {
            return Err(StoreError::BucketNotFound(
                String::from_utf8_lossy(name).into_owned(),
            ));
        }
        Ok(SqliteBucket::new(self.clone(), name.to_vec()))
    }

    /// Check whether a bucket has been created.
    pub fn has_bucket(&self, name: &[u8]) -> Result<bool> {
        self.read(|tx| {
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM cellar_buckets WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Close the database.
    ///
    /// Every later operation on this handle, its clones, or its buckets fails
    /// with [`StoreError::NotOpen`].
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.writer.lock().take();
        self.inner.readers.lock().clear();
        debug!("Session database closed");
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Run `f` inside a write transaction (`BEGIN IMMEDIATE`).
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back otherwise.
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.inner.writer.lock();
        let conn = guard.as_mut().ok_or(StoreError::NotOpen)?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` inside a read transaction.
    pub(crate) fn read<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        if self.is_closed() {
            return Err(StoreError::NotOpen);
        }

        let Some(path) = self.inner.path.as_deref() else {
            // In-memory databases only have the writer connection.
            let mut guard = self.inner.writer.lock();
            let conn = guard.as_mut().ok_or(StoreError::NotOpen)?;
            return run_read(conn, f);
        };

        let mut conn = match self.inner.readers.lock().pop() {
            Some(conn) => conn,
            None => open_reader(path)?,
        };
        let result = run_read(&mut conn, f);

        let mut idle = self.inner.readers.lock();
        if !self.is_closed() && idle.len() < MAX_IDLE_READERS {
            idle.push(conn);
        }
        result
    }
}

fn run_read<T>(
    conn: &mut Connection,
    f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
) -> Result<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

fn open_reader(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}

/// Create the schema if the database is new.
fn initialize(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current_version >= SCHEMA_VERSION {
        debug!("Schema up to date (version {})", current_version);
        return Ok(());
    }

    conn.execute_batch(SCHEMA)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bucket;

    #[test]
    fn test_bucket_creation_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.has_bucket(b"sessions").unwrap());

        let bucket = db.bucket(b"sessions").unwrap();
        bucket.put(b"a", b"1").unwrap();

        // Re-opening must not clear existing data
        let again = db.bucket(b"sessions").unwrap();
        assert!(db.has_bucket(b"sessions").unwrap());
        assert_eq!(again.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_existing_bucket_missing() {
        let db = Database::open_in_memory().unwrap();
        let result = db.existing_bucket(b"nope");
        assert!(matches!(result, Err(StoreError::BucketNotFound(name)) if name == "nope"));
    }

    #[test]
    fn test_closed_database_rejects_bucket_creation() {
        let db = Database::open_in_memory().unwrap();
        db.close();

        let err = db.bucket(b"sessions").unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(err.to_string(), "database not open");
    }

    #[test]
    fn test_initialize_rejects_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");
        std::fs::write(&path, "not a sqlite database ".repeat(64)).unwrap();

        let conn = Connection::open(&path).unwrap();
        assert!(matches!(initialize(&conn), Err(StoreError::Database(_))));
        assert!(Database::open(&path).is_err());
    }

    #[test]
    fn test_file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sessions.db");

        {
            let db = Database::open(&path).unwrap();
            let bucket = db.bucket(b"sessions").unwrap();
            bucket.put(b"id", b"data").unwrap();
            db.close();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
        let bucket = db.existing_bucket(b"sessions").unwrap();
        assert_eq!(bucket.get(b"id").unwrap(), Some(b"data".to_vec()));
    }
}
