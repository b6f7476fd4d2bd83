//! Bucket abstraction and its SQLite implementation.

use std::ops::ControlFlow;

use rusqlite::{OptionalExtension, params};
use tracing::trace;

use crate::db::Database;
use crate::error::Result;

/// A named key space inside the store.
///
/// Each method runs in its own transaction: reads in a read transaction,
/// mutations in a write transaction that either commits fully or not at all.
pub trait Bucket: Send + Sync {
    /// Name of the bucket.
    fn name(&self) -> &[u8];

    /// Point lookup. Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or replace the value stored under `key`.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Remove `key` only if its current value satisfies `predicate`.
    ///
    /// The read and the delete happen in the same write transaction, so a
    /// value replaced by a concurrent writer is judged on its new contents.
    /// Returns whether a value was removed.
    fn delete_if(&self, key: &[u8], predicate: &mut dyn FnMut(&[u8]) -> bool) -> Result<bool>;

    /// Visit every key-value pair in key order inside one read transaction.
    ///
    /// Return [`ControlFlow::Break`] from `visit` to stop early.
    fn for_each(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>) -> Result<()>;

    /// Number of keys in the bucket.
    fn len(&self) -> Result<usize>;

    /// Whether the bucket holds no keys.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All keys in the bucket, in key order.
    fn keys(&self) -> Result<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        self.for_each(&mut |key, _| {
            keys.push(key.to_vec());
            ControlFlow::Continue(())
        })?;
        Ok(keys)
    }
}

/// Bucket stored as rows of the `cellar_kv` table.
#[derive(Debug, Clone)]
pub struct SqliteBucket {
    db: Database,
    name: Vec<u8>,
}

impl SqliteBucket {
    pub(crate) fn new(db: Database, name: Vec<u8>) -> Self {
        Self { db, name }
    }

    /// The database this bucket lives in.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Bucket for SqliteBucket {
    fn name(&self) -> &[u8] {
        &self.name
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db.read(|tx| {
            let value = tx
                .query_row(
                    "SELECT value FROM cellar_kv WHERE bucket = ?1 AND key = ?2",
                    params![self.name, key],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db.write(|tx| {
            tx.execute(
                r#"
                INSERT INTO cellar_kv (bucket, key, value) VALUES (?1, ?2, ?3)
                ON CONFLICT (bucket, key) DO UPDATE SET value = excluded.value
                "#,
                params![self.name, key, value],
            )?;
            trace!(key = %String::from_utf8_lossy(key), len = value.len(), "put");
            Ok(())
        })
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.db.write(|tx| {
            let removed = tx.execute(
                "DELETE FROM cellar_kv WHERE bucket = ?1 AND key = ?2",
                params![self.name, key],
            )?;
            trace!(key = %String::from_utf8_lossy(key), removed, "delete");
            Ok(())
        })
    }

    fn delete_if(&self, key: &[u8], predicate: &mut dyn FnMut(&[u8]) -> bool) -> Result<bool> {
        self.db.write(|tx| {
            let current = tx
                .query_row(
                    "SELECT value FROM cellar_kv WHERE bucket = ?1 AND key = ?2",
                    params![self.name, key],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()?;

            match current {
                Some(value) if predicate(&value) => {
                    tx.execute(
                        "DELETE FROM cellar_kv WHERE bucket = ?1 AND key = ?2",
                        params![self.name, key],
                    )?;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn for_each(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>) -> Result<()> {
        self.db.read(|tx| {
            let mut stmt =
                tx.prepare("SELECT key, value FROM cellar_kv WHERE bucket = ?1 ORDER BY key")?;
            let mut rows = stmt.query(params![self.name])?;

            while let Some(row) = rows.next()? {
                let key: Vec<u8> = row.get(0)?;
                let value: Vec<u8> = row.get(1)?;
                if visit(&key, &value).is_break() {
                    break;
                }
            }
            Ok(())
        })
    }

    fn len(&self) -> Result<usize> {
        self.db.read(|tx| {
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM cellar_kv WHERE bucket = ?1",
                params![self.name],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }
}
