//! The buffered-transaction SQLite store adapter.
//!
//! A command accumulates all its writes in memory via [`SqliteStore::put`],
//! [`SqliteStore::put_force`] and [`SqliteStore::delete`], then applies them
//! inside one `sqlx` transaction when [`SqliteStore::commit`] is called. A
//! fatal error before that point simply drops the pending operations,
//! leaving the database untouched.
//!
//! There is exactly one backend (SQLite, per the schema in use), so this is
//! a concrete struct rather than a trait with one implementor: a second
//! open file (the `overlay` command's secondary source) is just another
//! `SqliteStore` value.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::error::StoreError;

enum PendingOp {
    Put { key: i64, data: Vec<u8>, force: bool },
    Delete { key: i64 },
}

/// A handle to one `blocks` SQLite database, with writes buffered until
/// [`commit`](SqliteStore::commit).
pub struct SqliteStore {
    pool: SqlitePool,
    pending: Vec<PendingOp>,
}

impl SqliteStore {
    /// Opens `path`, failing with [`StoreError::MissingSchema`] if it does
    /// not contain a `blocks` table.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .connect(&format!("sqlite://{path}"))
            .await?;

        let schema_row = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'blocks'",
        )
        .fetch_optional(&pool)
        .await?;
        if schema_row.is_none() {
            return Err(StoreError::MissingSchema(path.to_string()));
        }

        Ok(SqliteStore { pool, pending: Vec::new() })
    }

    /// Whether any writes are pending commit.
    pub fn is_modified(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Looks up `key`, preferring a not-yet-committed pending write over
    /// whatever is currently on disk (read-your-writes within one command).
    pub async fn get(&self, key: i64) -> Result<Option<Vec<u8>>, StoreError> {
        for op in self.pending.iter().rev() {
            match op {
                PendingOp::Put { key: k, data, .. } if *k == key => return Ok(Some(data.clone())),
                PendingOp::Delete { key: k } if *k == key => return Ok(None),
                _ => {}
            }
        }

        let row = sqlx::query("SELECT data FROM blocks WHERE pos = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<Vec<u8>, _>("data")))
    }

    /// Reads up to `limit` `(key, data)` pairs starting at `offset`, ordered
    /// by key. Used by the planner to scan the table in batches.
    pub async fn scan_batch(&self, offset: i64, limit: i64) -> Result<Vec<(i64, Vec<u8>)>, StoreError> {
        let rows = sqlx::query("SELECT pos, data FROM blocks ORDER BY pos LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| (r.get::<i64, _>("pos"), r.get::<Vec<u8>, _>("data")))
            .collect())
    }

    /// Queues an update to an existing row. A no-op at commit time if `key`
    /// does not exist.
    pub fn put(&mut self, key: i64, data: Vec<u8>) {
        self.pending.push(PendingOp::Put { key, data, force: false });
    }

    /// Queues an insert-or-replace, for writes that may target a position
    /// not yet present in the table (e.g. `clone --blockmode`'s destination).
    pub fn put_force(&mut self, key: i64, data: Vec<u8>) {
        self.pending.push(PendingOp::Put { key, data, force: true });
    }

    /// Queues a deletion.
    pub fn delete(&mut self, key: i64) {
        self.pending.push(PendingOp::Delete { key });
    }

    /// Applies every pending write inside a single transaction and clears
    /// the pending queue. A no-op if nothing is pending.
    pub async fn commit(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for op in self.pending.drain(..) {
            match op {
                PendingOp::Put { key, data, force } if force => {
                    sqlx::query("INSERT OR REPLACE INTO blocks (pos, data) VALUES (?, ?)")
                        .bind(key)
                        .bind(data)
                        .execute(&mut *tx)
                        .await?;
                }
                PendingOp::Put { key, data, force: false } => {
                    sqlx::query("UPDATE blocks SET data = ? WHERE pos = ?")
                        .bind(data)
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                }
                PendingOp::Delete { key } => {
                    sqlx::query("DELETE FROM blocks WHERE pos = ?")
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }
}
