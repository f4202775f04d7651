//! The shard document in a single-row `SQLite` table.
//!
//! `transaction` holds an immediate (write-locked) `SQLite` transaction
//! across the whole read-modify-write cycle, so two processes sharing the
//! file cannot lose each other's updates.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use crate::model::ShardBook;

use super::{Result, ShardRepository, StorageError};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS shard_book (
        id       INTEGER PRIMARY KEY CHECK (id = 1),
        document TEXT NOT NULL
    );
";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SqliteShardStore {
    path: PathBuf,
}

impl SqliteShardStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };
        if let Some(parent) = store.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        store.connect()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }
}

impl ShardRepository for SqliteShardStore {
    fn load(&self) -> Result<ShardBook> {
        let conn = self.connect()?;
        read_document(&conn)
    }

    fn save(&self, book: &ShardBook) -> Result<()> {
        let conn = self.connect()?;
        write_document(&conn, book)
    }

    fn transaction<T, E, F>(&self, mutate: F) -> core::result::Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&mut ShardBook) -> core::result::Result<T, E>,
    {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;

        let mut book = read_document(&tx)?;
        // Dropping `tx` on the error path rolls it back.
        let out = mutate(&mut book)?;
        write_document(&tx, &book)?;
        tx.commit().map_err(StorageError::from)?;
        Ok(out)
    }
}

fn read_document(conn: &Connection) -> Result<ShardBook> {
    let document: Option<String> = conn
        .query_row("SELECT document FROM shard_book WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    match document {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| StorageError::Corrupt(format!("invalid shard document: {e}"))),
        None => {
            debug!("no shard document yet");
            Ok(ShardBook::default())
        }
    }
}

fn write_document(conn: &Connection, book: &ShardBook) -> Result<()> {
    let json = serde_json::to_string(book)?;
    conn.execute(
        "INSERT INTO shard_book (id, document) VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET document = excluded.document",
        rusqlite::params![json],
    )?;
    debug!("saved shard document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteShardStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteShardStore::open(dir.path().join("db").join("shards.sqlite")).unwrap();
        (dir, store)
    }

    #[test]
    fn empty_database_loads_empty_document() {
        let (_dir, store) = test_store();
        assert_eq!(store.load().unwrap(), ShardBook::default());
    }

    #[test]
    fn save_replaces_the_single_row() {
        let (_dir, store) = test_store();

        let mut book = ShardBook::default();
        book.metrics.total_created = 1;
        store.save(&book).unwrap();
        book.metrics.total_created = 2;
        store.save(&book).unwrap();

        assert_eq!(store.load().unwrap().metrics.total_created, 2);

        let conn = Connection::open(store.path()).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM shard_book", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let (_dir, store) = test_store();

        let result: core::result::Result<(), StorageError> = store.transaction(|book| {
            book.metrics.total_archived = 7;
            Err(StorageError::Corrupt("abort".into()))
        });

        assert!(result.is_err());
        assert_eq!(store.load().unwrap().metrics.total_archived, 0);
    }

    #[test]
    fn transaction_commits_mutation() {
        let (_dir, store) = test_store();

        store
            .transaction(|book| {
                book.metrics.total_completed += 1;
                Ok::<_, StorageError>(())
            })
            .unwrap();

        assert_eq!(store.load().unwrap().metrics.total_completed, 1);
    }

    #[test]
    fn corrupt_row_is_reported() {
        let (_dir, store) = test_store();
        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "INSERT INTO shard_book (id, document) VALUES (1, 'nope')",
            [],
        )
        .unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
