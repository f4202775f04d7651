//! Shard document stores.
//!
//! The shard document is always read and written whole. Stores differ only in
//! where the document lives and how a read-modify-write cycle is protected.

use std::{
    cell::{Cell, RefCell},
    fs, io,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::model::ShardBook;

use super::{Result, SqliteShardStore, StorageError};

/// A keyed store holding the whole shard document.
pub trait ShardRepository {
    /// Reads the document. A store that has never been written yields an
    /// empty document.
    fn load(&self) -> Result<ShardBook>;

    /// Replaces the document.
    fn save(&self, book: &ShardBook) -> Result<()>;

    /// Runs one read-modify-write cycle.
    ///
    /// The document is saved only when `mutate` succeeds; an error leaves
    /// the stored document untouched.
    fn transaction<T, E, F>(&self, mutate: F) -> core::result::Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&mut ShardBook) -> core::result::Result<T, E>,
    {
        let mut book = self.load()?;
        let out = mutate(&mut book)?;
        self.save(&book)?;
        Ok(out)
    }
}

impl<R: ShardRepository> ShardRepository for &R {
    fn load(&self) -> Result<ShardBook> {
        (**self).load()
    }

    fn save(&self, book: &ShardBook) -> Result<()> {
        (**self).save(book)
    }

    fn transaction<T, E, F>(&self, mutate: F) -> core::result::Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&mut ShardBook) -> core::result::Result<T, E>,
    {
        (**self).transaction(mutate)
    }
}

/// The shard document as a pretty-printed JSON file.
///
/// Writes go to a temporary file beside the target and are renamed into
/// place, so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonShardStore {
    path: PathBuf,
}

impl JsonShardStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ShardRepository for JsonShardStore {
    fn load(&self) -> Result<ShardBook> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no shard document yet");
                return Ok(ShardBook::default());
            }
            Err(e) => return Err(e.into()),
        };
        let book = serde_json::from_str(&json)?;
        debug!(path = %self.path.display(), "loaded shard document");
        Ok(book)
    }

    fn save(&self, book: &ShardBook) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        let mut json = serde_json::to_string_pretty(book)?;
        json.push('\n');
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), "saved shard document");
        Ok(())
    }
}

/// An in-memory shard document, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryShardStore {
    book: RefCell<ShardBook>,
    saves: Cell<usize>,
}

impl MemoryShardStore {
    pub fn new(book: ShardBook) -> Self {
        Self {
            book: RefCell::new(book),
            saves: Cell::new(0),
        }
    }

    /// How many times the document has been written.
    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl ShardRepository for MemoryShardStore {
    fn load(&self) -> Result<ShardBook> {
        Ok(self.book.borrow().clone())
    }

    fn save(&self, book: &ShardBook) -> Result<()> {
        *self.book.borrow_mut() = book.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// The shard store chosen by configuration.
#[derive(Debug)]
pub enum ConfiguredStore {
    Json(JsonShardStore),
    Sqlite(SqliteShardStore),
}

impl ShardRepository for ConfiguredStore {
    fn load(&self) -> Result<ShardBook> {
        match self {
            Self::Json(store) => store.load(),
            Self::Sqlite(store) => store.load(),
        }
    }

    fn save(&self, book: &ShardBook) -> Result<()> {
        match self {
            Self::Json(store) => store.save(book),
            Self::Sqlite(store) => store.save(book),
        }
    }

    fn transaction<T, E, F>(&self, mutate: F) -> core::result::Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&mut ShardBook) -> core::result::Result<T, E>,
    {
        match self {
            Self::Json(store) => store.transaction(mutate),
            Self::Sqlite(store) => store.transaction(mutate),
        }
    }
}
