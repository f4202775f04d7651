//! Local persistence for shards, journals, and the agent manifest.
//!
//! Everything lives under a repository root:
//!
//! ```text
//! <root>/.agentic/manifests/
//!   conductor_manifest.json     # Known agents (read-only)
//!   active_story_shards.json    # Shard document (json store)
//!   story_shards.sqlite         # Shard document (sqlite store)
//! <root>/journal/
//!   <YYYY-MM-DD-HHMMSS>-<task>.md  # One file per journal entry, never rewritten
//! ```

mod journal;
mod manifest;
mod shards;
mod sqlite;

use std::{
    io,
    path::{Path, PathBuf},
};

pub use journal::{DirJournal, JournalStore, MemoryJournal};
pub use manifest::load_manifest;
pub use shards::{ConfiguredStore, JsonShardStore, MemoryShardStore, ShardRepository};
pub use sqlite::SqliteShardStore;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("record already exists: {0}")]
    RecordExists(String),

    #[error("agent manifest not found at {}", .0.display())]
    ManifestNotFound(PathBuf),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Paths of the stores inside one repository.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifests_dir(&self) -> PathBuf {
        self.root.join(".agentic").join("manifests")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifests_dir().join("conductor_manifest.json")
    }

    pub fn shards_json_path(&self) -> PathBuf {
        self.manifests_dir().join("active_story_shards.json")
    }

    pub fn shards_sqlite_path(&self) -> PathBuf {
        self.manifests_dir().join("story_shards.sqlite")
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.root.join("journal")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_the_root() {
        let ws = Workspace::new("/repo");

        assert_eq!(
            ws.manifest_path(),
            Path::new("/repo/.agentic/manifests/conductor_manifest.json")
        );
        assert_eq!(
            ws.shards_json_path(),
            Path::new("/repo/.agentic/manifests/active_story_shards.json")
        );
        assert_eq!(ws.journal_dir(), Path::new("/repo/journal"));
    }
}
