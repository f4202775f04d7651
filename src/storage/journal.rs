//! Append-only journal stores.
//!
//! Records are named text blobs. A store never overwrites, edits, or deletes
//! a record: a name that is already taken gets a numeric suffix instead.

use std::{
    cell::RefCell,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{Result, StorageError};

/// Gives up on suffixing after this many taken names.
const MAX_ATTEMPTS: usize = 1000;

/// An append-only store of named text records.
pub trait JournalStore {
    /// Writes a new record, returning the name it was stored under.
    ///
    /// `name` is a file name such as `2026-01-13-100000-shard-001-init.md`.
    /// When it is taken, `-2`, `-3`, ... is inserted before the extension.
    fn append(&self, name: &str, contents: &str) -> Result<String>;
}

impl<J: JournalStore + ?Sized> JournalStore for &J {
    fn append(&self, name: &str, contents: &str) -> Result<String> {
        (**self).append(name, contents)
    }
}

/// One file per record in a directory.
#[derive(Debug, Clone)]
pub struct DirJournal {
    dir: PathBuf,
}

impl DirJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl JournalStore for DirJournal {
    fn append(&self, name: &str, contents: &str) -> Result<String> {
        fs::create_dir_all(&self.dir)?;

        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = numbered(name, attempt);
            let path = self.dir.join(&candidate);
            // `create_new` refuses to open an existing file, so a record is
            // never clobbered even if another writer races us.
            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
            debug!(path = %path.display(), "appended journal record");
            return Ok(candidate);
        }
        Err(StorageError::RecordExists(name.to_string()))
    }
}

/// Records kept in memory, in append order.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: RefCell<Vec<(String, String)>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(name, contents)` pair, oldest first.
    pub fn records(&self) -> Vec<(String, String)> {
        self.records.borrow().clone()
    }
}

impl JournalStore for MemoryJournal {
    fn append(&self, name: &str, contents: &str) -> Result<String> {
        let mut records = self.records.borrow_mut();
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = numbered(name, attempt);
            if records.iter().any(|(taken, _)| *taken == candidate) {
                continue;
            }
            records.push((candidate.clone(), contents.to_string()));
            return Ok(candidate);
        }
        Err(StorageError::RecordExists(name.to_string()))
    }
}

/// `name` for the first attempt, `stem-N.ext` after that.
fn numbered(name: &str, attempt: usize) -> String {
    if attempt == 1 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{attempt}.{ext}"),
        _ => format!("{name}-{attempt}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn numbering_keeps_the_extension() {
        assert_eq!(numbered("a-b.md", 1), "a-b.md");
        assert_eq!(numbered("a-b.md", 2), "a-b-2.md");
        assert_eq!(numbered("plain", 3), "plain-3");
        assert_eq!(numbered(".hidden", 2), ".hidden-2");
    }

    #[test]
    fn appends_create_new_files() {
        let dir = TempDir::new().unwrap();
        let journal = DirJournal::new(dir.path().join("journal"));

        let name = journal.append("2026-01-13-100000-x.md", "first").unwrap();

        assert_eq!(name, "2026-01-13-100000-x.md");
        let written = fs::read_to_string(journal.dir().join(&name)).unwrap();
        assert_eq!(written, "first");
    }

    #[test]
    fn taken_names_get_suffixes_and_nothing_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let journal = DirJournal::new(dir.path());

        let first = journal.append("entry.md", "one").unwrap();
        let second = journal.append("entry.md", "two").unwrap();
        let third = journal.append("entry.md", "three").unwrap();

        assert_eq!([first.as_str(), second.as_str(), third.as_str()], [
            "entry.md",
            "entry-2.md",
            "entry-3.md"
        ]);
        assert_eq!(fs::read_to_string(dir.path().join("entry.md")).unwrap(), "one");
        assert_eq!(fs::read_to_string(dir.path().join("entry-3.md")).unwrap(), "three");
    }

    #[test]
    fn memory_journal_mirrors_directory_naming() {
        let journal = MemoryJournal::new();

        journal.append("entry.md", "one").unwrap();
        journal.append("entry.md", "two").unwrap();

        let names: Vec<String> = journal.records().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["entry.md", "entry-2.md"]);
    }
}
