//! The conductor manifest: read-only source of known agents.

use std::{fs, io, path::Path};

use tracing::debug;

use crate::model::Manifest;

use super::{Result, StorageError};

/// Loads the agent manifest.
///
/// A missing file is reported as [`StorageError::ManifestNotFound`] so the
/// caller can tell "no manifest" apart from "broken manifest".
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StorageError::ManifestNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let manifest: Manifest = serde_json::from_str(&json)?;
    debug!(
        path = %path.display(),
        agents = manifest.guru_agents.len(),
        "loaded agent manifest"
    );
    Ok(manifest)
}
