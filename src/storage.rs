//! # Storage Module
//!
//! Durable storage for the repository document. The whole document is read
//! once at start-up and rewritten as a single snapshot after each mutation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::StorageError;
use crate::project::{OwnerId, Project};

/// Serialized form of the repository: `{ "owners": { "<ownerId>": [Project] } }`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDocument {
    #[serde(default)]
    pub owners: BTreeMap<OwnerId, Vec<Project>>,
}

impl RepositoryDocument {
    pub fn project_count(&self) -> usize {
        self.owners.values().map(Vec::len).sum()
    }
}

/// Backend able to load and atomically replace the repository document
pub trait ProjectStore: Send + Sync {
    /// Load the stored document; a store that was never written yields an empty one
    fn load(&self) -> Result<RepositoryDocument, StorageError>;

    /// Replace the stored document with `document`
    fn save(&self, document: &RepositoryDocument) -> Result<(), StorageError>;
}

/// JSON file on local disk
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers never observe a partially written document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ProjectStore for JsonFileStore {
    fn load(&self) -> Result<RepositoryDocument, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No repository file yet, starting empty");
                return Ok(RepositoryDocument::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if raw.trim().is_empty() {
            return Ok(RepositoryDocument::default());
        }

        let document: RepositoryDocument =
            serde_json::from_str(&raw).map_err(|source| StorageError::Decode {
                path: self.path.clone(),
                source,
            })?;

        info!(
            path = %self.path.display(),
            owners = document.owners.len(),
            projects = document.project_count(),
            "Repository document loaded"
        );
        Ok(document)
    }

    fn save(&self, document: &RepositoryDocument) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(document).map_err(StorageError::Encode)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut temp_file = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        temp_file.write_all(&payload).map_err(|e| self.io_error(e))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| self.io_error(e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), bytes = payload.len(), "Repository snapshot written");
        Ok(())
    }
}

/// Store kept in memory, with switchable write failures
///
/// Clones share the same contents, so a test can keep a handle after moving
/// one into a repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    document: Arc<Mutex<RepositoryDocument>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: RepositoryDocument) -> Self {
        let store = Self::default();
        if let Ok(mut slot) = store.document.lock() {
            *slot = document;
        }
        store
    }

    /// Make every following `save` fail until switched back
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Copy of the last saved document
    pub fn snapshot(&self) -> RepositoryDocument {
        self.document
            .lock()
            .map(|document| document.clone())
            .unwrap_or_default()
    }
}

impl ProjectStore for InMemoryStore {
    fn load(&self) -> Result<RepositoryDocument, StorageError> {
        Ok(self.snapshot())
    }

    fn save(&self, document: &RepositoryDocument) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected("in-memory store is failing writes".to_string()));
        }
        let mut slot = self
            .document
            .lock()
            .map_err(|_| StorageError::Rejected("in-memory store lock poisoned".to_string()))?;
        *slot = document.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
