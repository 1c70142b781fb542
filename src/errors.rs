//! # Error Types Module
//!
//! Structured errors for the project repository, its storage backend and the
//! conversation edit controller. Handlers map these onto localized replies;
//! none of them is fatal to the process.

use std::path::PathBuf;

use teloxide::dispatching::dialogue::InMemStorageError;

use crate::project::{ProjectId, RequiredField};

/// Failures of the durable snapshot store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The snapshot could not be serialized
    #[error("failed to encode repository document: {0}")]
    Encode(#[source] serde_json::Error),
    /// The snapshot on disk is not a valid repository document
    #[error("failed to decode repository document at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Write rejected by the backend
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Failures of repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No project with this id under the requesting owner
    #[error("project {0} not found")]
    NotFound(ProjectId),
    /// Deploy attempted while required fields are missing
    #[error("missing required fields: {}", format_missing(.missing))]
    ValidationFailed { missing: Vec<RequiredField> },
    /// Field name that does not map to any project field
    #[error("unknown field: {0}")]
    UnknownField(String),
    /// The mutation could not be persisted and was rolled back
    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

fn format_missing(missing: &[RequiredField]) -> String {
    missing
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failures of the conversation edit controller
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("dialogue storage error: {0}")]
    Dialogue(#[from] InMemStorageError),
}

impl EditError {
    /// Project referenced by the edit no longer exists
    pub fn is_not_found(&self) -> bool {
        matches!(self, EditError::Repository(RepositoryError::NotFound(_)))
    }
}
