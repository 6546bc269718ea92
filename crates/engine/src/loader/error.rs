//! Error types and load result structures for the model loader.

use std::path::PathBuf;

use sylva_core::EvalError;

/// Errors that can occur while loading, saving or watching model documents.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// JSON parse/deserialization error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// No document file exists for the requested id.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Header or structural validation failed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The document parsed but could not be turned into a registry.
    #[error(transparent)]
    Structural(#[from] EvalError),

    /// Filesystem watcher error.
    #[error("Notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Outcome of loading a single document file.
#[derive(Debug)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug)]
pub enum LoadStatus {
    /// Document was registered with this many models.
    Loaded { document_id: String, models: usize },
    /// File was skipped (dotfile, non-YAML, disabled document).
    Skipped { reason: String },
    /// Parse or validation error occurred.
    Failed { error: String },
}

impl LoadResult {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded { .. })
    }
}
