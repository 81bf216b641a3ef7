//! Error types for the codebase indexer.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for indexer operations.
pub type Result<T> = std::result::Result<T, IndexerError>;

/// Errors that can occur while indexing a codebase.
///
/// Every variant is fatal for the run: nothing in the pipeline recovers
/// locally.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Codebase root missing or not a directory.
    #[error("codebase path not found or not a directory: {}", .0.display())]
    CodebaseNotFound(PathBuf),

    /// Output directory missing or not a directory.
    #[error("output directory not found or not a directory: {}", .0.display())]
    OutputDirNotFound(PathBuf),

    /// A selected file is not valid UTF-8.
    #[error("failed to decode {} as UTF-8: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Embedding provider error.
    #[error("embedding error: {0}")]
    Embedding(#[from] codeindex_embeddings::EmbeddingError),

    /// Vector array write error.
    #[error("npy write error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),

    /// Vector array shape error.
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
