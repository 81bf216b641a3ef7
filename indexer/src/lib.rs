//! # Codebase Indexer
//!
//! Turns a source tree into embedding artifacts for semantic search.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Codebase Indexer                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  FileSelector ──► ChunkStream ──► TryBatches ──► Provider       │
//! │       │                                             │           │
//! │       ▼                                             ▼           │
//! │  IndexerConfig                              EmbeddedCodebase    │
//! │                                                     │           │
//! │                                                     ▼           │
//! │                                   *_embeddings_metadata.json    │
//! │                                   *_embeddings.npy              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs sequentially: one file read at a time, one embedding
//! call in flight at a time. Any error aborts the run.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use codeindex_embeddings::OpenAIProvider;
//! use codeindex_indexer::{EmbeddingIndexer, IndexerConfig};
//!
//! let indexer = EmbeddingIndexer::new(Arc::new(OpenAIProvider::new()), IndexerConfig::default());
//! let summary = indexer.run("github.com/org/repo", "./repo", "./out").await?;
//! ```

pub mod batcher;
pub mod chunker;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod selector;
pub mod writer;

pub use batcher::{BatchExt, TryBatches};
pub use chunker::{Chunk, ChunkStream, TextWindow, chunk_text};
pub use config::IndexerConfig;
pub use error::{IndexerError, Result};
pub use orchestrator::{EmbeddedCodebase, EmbeddingIndexer, IndexSummary};
pub use selector::{FileSelector, SelectedFile, read_source};
pub use writer::{ArtifactPaths, ArtifactWriter, filesystem_safe_id};
