//! # Embeddings
//!
//! This crate provides the embedding collaborator used by the codebase
//! indexer: a provider takes an ordered list of texts plus an engine
//! identifier and returns one dense vector per text, in input order.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings Collaborator                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingRequest ──► EmbeddingProvider ──► EmbeddingResponse   │
//! │                             │                                   │
//! │                             ▼                                   │
//! │                  OpenAI-compatible /embeddings                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;

pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAIProvider};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Average number of characters per token for the default engine.
///
/// Used to size chunk windows so a window stays inside the engine's
/// token limit.
pub const CHARS_PER_TOKEN: f64 = 4.0;

/// Engine used when the caller does not pick one.
pub const DEFAULT_ENGINE: &str = "text-embedding-ada-002";
