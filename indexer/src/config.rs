//! Configuration for a codebase indexing run.

use serde::{Deserialize, Serialize};

use codeindex_embeddings::{CHARS_PER_TOKEN, DEFAULT_ENGINE};

use crate::error::{IndexerError, Result};

/// Process-wide settings for an indexing run.
///
/// Built once at startup and passed by reference to every stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Lower-cased file extensions (without the dot) eligible for embedding.
    pub embeddable_extensions: Vec<String>,

    /// Lower-cased file names eligible regardless of extension.
    pub embeddable_extensionless_files: Vec<String>,

    /// Substrings that exclude a file when found in its lower-cased path.
    pub excluded_paths: Vec<String>,

    /// Files of this size or larger are skipped.
    pub max_file_size_bytes: u64,

    /// Size of an embedding window, in tokens.
    pub embedding_tokens_window: usize,

    /// Average characters per token for the engine.
    pub chars_per_token: f64,

    /// Number of chunks sent per embedding call.
    pub batch_size: usize,

    /// Engine identifier passed to the provider.
    pub engine: String,
}

impl IndexerConfig {
    /// Create a configuration with the default allow-lists and limits.
    pub fn new() -> Self {
        Self {
            embeddable_extensions: to_strings(&[
                "go", "ts", "tsx", "js", "jsx", "md", "markdown", "html", "graphql", "bazel",
                "java", "py", "rb", "php",
            ]),
            embeddable_extensionless_files: to_strings(&["dockerfile", "license"]),
            excluded_paths: to_strings(&["/__fixtures__/", "/testdata/", "/mocks"]),
            max_file_size_bytes: 1_000_000,
            embedding_tokens_window: 512,
            chars_per_token: CHARS_PER_TOKEN,
            batch_size: 512,
            engine: DEFAULT_ENGINE.to_string(),
        }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the token window and characters-per-token ratio.
    pub fn with_window(mut self, tokens: usize, chars_per_token: f64) -> Self {
        self.embedding_tokens_window = tokens;
        self.chars_per_token = chars_per_token;
        self
    }

    /// Set the maximum file size.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    /// Set the engine identifier.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Chunk window in characters.
    ///
    /// Ties round to even.
    pub fn chunk_size(&self) -> usize {
        let chars = self.embedding_tokens_window as f64 * self.chars_per_token;
        chars.round_ties_even().max(0.0) as usize
    }

    /// Check that the settings can drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size() == 0 {
            return Err(IndexerError::Config(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(IndexerError::Config(
                "batch size must be greater than zero".to_string(),
            ));
        }
        if self.engine.trim().is_empty() {
            return Err(IndexerError::Config("engine must not be empty".to_string()));
        }
        Ok(())
    }

    /// Whether a file name passes the extension/name allow-lists.
    pub fn is_embeddable_name(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        if let Some(ext) = extension_of(&lower) {
            if self.embeddable_extensions.iter().any(|e| e == ext) {
                return true;
            }
        }
        self.embeddable_extensionless_files
            .iter()
            .any(|name| *name == lower)
    }

    /// Whether a path contains one of the excluded fragments.
    pub fn is_excluded_path(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        self.excluded_paths
            .iter()
            .any(|fragment| lower.contains(fragment.as_str()))
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Extension after the last dot. Leading dots do not start an extension.
fn extension_of(file_name: &str) -> Option<&str> {
    let stem_start = file_name.len() - file_name.trim_start_matches('.').len();
    let rest = &file_name[stem_start..];
    rest.rfind('.').map(|idx| &rest[idx + 1..])
}
