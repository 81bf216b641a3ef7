//! Embedding orchestration for a whole codebase.
//!
//! Chunks are pulled from the codebase, grouped into batches, and sent to
//! the embedding provider one batch at a time. Metadata and vectors are
//! accumulated in lockstep so row *i* of the vectors always belongs to
//! metadata entry *i*.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use codeindex_embeddings::{Embedding, EmbeddingError, EmbeddingProvider, EmbeddingRequest};

use crate::batcher::BatchExt;
use crate::chunker::{Chunk, ChunkStream};
use crate::config::IndexerConfig;
use crate::error::Result;
use crate::writer::ArtifactWriter;

/// Everything embedded during one run, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedCodebase {
    /// Chunk descriptors.
    pub metadata: Vec<Chunk>,

    /// One vector per chunk, same order as `metadata`.
    pub embeddings: Vec<Embedding>,

    /// Number of files read.
    pub files: usize,

    /// Number of embedding calls made.
    pub batches: usize,
}

impl EmbeddedCodebase {
    /// Vector dimension, or zero when nothing was embedded.
    pub fn dimension(&self) -> usize {
        self.embeddings.first().map_or(0, Vec::len)
    }

    fn push_batch(&mut self, batch: Vec<Chunk>, vectors: Vec<Embedding>) -> Result<()> {
        if vectors.len() != batch.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "{} embeddings returned for {} chunks",
                vectors.len(),
                batch.len()
            ))
            .into());
        }

        let expected = self
            .embeddings
            .first()
            .or_else(|| vectors.first())
            .map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: bad.len(),
            }
            .into());
        }

        self.metadata.extend(batch);
        self.embeddings.extend(vectors);
        self.batches += 1;
        Ok(())
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    /// Files read.
    pub files: usize,

    /// Chunks embedded (= metadata entries = vector rows).
    pub chunks: usize,

    /// Embedding calls made.
    pub batches: usize,

    /// Vector dimension.
    pub dimension: usize,

    /// Written metadata file.
    pub metadata_path: PathBuf,

    /// Written vector file.
    pub embeddings_path: PathBuf,

    /// Wall time of the whole run.
    pub elapsed_ms: u64,
}

/// Indexes a codebase into embedding artifacts.
pub struct EmbeddingIndexer {
    provider: Arc<dyn EmbeddingProvider>,
    config: IndexerConfig,
}

impl EmbeddingIndexer {
    /// Create an indexer over `provider`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: IndexerConfig) -> Self {
        Self { provider, config }
    }

    /// The run configuration.
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Embed every chunk under `codebase_path`, strictly one batch at a time.
    pub async fn embed_codebase(&self, codebase_path: &Path) -> Result<EmbeddedCodebase> {
        self.config.validate()?;

        let mut stream = ChunkStream::new(codebase_path, &self.config)?;
        let mut embedded = EmbeddedCodebase::default();
        let started = Instant::now();

        for batch in stream.by_ref().try_batches(self.config.batch_size) {
            let batch = batch?;
            let batch_started = Instant::now();

            let texts = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let request = EmbeddingRequest::new(texts).with_model(self.config.engine.as_str());
            let response = self.provider.embed(request).await?;

            info!(
                "Batch embedding time: {:.3}s ({} chunks)",
                batch_started.elapsed().as_secs_f64(),
                batch.len()
            );
            embedded.push_batch(batch, response.embeddings)?;
        }

        embedded.files = stream.files_read();
        info!(
            "Total embedding time: {:.3}s",
            started.elapsed().as_secs_f64()
        );
        Ok(embedded)
    }

    /// Embed a codebase and write its artifacts into `output_dir`.
    ///
    /// The output directory is checked before any embedding call is made.
    pub async fn run(
        &self,
        codebase_id: &str,
        codebase_path: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<IndexSummary> {
        let started = Instant::now();
        let writer = ArtifactWriter::new(output_dir.as_ref())?;
        debug!(
            "Indexing {} with provider {} ({})",
            codebase_path.as_ref().display(),
            self.provider.name(),
            self.config.engine
        );

        let embedded = self.embed_codebase(codebase_path.as_ref()).await?;
        let paths = writer.write(codebase_id, &embedded.metadata, &embedded.embeddings)?;

        let summary = IndexSummary {
            files: embedded.files,
            chunks: embedded.metadata.len(),
            batches: embedded.batches,
            dimension: embedded.dimension(),
            metadata_path: paths.metadata,
            embeddings_path: paths.embeddings,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Indexed {} files into {} chunks ({} batches, dimension {})",
            summary.files, summary.chunks, summary.batches, summary.dimension
        );
        Ok(summary)
    }
}
