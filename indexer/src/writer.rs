//! Output artifacts of an indexing run.
//!
//! A run produces a JSON metadata file and a `.npy` vector file whose row
//! *i* belongs to metadata entry *i*. The two files are written one after
//! the other with no checkpointing: if the second write fails, the first
//! file is left behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use codeindex_embeddings::{Embedding, EmbeddingError};

use crate::chunker::Chunk;
use crate::error::{IndexerError, Result};

/// Replace every character that is not an ASCII letter or digit with `_`.
pub fn filesystem_safe_id(codebase_id: &str) -> String {
    codebase_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Locations of the two artifacts for one codebase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// `{safe_id}_embeddings_metadata.json`
    pub metadata: PathBuf,

    /// `{safe_id}_embeddings.npy`
    pub embeddings: PathBuf,
}

/// Writes artifacts into an output directory.
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer for `output_dir`, which must already exist.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if !output_dir.is_dir() {
            return Err(IndexerError::OutputDirNotFound(output_dir));
        }
        Ok(Self { output_dir })
    }

    /// Artifact paths for a codebase identifier.
    pub fn paths(&self, codebase_id: &str) -> ArtifactPaths {
        let safe_id = filesystem_safe_id(codebase_id);
        ArtifactPaths {
            metadata: self
                .output_dir
                .join(format!("{safe_id}_embeddings_metadata.json")),
            embeddings: self.output_dir.join(format!("{safe_id}_embeddings.npy")),
        }
    }

    /// Write metadata, then vectors.
    pub fn write(
        &self,
        codebase_id: &str,
        metadata: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<ArtifactPaths> {
        let paths = self.paths(codebase_id);
        write_metadata(&paths.metadata, metadata)?;
        write_embeddings(&paths.embeddings, embeddings)?;
        Ok(paths)
    }
}

/// Write chunk descriptors as one JSON array.
pub fn write_metadata(path: &Path, metadata: &[Chunk]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, metadata)?;
    writer.flush()?;
    debug!("Wrote {} metadata entries to {}", metadata.len(), path.display());
    Ok(())
}

/// Write vectors as a 2-D `f32` array in `.npy` format.
///
/// An empty slice is written as a `(0, 0)` array.
pub fn write_embeddings(path: &Path, embeddings: &[Embedding]) -> Result<()> {
    let array = to_array(embeddings)?;
    ndarray_npy::write_npy(path, &array)?;
    debug!(
        "Wrote {}x{} embeddings to {}",
        array.nrows(),
        array.ncols(),
        path.display()
    );
    Ok(())
}

fn to_array(embeddings: &[Embedding]) -> Result<Array2<f32>> {
    let rows = embeddings.len();
    let dimension = embeddings.first().map_or(0, Vec::len);

    let mut flat = Vec::with_capacity(rows * dimension);
    for embedding in embeddings {
        if embedding.len() != dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: embedding.len(),
            }
            .into());
        }
        flat.extend_from_slice(embedding);
    }

    Ok(Array2::from_shape_vec((rows, dimension), flat)?)
}
