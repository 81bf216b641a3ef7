//! File selection for a codebase scan.
//!
//! Walks the codebase root and yields every file that passes the
//! name allow-lists, the size ceiling, and the excluded-path check.
//!
//! The walk and the file reads are synchronous. They are pulled one file at
//! a time between sequential embedding calls, so only one task ever waits
//! on them.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};

/// A file chosen for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Absolute path of the file.
    pub absolute_path: PathBuf,

    /// Path relative to the codebase root, `/`-separated.
    pub relative_path: String,
}

/// Lazy, deterministic walk over the eligible files under a root.
///
/// Within a directory, files are visited before subdirectories and each
/// group is ordered by name.
pub struct FileSelector<'a> {
    root: PathBuf,
    config: &'a IndexerConfig,
    walker: walkdir::IntoIter,
}

impl<'a> FileSelector<'a> {
    /// Start a walk under `root`.
    pub fn new(root: impl AsRef<Path>, config: &'a IndexerConfig) -> Result<Self> {
        let root = root.as_ref();
        let root = std::path::absolute(root)
            .map_err(|_| IndexerError::CodebaseNotFound(root.to_path_buf()))?;

        if !root.is_dir() {
            return Err(IndexerError::CodebaseNotFound(root));
        }

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter();

        Ok(Self {
            root,
            config,
            walker,
        })
    }

    /// The absolute root of the walk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative_path(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) => to_slash(relative),
            Err(_) => to_slash(path),
        }
    }
}

impl Iterator for FileSelector<'_> {
    type Item = Result<SelectedFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Some(Err(err.into())),
                Err(err) => {
                    warn!("Skipping unreadable entry: {err}");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !self.config.is_embeddable_name(&name) {
                continue;
            }

            let path = entry.path();
            let metadata = match fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(err) => return Some(Err(err.into())),
            };

            // Symlinks to directories are not followed.
            if !metadata.is_file() {
                continue;
            }

            if metadata.len() >= self.config.max_file_size_bytes {
                debug!("Skipping {} ({} bytes)", path.display(), metadata.len());
                continue;
            }

            if self.config.is_excluded_path(&to_slash(path)) {
                debug!("Skipping excluded path {}", path.display());
                continue;
            }

            return Some(Ok(SelectedFile {
                relative_path: self.relative_path(path),
                absolute_path: path.to_path_buf(),
            }));
        }
    }
}

/// Read a selected file as UTF-8 text with universal newlines.
///
/// `\r\n` and lone `\r` are translated to `\n`, so chunk offsets count the
/// translated text.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|source| IndexerError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_newlines(text))
}

fn normalize_newlines(text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn to_slash(path: &Path) -> String {
    let path = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        path.into_owned()
    } else {
        path.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
