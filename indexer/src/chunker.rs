//! Fixed-window chunking.
//!
//! Text is split into contiguous, non-overlapping windows of `chunk_size`
//! characters. Offsets count Unicode scalar values, not bytes.

use serde::{Deserialize, Serialize};

use crate::config::IndexerConfig;
use crate::error::Result;
use crate::selector::{FileSelector, read_source};

/// A window of a source file, as written to the metadata artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Character offset where the window starts.
    pub start: usize,

    /// Character offset where the window ends (exclusive).
    pub end: usize,

    /// The window's text.
    pub text: String,

    /// Source path relative to the codebase root.
    pub file_path: String,
}

/// A borrowed window of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextWindow<'a> {
    /// Character offset where the window starts.
    pub start: usize,

    /// Character offset where the window ends (exclusive).
    pub end: usize,

    /// The window's slice of the text.
    pub text: &'a str,
}

/// Split `text` into windows of `chunk_size` characters.
///
/// The last window may be shorter. Empty text, or a zero chunk size,
/// yields nothing.
pub fn chunk_text(text: &str, chunk_size: usize) -> TextWindows<'_> {
    TextWindows {
        text,
        chunk_size,
        cursor: Cursor::default(),
    }
}

/// Iterator returned by [`chunk_text`].
pub struct TextWindows<'a> {
    text: &'a str,
    chunk_size: usize,
    cursor: Cursor,
}

impl<'a> Iterator for TextWindows<'a> {
    type Item = TextWindow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.text;
        let (bytes, start, end) = self.cursor.advance(text, self.chunk_size)?;
        Some(TextWindow {
            start,
            end,
            text: &text[bytes],
        })
    }
}

/// Byte and character position inside a text.
#[derive(Debug, Default, Clone, Copy)]
struct Cursor {
    byte: usize,
    char: usize,
}

impl Cursor {
    /// Step over the next window, returning its byte range and character
    /// offsets.
    fn advance(
        &mut self,
        text: &str,
        chunk_size: usize,
    ) -> Option<(std::ops::Range<usize>, usize, usize)> {
        if chunk_size == 0 || self.byte >= text.len() {
            return None;
        }

        let rest = &text[self.byte..];
        let (len_bytes, len_chars) = match rest.char_indices().nth(chunk_size) {
            Some((idx, _)) => (idx, chunk_size),
            None => (rest.len(), rest.chars().count()),
        };

        let bytes = self.byte..self.byte + len_bytes;
        let start = self.char;
        self.byte += len_bytes;
        self.char += len_chars;
        Some((bytes, start, self.char))
    }
}

/// A file whose windows are being handed out.
struct OpenFile {
    relative_path: String,
    text: String,
    cursor: Cursor,
}

impl OpenFile {
    fn next_chunk(&mut self, chunk_size: usize) -> Option<Chunk> {
        let (bytes, start, end) = self.cursor.advance(&self.text, chunk_size)?;
        Some(Chunk {
            start,
            end,
            text: self.text[bytes].to_string(),
            file_path: self.relative_path.clone(),
        })
    }
}

/// Pull-based stream of every chunk under a codebase root.
///
/// Files are read one at a time, only once the previous file's windows
/// have been consumed. The stream ends after the first error.
pub struct ChunkStream<'a> {
    files: FileSelector<'a>,
    chunk_size: usize,
    current: Option<OpenFile>,
    files_read: usize,
    failed: bool,
}

impl<'a> ChunkStream<'a> {
    /// Start streaming chunks from the files under `root`.
    pub fn new(root: impl AsRef<std::path::Path>, config: &'a IndexerConfig) -> Result<Self> {
        Ok(Self {
            files: FileSelector::new(root, config)?,
            chunk_size: config.chunk_size(),
            current: None,
            files_read: 0,
            failed: false,
        })
    }

    /// Number of files read so far.
    pub fn files_read(&self) -> usize {
        self.files_read
    }
}

impl Iterator for ChunkStream<'_> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if let Some(file) = self.current.as_mut() {
                if let Some(chunk) = file.next_chunk(self.chunk_size) {
                    return Some(Ok(chunk));
                }
                self.current = None;
            }

            let selected = match self.files.next()? {
                Ok(selected) => selected,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };

            match read_source(&selected.absolute_path) {
                Ok(text) => {
                    self.files_read += 1;
                    self.current = Some(OpenFile {
                        relative_path: selected.relative_path,
                        text,
                        cursor: Cursor::default(),
                    });
                }
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
