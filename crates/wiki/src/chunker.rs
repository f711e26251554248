//! Document store — reads the input directory and splits it into chunks.
//!
//! Sizes are in estimated tokens: 1 token ≈ 4 bytes of text. Splits prefer a
//! sentence end, then whitespace, and always land on a UTF-8 boundary.

use lorewiki_core::error::StorageError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Estimate the token count for a string. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

const BYTES_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    pub chunk_size: usize,
    pub overlap: usize,
    /// Leading chunks to leave out of `chunks()`.
    pub skip: usize,
    /// Maximum chunks yielded by `chunks()`.
    pub limit: Option<usize>,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 2048,
            overlap: 0,
            skip: 0,
            limit: None,
        }
    }
}

impl ChunkOptions {
    pub fn from_config(ingest: &lorewiki_config::IngestConfig) -> Self {
        Self {
            chunk_size: ingest.chunk_size,
            overlap: ingest.chunk_overlap,
            skip: ingest.skip,
            limit: ingest.limit,
        }
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        if self.chunk_size == 0 {
            return Err(StorageError::InvalidChunking(
                "chunk_size must be greater than 0".into(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(StorageError::InvalidChunking(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// One piece of input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position among all chunks of the store, before windowing.
    pub index: usize,
    /// File the chunk came from.
    pub source: String,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct DocStore {
    chunks: Vec<Chunk>,
    skip: usize,
    limit: Option<usize>,
}

impl DocStore {
    /// Read every `.txt` / `.md` file directly under `dir`, in file name order.
    pub async fn open(dir: &Path, options: &ChunkOptions) -> Result<Self, StorageError> {
        options.validate()?;
        if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
            return Err(StorageError::MissingInput(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = Vec::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| StorageError::io(dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(dir, e))?
        {
            let path = entry.path();
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if is_file && is_document(&path) {
                files.push(path);
            } else {
                debug!(path = %path.display(), "Skipping non-document entry");
            }
        }
        files.sort();

        let mut texts = Vec::with_capacity(files.len());
        for path in files {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| StorageError::io(&path, e))?;
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            texts.push((source, text));
        }

        let store = Self::from_texts(texts, options)?;
        info!(
            dir = %dir.display(),
            chunks = store.total(),
            window = store.len(),
            "Loaded documents"
        );
        Ok(store)
    }

    /// Build a store from in-memory `(source, text)` pairs.
    pub fn from_texts<S, T>(
        texts: impl IntoIterator<Item = (S, T)>,
        options: &ChunkOptions,
    ) -> Result<Self, StorageError>
    where
        S: Into<String>,
        T: AsRef<str>,
    {
        options.validate()?;
        let mut chunks = Vec::new();
        for (source, text) in texts {
            let source = source.into();
            for piece in split_text(text.as_ref(), options.chunk_size, options.overlap) {
                chunks.push(Chunk {
                    index: chunks.len(),
                    source: source.clone(),
                    text: piece,
                });
            }
        }
        Ok(Self {
            chunks,
            skip: options.skip,
            limit: options.limit,
        })
    }

    /// Chunks before windowing.
    pub fn total(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks inside the window.
    pub fn len(&self) -> usize {
        let after_skip = self.chunks.len().saturating_sub(self.skip);
        self.limit.map_or(after_skip, |l| after_skip.min(l))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The windowed chunks, in order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks
            .iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
    }
}

fn is_document(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt") | Some("md")
    )
}

/// Split `text` into pieces of at most `chunk_size` tokens, consecutive
/// pieces sharing roughly `overlap` tokens. Blank pieces are dropped.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let max_bytes = chunk_size.max(1) * BYTES_PER_TOKEN;
    let overlap_bytes = overlap.min(chunk_size.saturating_sub(1)) * BYTES_PER_TOKEN;
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut hard_end = floor_boundary(text, (start + max_bytes).min(text.len()));
        if hard_end <= start {
            hard_end = ceil_boundary(text, start + 1);
        }
        let end = if hard_end == text.len() {
            hard_end
        } else {
            break_point(text, start, hard_end)
        };

        let piece = text[start..end].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        if end >= text.len() {
            break;
        }

        let mut next = floor_boundary(text, end.saturating_sub(overlap_bytes));
        if overlap_bytes > 0 {
            // Start the overlap on a word.
            if let Some(ws) = text[next..end].find(char::is_whitespace) {
                next += ws;
            }
        }
        start = if next > start { next } else { end };
    }
    pieces
}

/// Best place to end a piece that must stop by `hard_end`.
///
/// Only the back half of the window is searched so pieces stay reasonably
/// full.
fn break_point(text: &str, start: usize, hard_end: usize) -> usize {
    let window = &text[start..hard_end];
    let min = window.len() / 2;

    let mut last_space = None;
    let chars = window.char_indices().rev();
    let mut following = text[hard_end..].chars().next();
    for (pos, c) in chars {
        if pos < min {
            break;
        }
        let after = pos + c.len_utf8();
        if c == '\n' || (matches!(c, '.' | '!' | '?') && following.is_none_or(char::is_whitespace)) {
            return start + after;
        }
        if last_space.is_none() && c.is_whitespace() {
            last_space = Some(start + after);
        }
        following = Some(c);
    }
    last_space.unwrap_or(hard_end)
}

fn floor_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i.min(text.len())
}
