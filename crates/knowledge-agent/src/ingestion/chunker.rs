//! Text chunking with page tracking

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{DocumentChunk, CHUNK_INDEX_KEY};

/// Split raw text on a separator.
///
/// Segments are trimmed and blank ones dropped. Every chunk is page 0 and
/// carries its position among the kept segments under `chunk`.
pub fn split_on_separator(text: &str, file_name: &str, separator: &str) -> Vec<DocumentChunk> {
    let segments: Vec<&str> = if separator.is_empty() {
        vec![text]
    } else {
        text.split(separator).collect()
    };

    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(index, segment)| {
            DocumentChunk::new(segment, file_name, 0).with_metadata(CHUNK_INDEX_KEY, index.to_string())
        })
        .collect()
}

/// Sentence-aware chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size),
            min_size: 1,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap).with_min_size(config.min_chunk_size)
    }

    /// Skip chunks shorter than this
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size.max(1);
        self
    }

    /// Chunk one page of a source document
    pub fn chunk_page(&self, text: &str, source_id: &str, page: u32) -> Vec<DocumentChunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(index, piece)| {
                DocumentChunk::new(piece, source_id, page).with_metadata(CHUNK_INDEX_KEY, index.to_string())
            })
            .collect()
    }

    /// Split text into trimmed pieces of roughly `chunk_size` characters.
    ///
    /// Text that already fits is returned whole.
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        // Length of the overlap carried over from the previous chunk
        let mut carried = 0;

        for sentence in text.split_sentence_bounds() {
            if current.len() > carried && current.len() + sentence.len() > self.chunk_size {
                self.push_chunk(&mut chunks, &current);
                current = self.overlap_text(&current);
                carried = current.len();
            }
            current.push_str(sentence);
        }
        if current.len() > carried {
            self.push_chunk(&mut chunks, &current);
        }

        chunks
    }

    fn push_chunk(&self, chunks: &mut Vec<String>, text: &str) {
        let trimmed = text.trim();
        if trimmed.len() >= self.min_size {
            chunks.push(trimmed.to_string());
        }
    }

    /// Tail of a chunk carried into the next one, starting at a sentence or word break
    fn overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len() - self.overlap;
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }
        let tail = &text[start..];

        if let Some(pos) = tail.find(". ").filter(|pos| pos + 2 < tail.len()) {
            return tail[pos + 2..].to_string();
        }
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }
        tail.to_string()
    }
}
