//! File and folder loading with per-page text extraction

use std::path::Path;
use walkdir::WalkDir;

use super::chunker::TextChunker;
use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{DocumentChunk, UploadedFile};

/// Text of one page; numbering starts at 1
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage {
    pub page: u32,
    pub text: String,
}

/// Turns uploaded files and folders into page-tagged chunks
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    chunker: TextChunker,
}

impl DocumentLoader {
    pub fn new(chunker: TextChunker) -> Self {
        Self { chunker }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(TextChunker::from_config(config))
    }

    /// Extract the non-blank pages of a file based on its extension.
    ///
    /// PDFs are read page by page; text and markdown files use form feeds as
    /// page breaks.
    pub fn load_pages(file: &UploadedFile) -> Result<Vec<LoadedPage>> {
        match file.extension().as_str() {
            "pdf" => Self::load_pdf(file),
            "txt" | "md" => Ok(Self::load_text(file)),
            other => Err(Error::UnsupportedFileType(format!(
                "{} ({})",
                if other.is_empty() { "<none>" } else { other },
                file.file_name
            ))),
        }
    }

    /// Chunk one file, keeping the page each chunk came from
    pub fn chunk_file(&self, file: &UploadedFile) -> Result<Vec<DocumentChunk>> {
        let pages = Self::load_pages(file)?;
        let chunks: Vec<DocumentChunk> = pages
            .iter()
            .flat_map(|p| self.chunker.chunk_page(&p.text, &file.file_name, p.page))
            .collect();

        tracing::debug!(
            "Loaded {}: {} pages, {} chunks",
            file.file_name,
            pages.len(),
            chunks.len()
        );
        Ok(chunks)
    }

    /// Chunk several files in order; the first unreadable file fails the call
    pub fn chunk_files(&self, files: &[UploadedFile]) -> Result<Vec<DocumentChunk>> {
        let mut chunks = Vec::new();
        for file in files {
            chunks.extend(self.chunk_file(file)?);
        }
        Ok(chunks)
    }

    /// Read every file below `path` whose extension matches `file_ending`,
    /// sorted by path
    pub fn load_folder(path: &Path, file_ending: &str) -> Result<Vec<UploadedFile>> {
        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", path.display()),
            )));
        }

        let ending = file_ending.trim_start_matches('.').to_lowercase();
        let mut files = Vec::new();

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase() == ending)
                .unwrap_or(false);
            if !matches {
                continue;
            }

            let data = std::fs::read(entry.path())?;
            let name = entry.file_name().to_string_lossy().to_string();
            files.push(UploadedFile::new(name, data));
        }

        tracing::info!(
            "Found {} '{}' files in {}",
            files.len(),
            ending,
            path.display()
        );
        Ok(files)
    }

    /// Chunk every matching file in a folder
    pub fn chunk_folder(&self, path: &Path, file_ending: &str) -> Result<Vec<DocumentChunk>> {
        let files = Self::load_folder(path, file_ending)?;
        self.chunk_files(&files)
    }

    fn load_text(file: &UploadedFile) -> Vec<LoadedPage> {
        let text = String::from_utf8_lossy(&file.data);
        text.split('\x0c')
            .enumerate()
            .filter(|(_, page)| !page.trim().is_empty())
            .map(|(index, page)| LoadedPage {
                page: index as u32 + 1,
                text: page.trim().to_string(),
            })
            .collect()
    }

    fn load_pdf(file: &UploadedFile) -> Result<Vec<LoadedPage>> {
        let pages = match lopdf::Document::load_mem(&file.data) {
            Ok(doc) => doc
                .get_pages()
                .keys()
                .filter_map(|&page| match doc.extract_text(&[page]) {
                    Ok(text) => Some(LoadedPage { page, text }),
                    Err(e) => {
                        tracing::debug!("No text on page {} of {}: {}", page, file.file_name, e);
                        None
                    }
                })
                .filter(|p| !p.text.trim().is_empty())
                .collect(),
            Err(e) => {
                tracing::warn!("lopdf could not read {}: {}, trying pdf-extract", file.file_name, e);
                Vec::new()
            }
        };

        if !pages.is_empty() {
            return Ok(pages);
        }

        // Whole-document extraction, reported as a single page
        let text = pdf_extract::extract_text_from_mem(&file.data)
            .map_err(|e| Error::parse(&file.file_name, format!("Failed to read PDF: {}", e)))?;
        if text.trim().is_empty() {
            return Err(Error::parse(&file.file_name, "No text content could be extracted from PDF"));
        }
        Ok(vec![LoadedPage { page: 1, text }])
    }
}
