//! Chunk, embed and store documents

use crate::error::{Error, FailedItem, Result};
use crate::ingestion::{split_on_separator, DocumentLoader};
use crate::providers::ProviderHandle;
use crate::types::{DocumentChunk, EmbedInput, EmbeddingRecord, EmbeddingSummary};

impl ProviderHandle {
    /// Chunk the input, embed every chunk and store the records in this
    /// binding's collection.
    ///
    /// The first failed embedding stops the batch: records embedded before it
    /// are still stored, and the call returns `PartialBatchFailure` listing the
    /// failed chunk and every chunk after it. Records the store rejects are
    /// reported the same way.
    pub async fn embed_documents(&self, input: EmbedInput) -> Result<EmbeddingSummary> {
        let chunks = self.prepare_chunks(input).await?;
        if chunks.is_empty() {
            tracing::info!("Nothing to embed into '{}'", self.collection());
            return Ok(EmbeddingSummary {
                collection: self.collection().to_string(),
                ..Default::default()
            });
        }

        tracing::info!(
            "Embedding {} chunks into '{}' with {}",
            chunks.len(),
            self.collection(),
            self.embedder().name()
        );

        let mut records = Vec::with_capacity(chunks.len());
        let mut failed = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let text = chunk.text.as_str();
            match self
                .read_with_retry("embedding", || self.embedder().embed(text))
                .await
            {
                Ok(vector) => records.push(EmbeddingRecord::new(vector, chunk.clone())),
                Err(e) => {
                    tracing::warn!("Embedding {} failed, stopping batch: {}", chunk.label(), e);
                    failed.push(FailedItem {
                        item: chunk.label(),
                        reason: e.to_string(),
                    });
                    failed.extend(chunks[index + 1..].iter().map(|c| FailedItem {
                        item: c.label(),
                        reason: "not processed".to_string(),
                    }));
                    break;
                }
            }
        }

        let report = self.store().upsert(self.collection(), &records).await?;
        failed.extend(report.failed.into_iter().map(|f| {
            tracing::warn!("Store rejected {}: {}", f.item, f.error);
            FailedItem {
                item: f.item,
                reason: f.error.to_string(),
            }
        }));

        if !failed.is_empty() {
            return Err(Error::PartialBatchFailure {
                succeeded: report.succeeded,
                failed,
            });
        }

        let mut sources: Vec<String> = Vec::new();
        for record in &records {
            if !sources.contains(&record.chunk.source_id) {
                sources.push(record.chunk.source_id.clone());
            }
        }

        Ok(EmbeddingSummary {
            collection: self.collection().to_string(),
            sources,
            chunks: report.succeeded,
        })
    }

    async fn prepare_chunks(&self, input: EmbedInput) -> Result<Vec<DocumentChunk>> {
        let loader = DocumentLoader::from_config(&self.settings().chunking);
        match input {
            EmbedInput::Chunks(chunks) => Ok(chunks),
            EmbedInput::Text {
                text,
                file_name,
                separator,
            } => Ok(split_on_separator(&text, &file_name, &separator)),
            EmbedInput::Files(files) => {
                tokio::task::spawn_blocking(move || loader.chunk_files(&files))
                    .await
                    .map_err(std::io::Error::from)?
            }
            EmbedInput::Folder { path, file_ending } => {
                tokio::task::spawn_blocking(move || loader.chunk_folder(&path, &file_ending))
                    .await
                    .map_err(std::io::Error::from)?
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::InMemoryVectorStore;
    use crate::providers::vector_store::VectorStoreGateway;
    use crate::test_support::{fake_handle, HashEmbedder, ScriptedLlm};
    use crate::types::{Filtering, LlmProvider, UploadedFile};
    use std::sync::Arc;

    async fn setup(embedder: HashEmbedder) -> (ProviderHandle, Arc<InMemoryVectorStore>, Arc<HashEmbedder>) {
        let store = Arc::new(InMemoryVectorStore::new());
        let embedder = Arc::new(embedder);
        let handle = fake_handle(
            LlmProvider::OpenAi,
            store.clone(),
            embedder.clone(),
            Arc::new(ScriptedLlm::new("ok")),
        );
        handle.create_collection().await.unwrap();
        (handle, store, embedder)
    }

    #[tokio::test]
    async fn test_embed_text_with_separator() {
        let (handle, store, _) = setup(HashEmbedder::new()).await;

        let summary = handle
            .embed_documents(EmbedInput::Text {
                text: "The sky is blue.".into(),
                file_name: "sky.txt".into(),
                separator: ".".into(),
            })
            .await
            .unwrap();

        assert_eq!(summary.collection, "openai");
        assert_eq!(summary.sources, vec!["sky.txt"]);
        assert_eq!(summary.chunks, vec!["sky.txt#0#0"]);
        assert_eq!(store.len("openai").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_partial_batch_failure() {
        let (handle, store, embedder) = setup(HashEmbedder::new().failing_on("broken")).await;

        let err = handle
            .embed_documents(EmbedInput::Chunks(vec![
                DocumentChunk::new("first page", "a.pdf", 1),
                DocumentChunk::new("broken page", "a.pdf", 2),
                DocumentChunk::new("third page", "a.pdf", 3),
            ]))
            .await
            .unwrap_err();

        match err {
            Error::PartialBatchFailure { succeeded, failed } => {
                assert_eq!(succeeded, vec!["a.pdf#1"]);
                let items: Vec<&str> = failed.iter().map(|f| f.item.as_str()).collect();
                assert_eq!(items, vec!["a.pdf#2", "a.pdf#3"]);
                assert_eq!(failed[1].reason, "not processed");
            }
            other => panic!("unexpected error: {other}"),
        }

        // The third chunk was never sent to the embedder
        assert_eq!(embedder.calls(), 2);
        assert_eq!(store.len("openai").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_separator_segments_are_reported_individually() {
        let (handle, store, _) = setup(HashEmbedder::new().failing_on("broken")).await;

        let err = handle
            .embed_documents(EmbedInput::Text {
                text: "alpha. broken. gamma".into(),
                file_name: "t.txt".into(),
                separator: ".".into(),
            })
            .await
            .unwrap_err();

        match err {
            Error::PartialBatchFailure { succeeded, failed } => {
                let failed: Vec<String> = failed.into_iter().map(|f| f.item).collect();
                assert_eq!(succeeded, vec!["t.txt#0#0"]);
                assert_eq!(failed, vec!["t.txt#0#1", "t.txt#0#2"]);
                assert!(succeeded.iter().all(|s| !failed.contains(s)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.len("openai").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_rejections_are_reported() {
        let store = Arc::new(InMemoryVectorStore::new());
        let handle = fake_handle(
            LlmProvider::OpenAi,
            store.clone(),
            Arc::new(HashEmbedder::with_dimensions(8)),
            Arc::new(ScriptedLlm::new("ok")),
        );
        store.create_collection("openai", 16).await.unwrap();

        let err = handle
            .embed_documents(EmbedInput::Chunks(vec![DocumentChunk::new("text", "a.txt", 0)]))
            .await
            .unwrap_err();

        match err {
            Error::PartialBatchFailure { succeeded, failed } => {
                assert!(succeeded.is_empty());
                assert!(failed[0].reason.contains("dimension mismatch"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_embed_uploaded_files() {
        let (handle, _, _) = setup(HashEmbedder::new()).await;

        let summary = handle
            .embed_documents(EmbedInput::Files(vec![
                UploadedFile::new("manual.txt", "Install the agent.\x0cRun the server."),
                UploadedFile::new("faq.md", "Ask questions."),
            ]))
            .await
            .unwrap();

        assert_eq!(summary.sources, vec!["manual.txt", "faq.md"]);
        assert_eq!(summary.chunks, vec!["manual.txt#1#0", "manual.txt#2#0", "faq.md#1#0"]);

        let results = handle
            .search("run server", &Filtering::default().with_page(2))
            .await
            .unwrap();
        assert_eq!(results[0].text, "Run the server.");
    }

    #[tokio::test]
    async fn test_embed_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.txt"), "Folder text.").unwrap();
        std::fs::write(dir.path().join("skip.md"), "Other text.").unwrap();
        let (handle, store, _) = setup(HashEmbedder::new()).await;

        let summary = handle
            .embed_documents(EmbedInput::Folder {
                path: dir.path().to_path_buf(),
                file_ending: ".txt".into(),
            })
            .await
            .unwrap();

        assert_eq!(summary.sources, vec!["one.txt"]);
        assert_eq!(store.len("openai").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_upload() {
        let (handle, _, embedder) = setup(HashEmbedder::new()).await;
        let err = handle
            .embed_documents(EmbedInput::Files(vec![UploadedFile::new("deck.pptx", Vec::new())]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedFileType(_)));
        assert_eq!(embedder.calls(), 0);
    }
}
