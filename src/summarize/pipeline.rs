use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::DocumentSummary;
use crate::repository::DocumentRepository;
use crate::storage::{Storage, StorageBackend};

use super::extract::extract_text;
use super::llm::Summarizer;

/// Runs the per-document summarization flow: fetch the record, download the
/// stored bytes, extract text, call the summarizer, cache the result.
///
/// A failure at any step writes nothing partial; the next request re-attempts
/// from scratch.
pub struct SummaryPipeline {
    repo: Arc<dyn DocumentRepository>,
    storage: StorageBackend,
    summarizer: Arc<dyn Summarizer>,
}

impl SummaryPipeline {
    pub fn new(
        repo: Arc<dyn DocumentRepository>,
        storage: StorageBackend,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            repo,
            storage,
            summarizer,
        }
    }

    /// Generate and cache the summary for one document, overwriting any
    /// existing record.
    pub async fn run(&self, document_id: Uuid) -> Result<DocumentSummary, AppError> {
        let document = self
            .repo
            .get_active(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        let key = self.storage.relative_key(&document.storage_path).to_string();
        let content = self.storage.download(&key).await?;

        let text = extract_text(&document.content_type, content).await?;

        let summary_text = self
            .summarizer
            .summarize(&text, &document.original_filename)
            .await?;

        let summary = self.repo.upsert_summary(document_id, &summary_text).await?;
        info!(
            "Cached summary for document {} via {}",
            document_id,
            self.summarizer.name()
        );
        Ok(summary)
    }
}
