// Metadata repository adapters: Postgres for production, in-memory for
// dev/test deployments. Selected via `METADATA_BACKEND`.
mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::{Config, MetadataBackend},
    database::init_db,
    models::{Document, DocumentSummary, MetadataPatch, NewDocument},
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// Provider-agnostic capability interface over document records, so the
/// orchestration layer never branches on the concrete backend.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Persist a new document record. Timestamps are backend-assigned.
    async fn insert(&self, new: NewDocument) -> Result<Document, sqlx::Error>;

    /// Fetch an active document by id. Soft-deleted records come back `None`.
    async fn get_active(&self, id: Uuid) -> Result<Option<Document>, sqlx::Error>;

    /// All active documents, newest first, optionally filtered by folder id.
    async fn list_active(&self, folder_id: Option<&str>) -> Result<Vec<Document>, sqlx::Error>;

    /// Apply a partial metadata update (description/tags) and bump
    /// `updated_at`. `None` when the id is unknown or inactive.
    async fn update_metadata(
        &self,
        id: Uuid,
        patch: MetadataPatch,
    ) -> Result<Option<Document>, sqlx::Error>;

    /// Flip the active flag off. Returns false when the id is unknown or
    /// already inactive. Never touches stored bytes.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    async fn get_summary(&self, document_id: Uuid) -> Result<Option<DocumentSummary>, sqlx::Error>;

    /// Write or overwrite the one summary record for a document.
    async fn upsert_summary(
        &self,
        document_id: Uuid,
        summary_text: &str,
    ) -> Result<DocumentSummary, sqlx::Error>;
}

/// Build the repository the configuration asks for.
pub async fn init_repository(config: &Config) -> Result<Arc<dyn DocumentRepository>, sqlx::Error> {
    match config.metadata_backend {
        MetadataBackend::Postgres => {
            let pool = init_db(&config.database_url).await?;
            Ok(Arc::new(PgRepository::new(pool)))
        }
        MetadataBackend::Memory => {
            info!("Using in-memory metadata repository");
            Ok(Arc::new(MemoryRepository::new()))
        }
    }
}
