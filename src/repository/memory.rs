use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Document, DocumentSummary, MetadataPatch, NewDocument};

use super::DocumentRepository;

#[derive(Default)]
struct Store {
    documents: HashMap<Uuid, Document>,
    summaries: HashMap<Uuid, DocumentSummary>,
}

/// In-memory adapter. Backs dev deployments without a database and the
/// service-level tests.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    store: Arc<RwLock<Store>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total record count, soft-deleted included.
    pub async fn document_count(&self) -> usize {
        self.store.read().await.documents.len()
    }
}

#[async_trait]
impl DocumentRepository for MemoryRepository {
    async fn insert(&self, new: NewDocument) -> Result<Document, sqlx::Error> {
        let doc = Document {
            id: new.id,
            filename: new.filename,
            original_filename: new.original_filename,
            content_type: new.content_type,
            file_size: new.file_size,
            storage_path: new.storage_path,
            backup_path: new.backup_path,
            description: new.description,
            tags: new.tags,
            folder_id: new.folder_id,
            folder_name: new.folder_name,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.store.write().await.documents.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn get_active(&self, id: Uuid) -> Result<Option<Document>, sqlx::Error> {
        let store = self.store.read().await;
        Ok(store.documents.get(&id).filter(|d| d.is_active).cloned())
    }

    async fn list_active(&self, folder_id: Option<&str>) -> Result<Vec<Document>, sqlx::Error> {
        let store = self.store.read().await;
        let mut docs: Vec<Document> = store
            .documents
            .values()
            .filter(|d| d.is_active)
            .filter(|d| match folder_id {
                Some(folder) => d.folder_id.as_deref() == Some(folder),
                None => true,
            })
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn update_metadata(
        &self,
        id: Uuid,
        patch: MetadataPatch,
    ) -> Result<Option<Document>, sqlx::Error> {
        let mut store = self.store.write().await;
        let Some(doc) = store.documents.get_mut(&id).filter(|d| d.is_active) else {
            return Ok(None);
        };
        if let Some(description) = patch.description {
            doc.description = Some(description);
        }
        if let Some(tags) = patch.tags {
            doc.tags = Some(tags);
        }
        doc.updated_at = Some(Utc::now());
        Ok(Some(doc.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut store = self.store.write().await;
        match store.documents.get_mut(&id).filter(|d| d.is_active) {
            Some(doc) => {
                doc.is_active = false;
                doc.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_summary(&self, document_id: Uuid) -> Result<Option<DocumentSummary>, sqlx::Error> {
        let store = self.store.read().await;
        Ok(store.summaries.get(&document_id).cloned())
    }

    async fn upsert_summary(
        &self,
        document_id: Uuid,
        summary_text: &str,
    ) -> Result<DocumentSummary, sqlx::Error> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let summary = match store.summaries.get(&document_id) {
            Some(existing) => DocumentSummary {
                document_id,
                summary_text: summary_text.to_string(),
                created_at: existing.created_at,
                updated_at: now,
            },
            None => DocumentSummary {
                document_id,
                summary_text: summary_text.to_string(),
                created_at: now,
                updated_at: now,
            },
        };
        store.summaries.insert(document_id, summary.clone());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc(folder: Option<&str>) -> NewDocument {
        NewDocument {
            id: Uuid::new_v4(),
            filename: format!("doc_{}.pdf", Uuid::new_v4().simple()),
            original_filename: "doc.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            file_size: 42,
            storage_path: "s3://files/doc.pdf".to_string(),
            backup_path: None,
            description: None,
            tags: None,
            folder_id: folder.map(str::to_string),
            folder_name: folder.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn soft_delete_hides_but_keeps_the_record() {
        let repo = MemoryRepository::new();
        let doc = repo.insert(new_doc(None)).await.unwrap();

        assert!(repo.soft_delete(doc.id).await.unwrap());
        assert!(repo.get_active(doc.id).await.unwrap().is_none());
        assert!(repo.list_active(None).await.unwrap().is_empty());
        // Record survives for audit.
        assert_eq!(repo.document_count().await, 1);
        // Second delete reports not-found semantics.
        assert!(!repo.soft_delete(doc.id).await.unwrap());
    }

    #[tokio::test]
    async fn list_filters_by_folder() {
        let repo = MemoryRepository::new();
        repo.insert(new_doc(Some("reports"))).await.unwrap();
        repo.insert(new_doc(None)).await.unwrap();

        assert_eq!(repo.list_active(Some("reports")).await.unwrap().len(), 1);
        assert_eq!(repo.list_active(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn summary_upsert_overwrites_instead_of_duplicating() {
        let repo = MemoryRepository::new();
        let id = Uuid::new_v4();

        let first = repo.upsert_summary(id, "v1").await.unwrap();
        let second = repo.upsert_summary(id, "v2").await.unwrap();

        assert_eq!(second.summary_text, "v2");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        let cached = repo.get_summary(id).await.unwrap().unwrap();
        assert_eq!(cached.summary_text, "v2");
    }
}
