use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;


/// One uploaded file's metadata (not its bytes).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    /// Generated storage filename, unique across the bucket.
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    /// Storage reference (`s3://...` or a local path).
    pub storage_path: String,
    pub backup_path: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub folder_id: Option<String>,
    pub folder_name: Option<String>,
    /// False means soft-deleted: hidden from retrieval, bytes kept.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Cached AI-generated synopsis of one document. At most one per document id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentSummary {
    pub document_id: Uuid,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a new upload carries into the repository.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub storage_path: String,
    pub backup_path: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub folder_id: Option<String>,
    pub folder_name: Option<String>,
}

/// Mutable metadata fields; everything else is immutable post-creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataPatch {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub storage_path: String,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub folder_id: Option<String>,
    pub folder_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub download_url: String,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        let download_url = format!("/documents/{}/download", doc.id);
        DocumentResponse {
            id: doc.id,
            filename: doc.filename,
            original_filename: doc.original_filename,
            content_type: doc.content_type,
            file_size: doc.file_size,
            storage_path: doc.storage_path,
            description: doc.description,
            tags: doc.tags,
            folder_id: doc.folder_id,
            folder_name: doc.folder_name,
            is_active: doc.is_active,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            download_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub document_id: Uuid,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentSummary> for SummaryResponse {
    fn from(s: DocumentSummary) -> Self {
        SummaryResponse {
            document_id: s.document_id,
            summary_text: s.summary_text,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// A file entry in the hierarchical listing view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileItem {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub file_type: String,
}

/// A folder entry synthesized from the documents that reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderItem {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub children: Vec<FileItem>,
}

/// One node of the computed folder/file tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Folder(FolderItem),
    File(FileItem),
}
