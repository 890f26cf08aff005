use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Document, DocumentSummary, MetadataPatch, NewDocument};

use super::DocumentRepository;

/// Relational adapter backed by the shared connection pool.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgRepository {
    async fn insert(&self, new: NewDocument) -> Result<Document, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (
                id, filename, original_filename, content_type, file_size,
                storage_path, backup_path, description, tags, folder_id, folder_name
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(&new.filename)
        .bind(&new.original_filename)
        .bind(&new.content_type)
        .bind(new.file_size)
        .bind(&new.storage_path)
        .bind(&new.backup_path)
        .bind(&new.description)
        .bind(&new.tags)
        .bind(&new.folder_id)
        .bind(&new.folder_name)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_active(&self, id: Uuid) -> Result<Option<Document>, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_active(&self, folder_id: Option<&str>) -> Result<Vec<Document>, sqlx::Error> {
        match folder_id {
            Some(folder) => {
                sqlx::query_as::<_, Document>(
                    r#"
                    SELECT * FROM documents
                    WHERE is_active = TRUE AND folder_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(folder)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Document>(
                    "SELECT * FROM documents WHERE is_active = TRUE ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    async fn update_metadata(
        &self,
        id: Uuid,
        patch: MetadataPatch,
    ) -> Result<Option<Document>, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET description = COALESCE($2, description),
                tags = COALESCE($3, tags),
                updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.description)
        .bind(&patch.tags)
        .fetch_optional(&self.pool)
        .await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_summary(&self, document_id: Uuid) -> Result<Option<DocumentSummary>, sqlx::Error> {
        sqlx::query_as::<_, DocumentSummary>(
            "SELECT * FROM document_summaries WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn upsert_summary(
        &self,
        document_id: Uuid,
        summary_text: &str,
    ) -> Result<DocumentSummary, sqlx::Error> {
        sqlx::query_as::<_, DocumentSummary>(
            r#"
            INSERT INTO document_summaries (document_id, summary_text)
            VALUES ($1, $2)
            ON CONFLICT (document_id)
            DO UPDATE SET summary_text = EXCLUDED.summary_text, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(document_id)
        .bind(summary_text)
        .fetch_one(&self.pool)
        .await
    }
}
