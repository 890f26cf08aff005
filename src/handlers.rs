use axum::{Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{DocumentResponse, MetadataPatch, SummaryResponse, TreeNode},
    service::{SummaryOutcome, UploadRequest},
    state::AppState,
};

/// Upload a document using multipart/form-data.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    // Temporary holders for multipart fields
    let mut file_data: Option<Bytes> = None;
    let mut original_filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut description: Option<String> = None;
    let mut tags: Option<Vec<String>> = None;
    let mut folder_id: Option<String> = None;
    let mut folder_name: Option<String> = None;

    // Parse multipart fields
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Error parsing multipart: {}", e);
        AppError::MultipartError(format!("Failed to parse multipart form: {}", e))
    })? {
        match field.name().unwrap_or("") {
            "file" => {
                original_filename = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    error!("Error reading file bytes: {}", e);
                    AppError::MultipartError(format!("Failed to read the file: {}", e))
                })?;
                file_data = Some(data);
            }
            "description" => {
                if let Ok(text) = field.text().await {
                    if !text.is_empty() {
                        description = Some(text);
                    }
                }
            }
            "tags" => {
                // Comma-separated tag list
                if let Ok(text) = field.text().await {
                    let parsed: Vec<String> = text
                        .split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect();
                    if !parsed.is_empty() {
                        tags = Some(parsed);
                    }
                }
            }
            "folder_id" => {
                if let Ok(text) = field.text().await {
                    if !text.is_empty() {
                        folder_id = Some(text);
                    }
                }
            }
            "folder_name" => {
                if let Ok(text) = field.text().await {
                    if !text.is_empty() {
                        folder_name = Some(text);
                    }
                }
            }
            _ => {}
        }
    }

    let data = file_data.ok_or_else(|| AppError::BadRequest("No file provided".into()))?;
    let original_filename =
        original_filename.ok_or_else(|| AppError::BadRequest("No file provided".into()))?;

    let document = state
        .service
        .upload(UploadRequest {
            data,
            original_filename,
            content_type,
            description,
            tags,
            folder_id,
            folder_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(document.into())))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub folder_id: Option<String>,
}

/// List active documents, optionally filtered by folder.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let documents = state.service.list(query.folder_id.as_deref()).await?;
    Ok(Json(documents.into_iter().map(Into::into).collect()))
}

/// Nested folder/file view computed from the flat document collection.
pub async fn document_tree(
    State(state): State<AppState>,
) -> Result<Json<Vec<TreeNode>>, AppError> {
    Ok(Json(state.service.tree().await?))
}

/// Get metadata for a single document by its ID.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = state.service.get(id).await?;
    Ok(Json(document.into()))
}

/// Update the mutable metadata fields (description, tags).
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MetadataPatch>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = state.service.update_metadata(id, patch).await?;
    Ok(Json(document.into()))
}

/// Soft-delete a document. Stored bytes are kept.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.service.delete(id).await?;
    // 204 No Content indicates successful deletion with no response body
    Ok(StatusCode::NO_CONTENT)
}

/// Download a document's bytes with its original content type.
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (document, content) = state.service.download(id).await?;

    let mut response = Response::new(content.into());

    // Content-Type so the browser knows the file type
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_str(&document.content_type)
            .unwrap_or_else(|_| header::HeaderValue::from_static("application/octet-stream")),
    );

    // Content-Disposition preserves the original filename
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        header::HeaderValue::from_str(&format!(
            "attachment; filename=\"{}\"",
            document.original_filename
        ))
        .unwrap_or_else(|_| header::HeaderValue::from_static("attachment")),
    );

    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub regenerate: bool,
}

/// Serve the cached document summary, or report that generation is pending.
pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, AppError> {
    match state.service.summary(id, query.regenerate).await? {
        SummaryOutcome::Cached(summary) => {
            Ok(Json(SummaryResponse::from(summary)).into_response())
        }
        SummaryOutcome::Pending => Ok((
            StatusCode::ACCEPTED,
            Json(json!({"status": "pending", "document_id": id})),
        )
            .into_response()),
    }
}
