use bytes::Bytes;

use crate::error::AppError;

/// Pulls plain text out of a stored payload for summarization input.
///
/// PDFs go through `pdf-extract` on a blocking thread; `text/*` payloads are
/// decoded as UTF-8. Anything else is not extractable.
pub async fn extract_text(content_type: &str, content: Bytes) -> Result<String, AppError> {
    let text = if content_type == "application/pdf" {
        extract_pdf_text(content).await?
    } else if content_type.starts_with("text/") {
        String::from_utf8(content.to_vec())
            .map_err(|e| AppError::Extraction(format!("Invalid UTF-8 text payload: {}", e)))?
    } else {
        return Err(AppError::Extraction(format!(
            "No text extractor for content type '{}'",
            content_type
        )));
    };

    if text.trim().is_empty() {
        return Err(AppError::Extraction(
            "Document contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}

/// PDF parsing is CPU-bound, so it runs off the async executor.
async fn extract_pdf_text(content: Bytes) -> Result<String, AppError> {
    let data = content.to_vec();
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&data)
            .map_err(|e| AppError::Extraction(format!("Failed to parse PDF: {}", e)))
    })
    .await
    .map_err(|e| AppError::Extraction(format!("Extraction task failed: {}", e)))?
}
