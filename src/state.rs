use std::sync::Arc;

use crate::service::DocumentService;

/// Central application state shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Orchestration layer over repository, storage and summarization.
    pub service: Arc<DocumentService>,
}
