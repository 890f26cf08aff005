mod backup;
mod config;
mod database;
mod error;
mod handlers;
mod models;
mod repository;
mod service;
mod state;
mod storage;
mod summarize;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::{delete, get, post, put}, Router};
use tracing::info;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    backup::LocalBackup,
    config::Config,
    handlers::{
        delete_document, document_tree, download_document, get_document, get_summary,
        list_documents, update_document, upload_document,
    },
    repository::init_repository,
    service::DocumentService,
    state::AppState,
    storage::init_storage,
    summarize::{spawn_summary_worker, ClaudeSummarizer, SummaryPipeline, Summarizer},
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()
        .expect("Failed to load configuration");

    let repo = init_repository(&config)
        .await
        .expect("Failed to initialize metadata repository");

    let storage = init_storage(&config).await;

    let backup = config.local_backup_dir.as_deref().map(LocalBackup::new);

    let pipeline = ClaudeSummarizer::from_config(&config).map(|summarizer| {
        Arc::new(SummaryPipeline::new(
            repo.clone(),
            storage.clone(),
            Arc::new(summarizer) as Arc<dyn Summarizer>,
        ))
    });

    let jobs = match (&pipeline, config.summarize_on_upload) {
        (Some(pipeline), true) => Some(spawn_summary_worker(pipeline.clone())),
        _ => None,
    };

    let service = Arc::new(DocumentService::new(
        repo,
        storage,
        backup,
        config.clone(),
        pipeline,
        jobs,
    ));

    let app_state = AppState { service };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/documents", post(upload_document))
        .route("/documents", get(list_documents))
        .route("/documents/tree", get(document_tree))
        .route("/documents/{id}", get(get_document))
        .route("/documents/{id}", put(update_document))
        .route("/documents/{id}", delete(delete_document))
        .route("/documents/{id}/download", get(download_document))
        .route("/documents/{id}/summary", get(get_summary))
        // Leave room for multipart framing around the configured file limit;
        // oversize files still get the service's 413.
        .layer(DefaultBodyLimit::max(config.max_file_size as usize + 64 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
