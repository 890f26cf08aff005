// Submodules for local file system storage and S3 storage
mod local;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use crate::{
    storage::{local::LocalStorage, s3::S3Storage},
    config::Config,
};

pub use local::LocalStorage as LocalDiskStorage;

// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Upload Error: {0}")]
    UploadError(String),
}

// Async Storage trait
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload a file to the storage backend.
    /// Returns the full path or key of the uploaded file.
    async fn upload(&self, file_path: &str, content: Bytes) -> Result<String, StorageError>;

    /// Download a file from the storage backend.
    /// Returns the file content as `Bytes`.
    async fn download(&self, file_path: &str) -> Result<Bytes, StorageError>;
}

// Enum to represent storage backends
#[derive(Clone)]
pub enum StorageBackend {
    Local(LocalStorage),
    S3(S3Storage),
}

impl StorageBackend {
    /// Strip the backend prefix off a persisted storage reference, yielding
    /// the relative key the backend expects.
    pub fn relative_key<'a>(&self, storage_path: &'a str) -> &'a str {
        match self {
            StorageBackend::S3(_) => storage_path.strip_prefix("s3://").unwrap_or(storage_path),
            StorageBackend::Local(s) => s.strip_base(storage_path),
        }
    }
}

// Delegates calls to the chosen backend
#[async_trait]
impl Storage for StorageBackend {
    async fn upload(&self, file_path: &str, content: Bytes) -> Result<String, StorageError> {
        match self {
            StorageBackend::Local(s) => s.upload(file_path, content).await,
            StorageBackend::S3(s) => s.upload(file_path, content).await,
        }
    }

    async fn download(&self, file_path: &str) -> Result<Bytes, StorageError> {
        match self {
            StorageBackend::Local(s) => s.download(file_path).await,
            StorageBackend::S3(s) => s.download(file_path).await,
        }
    }
}

// Initialize the storage backend based on config
pub async fn init_storage(config: &Config) -> StorageBackend {
    if config.use_s3 {
        info!("Initializing S3 storage");
        StorageBackend::S3(S3Storage::new(config).await)
    } else {
        info!("Initializing Local storage");
        StorageBackend::Local(LocalStorage::new("storage").await)
    }
}
