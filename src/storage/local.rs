use std::path::Path;
use bytes::Bytes;
use super::{Storage, StorageError};
use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};

// Local filesystem storage
#[derive(Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    /// Creates a new LocalStorage instance rooted at `base_path`.
    pub async fn new(base_path: &str) -> Self {
        fs::create_dir_all(base_path)
            .await
            .expect("Failed to create storage directory");
        Self {
            base_path: base_path.to_string(),
        }
    }

    /// Returns the full path of a file relative to the base directory
    fn get_full_path(&self, file_path: &str) -> String {
        format!("{}/{}", self.base_path, file_path)
    }

    /// Strips the base-path prefix from a persisted storage reference.
    pub fn strip_base<'a>(&self, storage_path: &'a str) -> &'a str {
        storage_path
            .strip_prefix(&format!("{}/", self.base_path))
            .unwrap_or(storage_path)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, file_path: &str, content: Bytes) -> Result<String, StorageError> {
        let full_path = self.get_full_path(file_path);

        // Ensure parent directories exist
        if let Some(parent) = Path::new(&full_path).parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&content).await?;

        tracing::info!("Saved file at {:?}", full_path);

        Ok(full_path)
    }

    async fn download(&self, file_path: &str) -> Result<Bytes, StorageError> {
        let full_path = self.get_full_path(file_path);

        if !Path::new(&full_path).exists() {
            return Err(StorageError::NotFound(file_path.to_string()));
        }

        let content = fs::read(&full_path).await.map_err(StorageError::IoError)?;

        Ok(Bytes::from(content))
    }
}
