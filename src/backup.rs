use std::path::Path;

use bytes::Bytes;
use tokio::{fs, io::AsyncWriteExt};
use tracing::warn;

/// Best-effort local mirror of uploaded bytes. The remote copy stays
/// authoritative: a failed mirror write is logged and swallowed.
#[derive(Clone)]
pub struct LocalBackup {
    base_dir: String,
}

impl LocalBackup {
    pub fn new(base_dir: &str) -> Self {
        Self {
            base_dir: base_dir.to_string(),
        }
    }

    /// Writes a copy of `content` under the backup directory. Returns the
    /// backup path on success, `None` when the write failed.
    pub async fn write(&self, filename: &str, content: &Bytes) -> Option<String> {
        let full_path = format!("{}/{}", self.base_dir, filename);
        match self.try_write(&full_path, content).await {
            Ok(()) => Some(full_path),
            Err(e) => {
                warn!("Local backup write failed for {}: {}", full_path, e);
                None
            }
        }
    }

    async fn try_write(&self, full_path: &str, content: &Bytes) -> std::io::Result<()> {
        if let Some(parent) = Path::new(full_path).parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(full_path).await?;
        file.write_all(content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_a_mirror_copy() {
        let dir = tempfile::tempdir().unwrap();
        let backup = LocalBackup::new(dir.path().to_str().unwrap());

        let path = backup
            .write("files/report_abc.pdf", &Bytes::from_static(b"pdf bytes"))
            .await
            .expect("backup write should succeed");

        let stored = tokio::fs::read(&path).await.unwrap();
        assert_eq!(stored, b"pdf bytes");
    }

    #[tokio::test]
    async fn failure_yields_none_instead_of_error() {
        // Point the backup at a path that cannot be a directory.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        tokio::fs::write(&blocker, b"not a dir").await.unwrap();

        let backup = LocalBackup::new(blocker.to_str().unwrap());
        assert!(backup.write("files/x.pdf", &Bytes::from_static(b"x")).await.is_none());
    }
}
