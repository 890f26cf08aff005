use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::backup::LocalBackup;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    Document, DocumentSummary, FileItem, FolderItem, MetadataPatch, NewDocument, TreeNode,
};
use crate::repository::DocumentRepository;
use crate::storage::{Storage, StorageBackend};
use crate::summarize::{SummaryJob, SummaryPipeline};
use crate::utils::{get_file_extension, split_folder_prefix, unique_storage_filename};

/// A validated-not-yet-persisted upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub folder_id: Option<String>,
    pub folder_name: Option<String>,
}

/// What a summary request produced.
#[derive(Debug)]
pub enum SummaryOutcome {
    /// A cached (or freshly generated) summary record.
    Cached(DocumentSummary),
    /// Generation is in flight on the background worker; retry later.
    Pending,
}

/// Orchestrates validation, storage, metadata persistence and the
/// summarization flow. Provider-agnostic on both the repository and the
/// storage side.
pub struct DocumentService {
    repo: Arc<dyn DocumentRepository>,
    storage: StorageBackend,
    backup: Option<LocalBackup>,
    config: Config,
    pipeline: Option<Arc<SummaryPipeline>>,
    jobs: Option<mpsc::Sender<SummaryJob>>,
}

impl DocumentService {
    pub fn new(
        repo: Arc<dyn DocumentRepository>,
        storage: StorageBackend,
        backup: Option<LocalBackup>,
        config: Config,
        pipeline: Option<Arc<SummaryPipeline>>,
        jobs: Option<mpsc::Sender<SummaryJob>>,
    ) -> Self {
        Self {
            repo,
            storage,
            backup,
            config,
            pipeline,
            jobs,
        }
    }

    /// Validate and persist one upload. Validation failures abort before any
    /// write; a backup-write failure never does.
    pub async fn upload(&self, request: UploadRequest) -> Result<Document, AppError> {
        if request.original_filename.trim().is_empty() {
            return Err(AppError::BadRequest("Filename must not be empty".into()));
        }

        // A `folder/name.ext` filename carries its folder with it unless the
        // caller named one explicitly.
        let (prefix_folder, original_filename) = split_folder_prefix(&request.original_filename);
        let folder_name = request.folder_name.or(prefix_folder);

        let extension = get_file_extension(&original_filename)
            .ok_or_else(|| AppError::BadRequest("Invalid file extension".into()))?;

        if !self.config.extension_allowed(&extension) {
            error!("File extension .{} is not allowed", extension);
            return Err(AppError::UnSupportedMediaType(format!(
                "File extension .{} is not allowed",
                extension
            )));
        }

        let file_size = request.data.len() as u64;
        if file_size > self.config.max_file_size {
            error!(
                "File size {} exceeds maximum limit of {} bytes",
                file_size, self.config.max_file_size
            );
            return Err(AppError::PayloadTooLarge(format!(
                "File size {} exceeds maximum limit of {} bytes",
                file_size, self.config.max_file_size
            )));
        }

        let filename = unique_storage_filename(&original_filename);
        let key = format!("files/{}", filename);

        let storage_path = self.storage.upload(&key, request.data.clone()).await?;

        // Mirror to the local backup if configured; the remote copy stays
        // authoritative, so a failed mirror only logs.
        let backup_path = match &self.backup {
            Some(backup) => backup.write(&key, &request.data).await,
            None => None,
        };

        let id = Uuid::new_v4();
        let content_type = request
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let document = self
            .repo
            .insert(NewDocument {
                id,
                filename,
                original_filename,
                content_type,
                file_size: file_size as i64,
                storage_path: storage_path.clone(),
                backup_path,
                description: request.description,
                tags: request.tags,
                folder_id: request.folder_id,
                folder_name,
            })
            .await
            .map_err(|e| {
                // No compensating delete: the stored object is orphaned.
                error!(
                    "Metadata insert failed after storage write, orphaned object at {}: {}",
                    storage_path, e
                );
                AppError::from(e)
            })?;

        info!("Document uploaded: {} ({} bytes)", document.id, file_size);

        if let Some(jobs) = &self.jobs {
            // Fire-and-forget: a full queue or send failure never affects the
            // upload response.
            if let Err(e) = jobs.try_send(SummaryJob {
                document_id: document.id,
            }) {
                warn!("Could not enqueue summary job for {}: {}", document.id, e);
            }
        }

        Ok(document)
    }

    pub async fn get(&self, id: Uuid) -> Result<Document, AppError> {
        self.repo
            .get_active(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    pub async fn list(&self, folder_id: Option<&str>) -> Result<Vec<Document>, AppError> {
        Ok(self.repo.list_active(folder_id).await?)
    }

    /// Computed folder/file projection over the flat active collection.
    /// Folders are synthesized from the folder references on the records.
    pub async fn tree(&self) -> Result<Vec<TreeNode>, AppError> {
        let documents = self.repo.list_active(None).await?;

        let mut folders: Vec<FolderItem> = Vec::new();
        let mut root_files: Vec<FileItem> = Vec::new();

        for doc in documents {
            let file = FileItem {
                id: doc.id,
                name: doc.original_filename.clone(),
                created_at: doc.created_at,
                file_type: get_file_extension(&doc.original_filename).unwrap_or_default(),
            };

            let folder_key = match (&doc.folder_id, &doc.folder_name) {
                (Some(id), _) => Some(id.clone()),
                (None, Some(name)) if !name.trim().is_empty() => Some(name.clone()),
                _ => None,
            };

            match folder_key {
                Some(key) => match folders.iter_mut().find(|f| f.id == key) {
                    Some(folder) => folder.children.push(file),
                    None => folders.push(FolderItem {
                        id: key,
                        name: doc
                            .folder_name
                            .clone()
                            .unwrap_or_else(|| "unnamed".to_string()),
                        created_at: doc.created_at,
                        children: vec![file],
                    }),
                },
                None => root_files.push(file),
            }
        }

        let mut items: Vec<TreeNode> = folders.into_iter().map(TreeNode::Folder).collect();
        items.extend(root_files.into_iter().map(TreeNode::File));
        Ok(items)
    }

    /// Resolve a document's storage reference and fetch its bytes.
    pub async fn download(&self, id: Uuid) -> Result<(Document, Bytes), AppError> {
        let document = self.get(id).await?;
        let key = self.storage.relative_key(&document.storage_path).to_string();
        let content = self.storage.download(&key).await?;
        Ok((document, content))
    }

    /// Partial metadata update. Only description/tags are mutable.
    pub async fn update_metadata(
        &self,
        id: Uuid,
        patch: MetadataPatch,
    ) -> Result<Document, AppError> {
        self.repo
            .update_metadata(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    /// Soft delete: the record goes invisible, bytes and backup stay put.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.repo.soft_delete(id).await? {
            info!("Document soft-deleted: {}", id);
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Document {} not found", id)))
        }
    }

    /// Serve the cached summary, or arrange for one to exist.
    ///
    /// With a background worker the un-cached case enqueues a job and reports
    /// `Pending`; without one but with a configured summarizer the pipeline
    /// runs synchronously. `regenerate` forces a synchronous re-run.
    pub async fn summary(&self, id: Uuid, regenerate: bool) -> Result<SummaryOutcome, AppError> {
        // Unknown/inactive ids are a 404 regardless of cache state.
        self.get(id).await?;

        if regenerate {
            let pipeline = self.pipeline.as_ref().ok_or_else(|| {
                AppError::Unavailable("Summarization is not configured".to_string())
            })?;
            return Ok(SummaryOutcome::Cached(pipeline.run(id).await?));
        }

        if let Some(cached) = self.repo.get_summary(id).await? {
            return Ok(SummaryOutcome::Cached(cached));
        }

        match (&self.jobs, &self.pipeline) {
            (Some(jobs), _) => {
                if let Err(e) = jobs.try_send(SummaryJob { document_id: id }) {
                    warn!("Could not enqueue summary job for {}: {}", id, e);
                }
                Ok(SummaryOutcome::Pending)
            }
            (None, Some(pipeline)) => Ok(SummaryOutcome::Cached(pipeline.run(id).await?)),
            (None, None) => Err(AppError::Unavailable(
                "Summarization is not configured".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::config::MetadataBackend;
    use crate::repository::MemoryRepository;
    use crate::storage::LocalDiskStorage;
    use crate::summarize::Summarizer;

    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            metadata_backend: MetadataBackend::Memory,
            s3_endpoint: None,
            s3_region: "us-east-1".to_string(),
            s3_bucket: "test".to_string(),
            s3_access_key: "test".to_string(),
            s3_secret_key: "test".to_string(),
            max_file_size: 1024,
            allowed_extensions: vec!["pdf".to_string(), "txt".to_string()],
            use_s3: false,
            local_backup_dir: None,
            anthropic_api_key: None,
            anthropic_model: "claude-sonnet-4-20250514".to_string(),
            summary_max_tokens: 1024,
            summarize_on_upload: false,
            port: 0,
        }
    }

    struct CountingSummarizer {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Summarizer for CountingSummarizer {
        async fn summarize(&self, _text: &str, filename: &str) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("summary of {}", filename))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct Fixture {
        service: DocumentService,
        repo: Arc<MemoryRepository>,
        calls: Arc<AtomicUsize>,
        _dir: tempfile::TempDir,
    }

    async fn fixture(with_summarizer: bool, with_backup: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageBackend::Local(
            LocalDiskStorage::new(dir.path().join("store").to_str().unwrap()).await,
        );
        let repo = Arc::new(MemoryRepository::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let pipeline = with_summarizer.then(|| {
            Arc::new(SummaryPipeline::new(
                repo.clone() as Arc<dyn DocumentRepository>,
                storage.clone(),
                Arc::new(CountingSummarizer {
                    calls: calls.clone(),
                }),
            ))
        });

        let backup = with_backup
            .then(|| LocalBackup::new(dir.path().join("backup").to_str().unwrap()));

        let service = DocumentService::new(
            repo.clone(),
            storage,
            backup,
            test_config(),
            pipeline,
            None,
        );

        Fixture {
            service,
            repo,
            calls,
            _dir: dir,
        }
    }

    fn upload_request(filename: &str, content_type: &str, data: &'static [u8]) -> UploadRequest {
        UploadRequest {
            data: Bytes::from_static(data),
            original_filename: filename.to_string(),
            content_type: Some(content_type.to_string()),
            description: None,
            tags: None,
            folder_id: None,
            folder_name: None,
        }
    }

    #[tokio::test]
    async fn upload_returns_matching_size_and_content_type() {
        let f = fixture(false, false).await;
        let mut request = upload_request("report.pdf", "application/pdf", b"%PDF-1.4 fake");
        request.description = Some("Q1 report".to_string());
        request.tags = Some(vec!["finance".to_string()]);

        let doc = f.service.upload(request).await.unwrap();

        assert!(doc.is_active);
        assert_eq!(doc.file_size, 13);
        assert_eq!(doc.content_type, "application/pdf");
        assert_eq!(doc.original_filename, "report.pdf");
        assert_eq!(doc.description.as_deref(), Some("Q1 report"));
        assert!(doc.filename.starts_with("report_"));
        assert!(doc.updated_at.is_none());
    }

    #[tokio::test]
    async fn oversize_upload_leaves_no_trace() {
        let f = fixture(false, false).await;
        let request = UploadRequest {
            data: Bytes::from(vec![0u8; 2048]),
            ..upload_request("big.pdf", "application/pdf", b"")
        };

        let err = f.service.upload(request).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert_eq!(f.repo.document_count().await, 0);
    }

    #[tokio::test]
    async fn disallowed_extension_leaves_no_trace() {
        let f = fixture(false, false).await;
        let err = f
            .service
            .upload(upload_request("tool.exe", "application/octet-stream", b"MZ"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnSupportedMediaType(_)));
        assert_eq!(f.repo.document_count().await, 0);
    }

    #[tokio::test]
    async fn empty_filename_is_rejected() {
        let f = fixture(false, false).await;
        let err = f
            .service
            .upload(upload_request("  ", "text/plain", b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn upload_then_download_round_trips() {
        let f = fixture(false, false).await;
        let doc = f
            .service
            .upload(upload_request("notes.txt", "text/plain", b"exact bytes here"))
            .await
            .unwrap();

        let (fetched, content) = f.service.download(doc.id).await.unwrap();
        assert_eq!(fetched.id, doc.id);
        assert_eq!(&content[..], b"exact bytes here");
    }

    #[tokio::test]
    async fn backup_mirror_is_recorded_when_configured() {
        let f = fixture(false, true).await;
        let doc = f
            .service
            .upload(upload_request("notes.txt", "text/plain", b"mirrored"))
            .await
            .unwrap();

        let backup_path = doc.backup_path.expect("backup path should be set");
        let mirrored = tokio::fs::read(&backup_path).await.unwrap();
        assert_eq!(mirrored, b"mirrored");
    }

    #[tokio::test]
    async fn soft_delete_hides_the_document_but_keeps_bytes() {
        let f = fixture(false, false).await;
        let doc = f
            .service
            .upload(upload_request("notes.txt", "text/plain", b"keep me"))
            .await
            .unwrap();

        f.service.delete(doc.id).await.unwrap();

        assert!(matches!(
            f.service.get(doc.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(f.service.list(None).await.unwrap().is_empty());
        assert!(matches!(
            f.service.delete(doc.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));

        // The storage reference still resolves for audit.
        let key = f.service.storage.relative_key(&doc.storage_path);
        let stored = f.service.storage.download(key).await.unwrap();
        assert_eq!(&stored[..], b"keep me");
    }

    #[tokio::test]
    async fn update_only_touches_mutable_fields() {
        let f = fixture(false, false).await;
        let doc = f
            .service
            .upload(upload_request("notes.txt", "text/plain", b"v1"))
            .await
            .unwrap();

        let updated = f
            .service
            .update_metadata(
                doc.id,
                MetadataPatch {
                    description: Some("described".to_string()),
                    tags: Some(vec!["a".to_string(), "b".to_string()]),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.description.as_deref(), Some("described"));
        assert_eq!(updated.tags.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
        assert!(updated.updated_at.is_some());
        // Immutable fields are untouched.
        assert_eq!(updated.filename, doc.filename);
        assert_eq!(updated.content_type, doc.content_type);
        assert_eq!(updated.file_size, doc.file_size);
        assert_eq!(updated.storage_path, doc.storage_path);
        assert_eq!(updated.created_at, doc.created_at);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let f = fixture(false, false).await;
        let err = f
            .service
            .update_metadata(Uuid::new_v4(), MetadataPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn summary_is_generated_once_then_served_from_cache() {
        let f = fixture(true, false).await;
        let doc = f
            .service
            .upload(upload_request("notes.txt", "text/plain", b"summarize me"))
            .await
            .unwrap();

        let first = match f.service.summary(doc.id, false).await.unwrap() {
            SummaryOutcome::Cached(s) => s,
            SummaryOutcome::Pending => panic!("expected synchronous generation"),
        };
        let second = match f.service.summary(doc.id, false).await.unwrap() {
            SummaryOutcome::Cached(s) => s,
            SummaryOutcome::Pending => panic!("expected cached summary"),
        };

        assert_eq!(first.summary_text, "summary of notes.txt");
        assert_eq!(first.summary_text, second.summary_text);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(first.updated_at, second.updated_at);
        // The summarizer ran exactly once.
        assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn regenerate_overwrites_the_cached_summary() {
        let f = fixture(true, false).await;
        let doc = f
            .service
            .upload(upload_request("notes.txt", "text/plain", b"summarize me"))
            .await
            .unwrap();

        f.service.summary(doc.id, false).await.unwrap();
        f.service.summary(doc.id, true).await.unwrap();

        assert_eq!(f.calls.load(Ordering::SeqCst), 2);
        // Still exactly one record.
        assert!(f.repo.get_summary(doc.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn summary_without_a_summarizer_is_unavailable() {
        let f = fixture(false, false).await;
        let doc = f
            .service
            .upload(upload_request("notes.txt", "text/plain", b"text"))
            .await
            .unwrap();

        let err = f.service.summary(doc.id, false).await.unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
    }

    #[tokio::test]
    async fn summary_for_unknown_document_is_not_found() {
        let f = fixture(true, false).await;
        let err = f.service.summary(Uuid::new_v4(), false).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn summary_reports_pending_while_the_worker_owns_generation() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageBackend::Local(
            LocalDiskStorage::new(dir.path().to_str().unwrap()).await,
        );
        let repo = Arc::new(MemoryRepository::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Arc::new(SummaryPipeline::new(
            repo.clone() as Arc<dyn DocumentRepository>,
            storage.clone(),
            Arc::new(CountingSummarizer {
                calls: calls.clone(),
            }),
        ));
        // A channel nobody consumes: generation stays in flight forever.
        let (tx, _rx) = tokio::sync::mpsc::channel(8);

        let service = DocumentService::new(
            repo,
            storage,
            None,
            test_config(),
            Some(pipeline),
            Some(tx),
        );

        let doc = service
            .upload(upload_request("notes.txt", "text/plain", b"text"))
            .await
            .unwrap();

        assert!(matches!(
            service.summary(doc.id, false).await.unwrap(),
            SummaryOutcome::Pending
        ));
        // Nothing ran synchronously.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tree_groups_documents_by_folder() {
        let f = fixture(false, false).await;

        let mut in_folder = upload_request("q1.pdf", "application/pdf", b"1");
        in_folder.folder_id = Some("f-1".to_string());
        in_folder.folder_name = Some("reports".to_string());
        f.service.upload(in_folder).await.unwrap();

        let mut in_folder_too = upload_request("q2.pdf", "application/pdf", b"2");
        in_folder_too.folder_id = Some("f-1".to_string());
        in_folder_too.folder_name = Some("reports".to_string());
        f.service.upload(in_folder_too).await.unwrap();

        f.service
            .upload(upload_request("loose.txt", "text/plain", b"3"))
            .await
            .unwrap();

        let tree = f.service.tree().await.unwrap();
        assert_eq!(tree.len(), 2);

        let folder = tree
            .iter()
            .find_map(|n| match n {
                TreeNode::Folder(folder) => Some(folder),
                TreeNode::File(_) => None,
            })
            .expect("one folder node");
        assert_eq!(folder.id, "f-1");
        assert_eq!(folder.name, "reports");
        assert_eq!(folder.children.len(), 2);

        assert!(tree.iter().any(|n| matches!(
            n,
            TreeNode::File(file) if file.name == "loose.txt" && file.file_type == "txt"
        )));
    }

    #[tokio::test]
    async fn folder_prefix_in_filename_becomes_the_folder_name() {
        let f = fixture(false, false).await;
        let doc = f
            .service
            .upload(upload_request("reports/q1.pdf", "application/pdf", b"1"))
            .await
            .unwrap();

        assert_eq!(doc.original_filename, "q1.pdf");
        assert_eq!(doc.folder_name.as_deref(), Some("reports"));
    }
}
