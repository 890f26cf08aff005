use std::env;

use dotenvy::dotenv;
use validator::Validate;

/// Which metadata backend holds document records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Validate)]
pub struct Config {
    pub database_url: String,
    pub metadata_backend: MetadataBackend,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub s3_bucket: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    #[validate(range(min = 1, max = 104857600))] // Max 100MB
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub use_s3: bool,
    /// Local mirror for uploaded bytes. Unset disables the backup writer.
    pub local_backup_dir: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub summary_max_tokens: u32,
    /// Enqueue a summarization job right after each upload.
    pub summarize_on_upload: bool,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, env::VarError> {
        // Load environment variables from `.env` file (if it exists)
        dotenv().ok();

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "pdf,docx,txt".to_string())
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let metadata_backend = match env::var("METADATA_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => MetadataBackend::Memory,
            _ => MetadataBackend::Postgres,
        };

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty());

        let config = Config {
            database_url: match metadata_backend {
                // The memory backend never touches Postgres.
                MetadataBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
                MetadataBackend::Postgres => env::var("DATABASE_URL")?,
            },
            metadata_backend,
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            s3_bucket: env::var("S3_BUCKET").unwrap_or_else(|_| "document-vault".to_string()),
            s3_access_key: env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            s3_secret_key: env::var("S3_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            max_file_size: env::var("MAX_FILE_SIZE")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse()
                .unwrap_or(10_485_760),
            allowed_extensions,
            use_s3: env::var("USE_S3")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            local_backup_dir: env::var("LOCAL_BACKUP_DIR").ok().filter(|d| !d.is_empty()),
            summarize_on_upload: env::var("SUMMARIZE_ON_UPLOAD")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true)
                && anthropic_api_key.is_some(),
            anthropic_api_key,
            anthropic_model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            summary_max_tokens: env::var("SUMMARY_MAX_TOKENS")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .unwrap_or(1024),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        // Validate configuration values (e.g. file size range)
        config.validate().expect("Invalid Configuration");
        Ok(config)
    }

    pub fn extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|e| e == extension)
    }
}
