//! Configuration module
//!
//! Application configuration loaded from environment variables, with
//! fail-fast validation for settings that cannot be defaulted safely.

use std::env;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;
const REMOTE_OP_TIMEOUT_SECS: u64 = 30;
const MAX_IMAGE_SIZE_MB: usize = 10;
const MAX_VIDEO_SIZE_MB: usize = 512;

/// Which object-storage backend serves media assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Token issuance
    pub access_token_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_secret: String,
    pub refresh_token_ttl_days: i64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, Spaces)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload handling
    pub upload_spool_dir: Option<String>,
    pub remote_op_timeout_seconds: u64,
    pub max_image_size_bytes: usize,
    pub image_allowed_extensions: Vec<String>,
    pub image_allowed_content_types: Vec<String>,
    pub max_video_size_bytes: usize,
    pub video_allowed_extensions: Vec<String>,
    pub video_allowed_content_types: Vec<String>,
    /// Whether newly uploaded videos are visible immediately or start hidden.
    pub publish_on_upload: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            "local" => StorageBackend::Local,
            other => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 's3' or 'local', got '{}'",
                    other
                ))
            }
        };

        let config = Config {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            cors_origins,
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET must be set"))?,
            access_token_ttl_minutes: env::var("ACCESS_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| ACCESS_TOKEN_TTL_MINUTES.to_string())
                .parse()
                .unwrap_or(ACCESS_TOKEN_TTL_MINUTES),
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .map_err(|_| anyhow::anyhow!("REFRESH_TOKEN_SECRET must be set"))?,
            refresh_token_ttl_days: env::var("REFRESH_TOKEN_TTL_DAYS")
                .unwrap_or_else(|_| REFRESH_TOKEN_TTL_DAYS.to_string())
                .parse()
                .unwrap_or(REFRESH_TOKEN_TTL_DAYS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            upload_spool_dir: env::var("UPLOAD_SPOOL_DIR").ok(),
            remote_op_timeout_seconds: env::var("REMOTE_OP_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| REMOTE_OP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REMOTE_OP_TIMEOUT_SECS),
            max_image_size_bytes: env::var("MAX_IMAGE_SIZE_MB")
                .unwrap_or_else(|_| MAX_IMAGE_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_IMAGE_SIZE_MB)
                * 1024
                * 1024,
            image_allowed_extensions: env::var("IMAGE_ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| "jpg,jpeg,png,gif,webp".to_string())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .collect(),
            image_allowed_content_types: env::var("IMAGE_ALLOWED_CONTENT_TYPES")
                .unwrap_or_else(|_| "image/jpeg,image/png,image/gif,image/webp".to_string())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .collect(),
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_MB")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_VIDEO_SIZE_MB)
                * 1024
                * 1024,
            video_allowed_extensions: env::var("VIDEO_ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| "mp4,mov,webm,mkv".to_string())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .collect(),
            video_allowed_content_types: env::var("VIDEO_ALLOWED_CONTENT_TYPES")
                .unwrap_or_else(|_| {
                    "video/mp4,video/quicktime,video/webm,video/x-matroska".to_string()
                })
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .collect(),
            publish_on_upload: env::var("PUBLISH_ON_UPLOAD")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Fail fast on settings that would only break at request time.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() || self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET and S3_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
        }

        if self.access_token_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "ACCESS_TOKEN_SECRET must be at least 32 bytes"
            ));
        }
        if self.refresh_token_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "REFRESH_TOKEN_SECRET must be at least 32 bytes"
            ));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(anyhow::anyhow!(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ"
            ));
        }

        if self.access_token_ttl_minutes <= 0 || self.refresh_token_ttl_days <= 0 {
            return Err(anyhow::anyhow!("Token TTLs must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_port: 8080,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            database_url: "postgres://localhost/vidora_test".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            access_token_secret: "a".repeat(32),
            access_token_ttl_minutes: 15,
            refresh_token_secret: "b".repeat(32),
            refresh_token_ttl_days: 7,
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: Some("/tmp/vidora".to_string()),
            local_storage_base_url: Some("http://localhost:8080/files".to_string()),
            upload_spool_dir: None,
            remote_op_timeout_seconds: REMOTE_OP_TIMEOUT_SECS,
            max_image_size_bytes: MAX_IMAGE_SIZE_MB * 1024 * 1024,
            image_allowed_extensions: vec!["jpg".to_string()],
            image_allowed_content_types: vec!["image/jpeg".to_string()],
            max_video_size_bytes: MAX_VIDEO_SIZE_MB * 1024 * 1024,
            video_allowed_extensions: vec!["mp4".to_string()],
            video_allowed_content_types: vec!["video/mp4".to_string()],
            publish_on_upload: true,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = test_config();
        config.access_token_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_secret() {
        let mut config = test_config();
        config.refresh_token_secret = config.access_token_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_s3_settings() {
        let mut config = test_config();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());
        config.s3_bucket = Some("media".to_string());
        config.s3_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
    }
}
