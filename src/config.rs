use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 30,
            height: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// AES-256 key used for `encrypted_password`.
    pub encryption_key: [u8; 32],
    pub minio_endpoint: String,
    pub minio_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub minio_region: String,
    pub thumbnail: ThumbnailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let encryption_key = parse_key(
            &std::env::var("ACCOUNTS_ENCRYPTION_KEY")
                .context("ACCOUNTS_ENCRYPTION_KEY is not set")?,
        )?;
        let defaults = ThumbnailConfig::default();
        let thumbnail = ThumbnailConfig {
            width: env_parse("THUMBNAIL_WIDTH").unwrap_or(defaults.width),
            height: env_parse("THUMBNAIL_HEIGHT").unwrap_or(defaults.height),
        };
        Ok(Self {
            database_url,
            encryption_key,
            minio_endpoint: std::env::var("MINIO_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".into()),
            minio_bucket: std::env::var("MINIO_BUCKET").unwrap_or_else(|_| "accounts".into()),
            minio_access_key: std::env::var("MINIO_ACCESS_KEY")
                .unwrap_or_else(|_| "minioadmin".into()),
            minio_secret_key: std::env::var("MINIO_SECRET_KEY")
                .unwrap_or_else(|_| "minioadmin".into()),
            minio_region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
            thumbnail,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

/// Decode a base64 encoded 32-byte key.
pub fn parse_key(encoded: &str) -> anyhow::Result<[u8; 32]> {
    let raw = STANDARD
        .decode(encoded.trim())
        .context("encryption key is not valid base64")?;
    raw.as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("encryption key must be 32 bytes, got {}", raw.len()))
}
