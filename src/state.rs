use crate::accounts::{PasswordCipher, PgUserStore, UserManager};
use crate::config::AppConfig;
use crate::storage::{Storage, StorageClient};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let storage = Arc::new(
            Storage::new(
                &config.minio_endpoint,
                &config.minio_bucket,
                &config.minio_access_key,
                &config.minio_secret_key,
                &config.minio_region,
            )
            .await?,
        ) as Arc<dyn StorageClient>;

        Ok(Self {
            db,
            config,
            storage,
        })
    }

    pub fn users(&self) -> UserManager {
        UserManager::new(
            Arc::new(PgUserStore::new(self.db.clone())),
            self.storage.clone(),
            PasswordCipher::new(&self.config.encryption_key),
            self.config.thumbnail.clone(),
        )
    }
}
