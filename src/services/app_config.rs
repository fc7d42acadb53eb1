//! App config store
//!
//! Keeps the admin-editable [`AppConfig`] in three places: a JSON file, the
//! `config_entries` table, and an in-process copy that request handlers read.
//!
//! On load the file and the table are reconciled by timestamp (file mtime
//! against the newest `updated_at`, both in UTC):
//! - both present: the newer one wins and the other is overwritten if it differs
//! - only one present: it is adopted and copied to the other
//! - neither present: defaults are written to both

use crate::db::repositories::AppConfigRepository;
use crate::models::AppConfig;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Error types for config store operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigStoreError {
    /// Rejected admin input; the message is shown to the admin
    #[error("{0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Canonical holder of the app config
pub struct ConfigStore {
    path: PathBuf,
    repo: Arc<dyn AppConfigRepository>,
    current: RwLock<AppConfig>,
}

impl ConfigStore {
    /// Build the store and reconcile the file with the database
    pub async fn load(
        path: impl Into<PathBuf>,
        repo: Arc<dyn AppConfigRepository>,
    ) -> Result<Self, ConfigStoreError> {
        let store = Self {
            path: path.into(),
            repo,
            current: RwLock::new(AppConfig::default()),
        };
        store.reconcile().await?;
        Ok(store)
    }

    /// Location of the JSON mirror
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current config
    pub fn current(&self) -> AppConfig {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace_current(&self, config: AppConfig) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }

    /// Reconcile the JSON file and the database, then cache the winner
    pub async fn reconcile(&self) -> Result<AppConfig, ConfigStoreError> {
        let from_db = self
            .repo
            .load()
            .await
            .context("Failed to load config from database")?;
        let from_file = self.read_file().await?;

        let config = match (from_file, from_db) {
            (Some((file_config, file_updated)), Some((db_config, db_updated))) => {
                if file_updated > db_updated {
                    if file_config != db_config {
                        tracing::info!("Config file is newer than database, syncing database");
                        self.write_db(&file_config).await?;
                    }
                    file_config
                } else {
                    if file_config != db_config {
                        tracing::info!("Database config is newer than file, rewriting file");
                        self.write_file(&db_config).await?;
                    }
                    db_config
                }
            }
            (Some((file_config, _)), None) => {
                tracing::info!("Adopting config file into the database");
                self.write_db(&file_config).await?;
                file_config
            }
            (None, Some((db_config, _))) => {
                tracing::info!(path = %self.path.display(), "Writing database config to file");
                self.write_file(&db_config).await?;
                db_config
            }
            (None, None) => {
                let defaults = AppConfig::default();
                tracing::info!(path = %self.path.display(), "Creating default config");
                self.write_file(&defaults).await?;
                self.write_db(&defaults).await?;
                defaults
            }
        };

        self.replace_current(config.clone());
        Ok(config)
    }

    /// Persist `config` to the file, then the database, then memory
    pub async fn save(&self, config: AppConfig) -> Result<(), ConfigStoreError> {
        self.write_file(&config).await?;
        self.write_db(&config).await?;
        self.replace_current(config);
        Ok(())
    }

    /// Apply the admin form: one dish type or network per line, blank lines
    /// dropped. Both lists must keep at least one entry.
    pub async fn update_from_text(
        &self,
        dish_types_text: &str,
        admin_networks_text: &str,
    ) -> Result<AppConfig, ConfigStoreError> {
        let dish_types = split_lines(dish_types_text);
        let admin_networks = split_lines(admin_networks_text);

        if dish_types.is_empty() {
            return Err(ConfigStoreError::ValidationError(
                "At least one dish type is required".to_string(),
            ));
        }
        if admin_networks.is_empty() {
            return Err(ConfigStoreError::ValidationError(
                "At least one network is required".to_string(),
            ));
        }

        for network in &admin_networks {
            if super::access::IpNetwork::parse(network).is_none() {
                tracing::warn!(network = %network, "Saved admin network does not parse and will never match");
            }
        }

        let config = AppConfig {
            dish_types,
            admin_networks,
        };
        self.save(config.clone()).await?;
        tracing::info!(
            dish_types = config.dish_types.len(),
            admin_networks = config.admin_networks.len(),
            "App config updated"
        );
        Ok(config)
    }

    async fn read_file(&self) -> Result<Option<(AppConfig, DateTime<Utc>)>, ConfigStoreError> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to stat {}", self.path.display()))
                    .into())
            }
        };

        let modified: DateTime<Utc> = metadata
            .modified()
            .with_context(|| format!("Failed to read mtime of {}", self.path.display()))?
            .into();

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        Ok(Some((config, modified)))
    }

    async fn write_file(&self, config: &AppConfig) -> Result<(), ConfigStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    async fn write_db(&self, config: &AppConfig) -> Result<(), ConfigStoreError> {
        self.repo
            .save(config, Utc::now())
            .await
            .context("Failed to save config to database")?;
        Ok(())
    }
}

/// Trimmed non-blank lines
fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxAppConfigRepository;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, PathBuf, Arc<dyn AppConfigRepository>) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("data").join("config.json");
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (dir, path, SqlxAppConfigRepository::boxed(pool))
    }

    fn custom(dish_type: &str, network: &str) -> AppConfig {
        AppConfig {
            dish_types: vec![dish_type.to_string()],
            admin_networks: vec![network.to_string()],
        }
    }

    fn write_json(path: &Path, config: &AppConfig) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string(config).unwrap()).unwrap();
    }

    fn read_json(path: &Path) -> AppConfig {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_neither_source_creates_defaults_in_both() {
        let (_dir, path, repo) = setup().await;

        let store = ConfigStore::load(&path, repo.clone()).await.unwrap();

        assert_eq!(store.current(), AppConfig::default());
        assert_eq!(read_json(&path), AppConfig::default());
        let (db_config, _) = repo.load().await.unwrap().unwrap();
        assert_eq!(db_config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_only_file_is_adopted() {
        let (_dir, path, repo) = setup().await;
        let config = custom("Soup", "10.0.0.0/8");
        write_json(&path, &config);

        let store = ConfigStore::load(&path, repo.clone()).await.unwrap();

        assert_eq!(store.current(), config);
        assert_eq!(repo.load().await.unwrap().unwrap().0, config);
    }

    #[tokio::test]
    async fn test_only_database_is_adopted() {
        let (_dir, path, repo) = setup().await;
        let config = custom("Bread", "192.168.0.0/16");
        repo.save(&config, Utc::now()).await.unwrap();

        let store = ConfigStore::load(&path, repo.clone()).await.unwrap();

        assert_eq!(store.current(), config);
        assert_eq!(read_json(&path), config);
    }

    #[tokio::test]
    async fn test_newer_file_wins() {
        let (_dir, path, repo) = setup().await;
        repo.save(&custom("Old", "10.0.0.0/8"), Utc::now() - Duration::days(30))
            .await
            .unwrap();
        let fresh = custom("Fresh", "172.16.0.0/12");
        write_json(&path, &fresh);

        let store = ConfigStore::load(&path, repo.clone()).await.unwrap();

        assert_eq!(store.current(), fresh);
        assert_eq!(repo.load().await.unwrap().unwrap().0, fresh);
    }

    #[tokio::test]
    async fn test_newer_database_wins() {
        let (_dir, path, repo) = setup().await;
        write_json(&path, &custom("Stale", "10.0.0.0/8"));
        let fresh = custom("Fresh", "172.16.0.0/12");
        repo.save(&fresh, Utc::now() + Duration::days(1)).await.unwrap();

        let store = ConfigStore::load(&path, repo.clone()).await.unwrap();

        assert_eq!(store.current(), fresh);
        assert_eq!(read_json(&path), fresh);
    }

    #[tokio::test]
    async fn test_missing_json_fields_use_defaults() {
        let (_dir, path, repo) = setup().await;
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"dish_types": ["Casserole"]}"#).unwrap();

        let store = ConfigStore::load(&path, repo).await.unwrap();

        assert_eq!(store.current().dish_types, vec!["Casserole"]);
        assert_eq!(store.current().admin_networks, vec!["127.0.0.1/32"]);
    }

    #[tokio::test]
    async fn test_save_updates_all_copies() {
        let (_dir, path, repo) = setup().await;
        let store = ConfigStore::load(&path, repo.clone()).await.unwrap();
        let config = custom("Snacks", "::1/128");

        store.save(config.clone()).await.unwrap();

        assert_eq!(store.current(), config);
        assert_eq!(read_json(&path), config);
        assert_eq!(repo.load().await.unwrap().unwrap().0, config);
    }

    #[tokio::test]
    async fn test_update_from_text_splits_lines() {
        let (_dir, path, repo) = setup().await;
        let store = ConfigStore::load(&path, repo).await.unwrap();

        let config = store
            .update_from_text("Main Dish\r\n\n  Salad  \n", "127.0.0.1/32\n\n10.0.0.0/8\n")
            .await
            .unwrap();

        assert_eq!(config.dish_types, vec!["Main Dish", "Salad"]);
        assert_eq!(config.admin_networks, vec!["127.0.0.1/32", "10.0.0.0/8"]);
        assert_eq!(store.current(), config);
    }

    #[tokio::test]
    async fn test_update_from_text_requires_entries() {
        let (_dir, path, repo) = setup().await;
        let store = ConfigStore::load(&path, repo).await.unwrap();

        let err = store.update_from_text(" \n ", "127.0.0.1/32").await.unwrap_err();
        assert_eq!(err.to_string(), "At least one dish type is required");

        let err = store.update_from_text("Dessert", "\n").await.unwrap_err();
        assert_eq!(err.to_string(), "At least one network is required");

        assert_eq!(store.current(), AppConfig::default());
    }

    #[tokio::test]
    async fn test_unparseable_network_is_saved_anyway() {
        let (_dir, path, repo) = setup().await;
        let store = ConfigStore::load(&path, repo).await.unwrap();

        let config = store
            .update_from_text("Dessert", "office-lan")
            .await
            .unwrap();
        assert_eq!(config.admin_networks, vec!["office-lan"]);
    }
}
