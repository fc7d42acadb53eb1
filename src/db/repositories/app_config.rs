//! App config repository
//!
//! Stores the admin-editable [`AppConfig`] as ordered rows of the
//! `config_entries` table, one row per dish type or admin network.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

use crate::db::DynDatabasePool;
use crate::models::{parse_timestamp, AppConfig};

/// `config_entries.category` value for dish types
pub const CATEGORY_DISH_TYPE: &str = "dish_type";
/// `config_entries.category` value for admin networks
pub const CATEGORY_ADMIN_NETWORK: &str = "admin_network";

/// Repository trait for the stored app config
#[async_trait]
pub trait AppConfigRepository: Send + Sync {
    /// Load the stored config with the newest `updated_at` among its rows.
    /// Returns `None` when no entries exist.
    async fn load(&self) -> Result<Option<(AppConfig, DateTime<Utc>)>>;

    /// Replace all stored entries, stamping them with `updated_at`
    async fn save(&self, config: &AppConfig, updated_at: DateTime<Utc>) -> Result<()>;
}

/// SQLx-based app config repository
pub struct SqlxAppConfigRepository {
    pool: DynDatabasePool,
}

impl SqlxAppConfigRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AppConfigRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AppConfigRepository for SqlxAppConfigRepository {
    async fn load(&self) -> Result<Option<(AppConfig, DateTime<Utc>)>> {
        load_sqlite(self.pool.sqlite()).await
    }

    async fn save(&self, config: &AppConfig, updated_at: DateTime<Utc>) -> Result<()> {
        save_sqlite(self.pool.sqlite(), config, updated_at).await
    }
}

async fn load_sqlite(pool: &SqlitePool) -> Result<Option<(AppConfig, DateTime<Utc>)>> {
    let rows = sqlx::query(
        r#"
        SELECT category, value, updated_at
        FROM config_entries
        WHERE category IN (?, ?)
        ORDER BY position ASC, id ASC
        "#,
    )
    .bind(CATEGORY_DISH_TYPE)
    .bind(CATEGORY_ADMIN_NETWORK)
    .fetch_all(pool)
    .await
    .context("Failed to load config entries")?;

    if rows.is_empty() {
        return Ok(None);
    }

    let mut config = AppConfig {
        dish_types: Vec::new(),
        admin_networks: Vec::new(),
    };
    let mut latest = DateTime::<Utc>::default();

    for row in &rows {
        let category: String = row.get("category");
        let value: String = row.get("value");
        match category.as_str() {
            CATEGORY_DISH_TYPE => config.dish_types.push(value),
            _ => config.admin_networks.push(value),
        }

        let raw: String = row.get("updated_at");
        if let Some(updated_at) = parse_timestamp(&raw) {
            latest = latest.max(updated_at);
        }
    }

    Ok(Some((config, latest)))
}

async fn save_sqlite(
    pool: &SqlitePool,
    config: &AppConfig,
    updated_at: DateTime<Utc>,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM config_entries WHERE category IN (?, ?)")
        .bind(CATEGORY_DISH_TYPE)
        .bind(CATEGORY_ADMIN_NETWORK)
        .execute(&mut *tx)
        .await
        .context("Failed to clear config entries")?;

    insert_entries(&mut tx, CATEGORY_DISH_TYPE, &config.dish_types, updated_at).await?;
    insert_entries(&mut tx, CATEGORY_ADMIN_NETWORK, &config.admin_networks, updated_at).await?;

    tx.commit().await.context("Failed to commit config entries")?;
    Ok(())
}

/// Append `values` under `category`, positions 0..n
pub(crate) async fn insert_entries(
    conn: &mut SqliteConnection,
    category: &str,
    values: &[String],
    updated_at: DateTime<Utc>,
) -> Result<()> {
    let stamp = updated_at.to_rfc3339_opts(SecondsFormat::Micros, true);
    for (position, value) in values.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO config_entries (category, value, position, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(category)
        .bind(value)
        .bind(position as i64)
        .bind(&stamp)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to insert {} entry", category))?;
    }
    Ok(())
}
