//! First-run seeding and legacy data repair
//!
//! Runs after [`super::migrations::run_migrations`] on every startup. Each
//! step only touches data that is missing or known to be wrong, so running it
//! repeatedly is harmless:
//! - empty `config_entries` is filled from the legacy `app_config` row or defaults
//! - empty `tags` is filled with the default catalog
//! - dishes without tag links get them from their stored `dietary_flags`
//! - known mis-filed tags are moved to their proper category

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;

use super::repositories::app_config::{
    insert_entries, CATEGORY_ADMIN_NETWORK, CATEGORY_DISH_TYPE,
};
use super::repositories::dish::replace_dish_tags;
use super::DynDatabasePool;
use crate::models::{AppConfig, TagCategory, CATEGORY_CORRECTIONS};

/// Run every seeding step in one transaction
pub async fn seed_database(pool: &DynDatabasePool) -> Result<()> {
    let mut tx = pool.sqlite().begin().await?;

    seed_config_entries(&mut tx).await?;
    seed_default_tags(&mut tx).await?;
    backfill_dish_tags(&mut tx).await?;
    normalize_tag_categories(&mut tx).await?;

    tx.commit().await.context("Failed to commit seed data")?;
    Ok(())
}

async fn count_rows(conn: &mut SqliteConnection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) AS count FROM {}", table);
    let row = sqlx::query(&sql)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("Failed to count {}", table))?;
    Ok(row.get("count"))
}

async fn seed_config_entries(conn: &mut SqliteConnection) -> Result<()> {
    if count_rows(conn, "config_entries").await? > 0 {
        return Ok(());
    }

    let config = match load_legacy_app_config(conn).await? {
        Some(config) => {
            tracing::info!("Migrating app config from legacy app_config table");
            config
        }
        None => {
            tracing::info!("Seeding default app config entries");
            AppConfig::default()
        }
    };

    let now = Utc::now();
    insert_entries(conn, CATEGORY_DISH_TYPE, &config.dish_types, now).await?;
    insert_entries(conn, CATEGORY_ADMIN_NETWORK, &config.admin_networks, now).await?;
    Ok(())
}

/// Read the single-row JSON config table used by older versions
async fn load_legacy_app_config(conn: &mut SqliteConnection) -> Result<Option<AppConfig>> {
    let exists = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'app_config'")
        .fetch_optional(&mut *conn)
        .await?
        .is_some();
    if !exists {
        return Ok(None);
    }

    let row = sqlx::query("SELECT dish_types, admin_networks FROM app_config WHERE id = 1")
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to read legacy app_config")?;
    let Some(row) = row else {
        return Ok(None);
    };

    let dish_types: Option<String> = row.get("dish_types");
    let admin_networks: Option<String> = row.get("admin_networks");
    let dish_types: Vec<String> = serde_json::from_str(dish_types.as_deref().unwrap_or("[]"))
        .context("Legacy dish_types is not a JSON list")?;
    let admin_networks: Vec<String> =
        serde_json::from_str(admin_networks.as_deref().unwrap_or("[]"))
            .context("Legacy admin_networks is not a JSON list")?;

    Ok(Some(AppConfig {
        dish_types,
        admin_networks,
    }))
}

async fn seed_default_tags(conn: &mut SqliteConnection) -> Result<()> {
    if count_rows(conn, "tags").await? > 0 {
        return Ok(());
    }

    tracing::info!("Seeding default tag catalog");
    for category in TagCategory::ALL {
        for (position, name) in category.default_tags().iter().enumerate() {
            sqlx::query("INSERT INTO tags (name, category, position) VALUES (?, ?, ?)")
                .bind(*name)
                .bind(category.as_str())
                .bind(position as i64)
                .execute(&mut *conn)
                .await
                .with_context(|| format!("Failed to seed tag {}", name))?;
        }
    }
    Ok(())
}

/// Link dishes that have no `dish_tags` rows to tags named in their
/// stored `dietary_flags` (trimmed, case-insensitive)
async fn backfill_dish_tags(conn: &mut SqliteConnection) -> Result<()> {
    let dishes = sqlx::query(
        r#"
        SELECT d.id, d.dietary_flags
        FROM dishes AS d
        WHERE NOT EXISTS (SELECT 1 FROM dish_tags AS dt WHERE dt.dish_id = d.id)
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .context("Failed to find untagged dishes")?;
    if dishes.is_empty() {
        return Ok(());
    }

    let lookup: HashMap<String, i64> = sqlx::query("SELECT id, name FROM tags")
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(|row| (row.get::<String, _>("name").trim().to_lowercase(), row.get("id")))
        .collect();

    let mut backfilled = 0;
    for dish in &dishes {
        let dish_id: i64 = dish.get("id");
        let raw: Option<String> = dish.get("dietary_flags");
        let Ok(flags) = serde_json::from_str::<Vec<String>>(raw.as_deref().unwrap_or("")) else {
            tracing::debug!(dish_id, "Skipping dish with unreadable dietary_flags");
            continue;
        };

        let tag_ids: Vec<i64> = flags
            .iter()
            .filter_map(|flag| lookup.get(&flag.trim().to_lowercase()).copied())
            .collect();
        if !tag_ids.is_empty() {
            replace_dish_tags(conn, dish_id, &tag_ids).await?;
            backfilled += 1;
        }
    }

    if backfilled > 0 {
        tracing::info!("Linked tags for {} legacy dish(es)", backfilled);
    }
    Ok(())
}

async fn normalize_tag_categories(conn: &mut SqliteConnection) -> Result<()> {
    for (name, desired) in CATEGORY_CORRECTIONS {
        let row = sqlx::query("SELECT id, category FROM tags WHERE name = ?")
            .bind(*name)
            .fetch_optional(&mut *conn)
            .await?;
        let Some(row) = row else {
            continue;
        };
        let current: String = row.get("category");
        if current == desired.as_str() {
            continue;
        }

        let max_row = sqlx::query(
            "SELECT COALESCE(MAX(position), -1) AS max_position FROM tags WHERE category = ?",
        )
        .bind(desired.as_str())
        .fetch_one(&mut *conn)
        .await?;
        let position: i64 = max_row.get::<i64, _>("max_position") + 1;

        sqlx::query("UPDATE tags SET category = ?, position = ? WHERE id = ?")
            .bind(desired.as_str())
            .bind(position)
            .bind(row.get::<i64, _>("id"))
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to move tag {}", name))?;
        tracing::info!("Moved tag '{}' from '{}' to '{}'", name, current, desired);
    }
    Ok(())
}
