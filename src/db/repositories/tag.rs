//! Tag repository
//!
//! Database operations for the dietary tag catalog.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite

use crate::db::DynDatabasePool;
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Insert a tag at the end of its category
    async fn create(&self, name: &str, category: &str) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by name, ignoring case
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// List all tags in catalog order
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Fetch the tags among `ids` that exist, in catalog order
    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>>;

    /// Delete a tag and its dish associations. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, name: &str, category: &str) -> Result<Tag> {
        create_tag_sqlite(self.pool.sqlite(), name, category).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        get_tag_by_id_sqlite(self.pool.sqlite(), id).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        get_tag_by_name_sqlite(self.pool.sqlite(), name).await
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        list_tags_sqlite(self.pool.sqlite()).await
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>> {
        get_tags_by_ids_sqlite(self.pool.sqlite(), ids).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_tag_sqlite(self.pool.sqlite(), id).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, name: &str, category: &str) -> Result<Tag> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"
        SELECT COALESCE(MAX(position), -1) AS max_position
        FROM tags
        WHERE category = ?
        "#,
    )
    .bind(category)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to read tag positions")?;
    let position: i64 = row.get::<i64, _>("max_position") + 1;

    let result = sqlx::query(
        r#"
        INSERT INTO tags (name, category, position)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(category)
    .bind(position)
    .execute(&mut *tx)
    .await
    .context("Failed to create tag")?;

    tx.commit().await.context("Failed to commit tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        category: category.to_string(),
        position,
    })
}

async fn get_tag_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, category, position FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    Ok(row.as_ref().map(row_to_tag))
}

async fn get_tag_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, category, position
        FROM tags
        WHERE LOWER(name) = LOWER(?)
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by name")?;

    Ok(row.as_ref().map(row_to_tag))
}

async fn list_tags_sqlite(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name, category, position FROM tags")
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    let mut tags: Vec<Tag> = rows.iter().map(row_to_tag).collect();
    tags.sort_by_key(|tag| tag.sort_key());
    Ok(tags)
}

async fn get_tags_by_ids_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Tag>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id, name, category, position FROM tags WHERE id IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get tags by IDs")?;

    let mut tags: Vec<Tag> = rows.iter().map(row_to_tag).collect();
    tags.sort_by_key(|tag| tag.sort_key());
    Ok(tags)
}

async fn delete_tag_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tag")?;

    Ok(result.rows_affected() > 0)
}

pub(crate) fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        position: row.get("position"),
    }
}
