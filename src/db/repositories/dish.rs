//! Dish repository
//!
//! Database operations for dish entries and their tag associations.
//!
//! This module provides:
//! - `DishRepository` trait defining the interface for dish data access
//! - `SqlxDishRepository` implementing the trait for SQLite
//!
//! Writes replace a dish's `dish_tags` rows wholesale inside the same
//! transaction as the dish row itself.

use crate::db::DynDatabasePool;
use crate::models::{dedup_tag_ids, parse_timestamp, DishEntry, Tag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use super::tag::row_to_tag;

/// Dish repository trait
#[async_trait]
pub trait DishRepository: Send + Sync {
    /// Insert a dish and its tag associations
    async fn create(&self, dish: &DishEntry) -> Result<DishEntry>;

    /// Get dish by ID, with tags loaded
    async fn get_by_id(&self, id: i64) -> Result<Option<DishEntry>>;

    /// List all dishes, newest first
    async fn list(&self) -> Result<Vec<DishEntry>>;

    /// Overwrite a dish's fields and tag associations. `created_at` is kept.
    /// Returns false when the dish doesn't exist.
    async fn update(&self, dish: &DishEntry) -> Result<bool>;

    /// Delete a dish and its tag associations
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based dish repository implementation
pub struct SqlxDishRepository {
    pool: DynDatabasePool,
}

impl SqlxDishRepository {
    /// Create a new SQLx dish repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn DishRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DishRepository for SqlxDishRepository {
    async fn create(&self, dish: &DishEntry) -> Result<DishEntry> {
        create_dish_sqlite(self.pool.sqlite(), dish).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<DishEntry>> {
        get_dish_by_id_sqlite(self.pool.sqlite(), id).await
    }

    async fn list(&self) -> Result<Vec<DishEntry>> {
        list_dishes_sqlite(self.pool.sqlite()).await
    }

    async fn update(&self, dish: &DishEntry) -> Result<bool> {
        update_dish_sqlite(self.pool.sqlite(), dish).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_dish_sqlite(self.pool.sqlite(), id).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

const DISH_COLUMNS: &str =
    "id, contributor, dish_name, dish_type, allergens, dietary_flags, notes, created_at";

async fn create_dish_sqlite(pool: &SqlitePool, dish: &DishEntry) -> Result<DishEntry> {
    let created_at = dish.created_at.to_rfc3339_opts(SecondsFormat::Micros, true);
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO dishes (
            contributor, dish_name, dish_type, allergens, dietary_flags, notes, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&dish.contributor)
    .bind(&dish.dish_name)
    .bind(&dish.dish_type)
    .bind(serde_json::to_string(&dish.allergens)?)
    .bind(serde_json::to_string(&dish.dietary_flags)?)
    .bind(&dish.notes)
    .bind(&created_at)
    .execute(&mut *tx)
    .await
    .context("Failed to create dish")?;

    let id = result.last_insert_rowid();
    replace_dish_tags(&mut tx, id, &dish.tag_ids).await?;
    tx.commit().await.context("Failed to commit dish")?;

    get_dish_by_id_sqlite(pool, id)
        .await?
        .context("Dish disappeared after insert")
}

async fn get_dish_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<DishEntry>> {
    let sql = format!("SELECT {} FROM dishes WHERE id = ?", DISH_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get dish by ID")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut tag_map = load_tags_for_dishes(pool, Some(id)).await?;
    Ok(Some(row_to_dish(&row, tag_map.remove(&id).unwrap_or_default())))
}

async fn list_dishes_sqlite(pool: &SqlitePool) -> Result<Vec<DishEntry>> {
    let sql = format!(
        "SELECT {} FROM dishes ORDER BY datetime(created_at) DESC, id DESC",
        DISH_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list dishes")?;

    let mut tag_map = load_tags_for_dishes(pool, None).await?;
    let dishes = rows
        .iter()
        .map(|row| {
            let id: i64 = row.get("id");
            row_to_dish(row, tag_map.remove(&id).unwrap_or_default())
        })
        .collect();

    Ok(dishes)
}

async fn update_dish_sqlite(pool: &SqlitePool, dish: &DishEntry) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE dishes
        SET contributor = ?,
            dish_name = ?,
            dish_type = ?,
            allergens = ?,
            dietary_flags = ?,
            notes = ?
        WHERE id = ?
        "#,
    )
    .bind(&dish.contributor)
    .bind(&dish.dish_name)
    .bind(&dish.dish_type)
    .bind(serde_json::to_string(&dish.allergens)?)
    .bind(serde_json::to_string(&dish.dietary_flags)?)
    .bind(&dish.notes)
    .bind(dish.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update dish")?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    replace_dish_tags(&mut tx, dish.id, &dish.tag_ids).await?;
    tx.commit().await.context("Failed to commit dish update")?;
    Ok(true)
}

async fn delete_dish_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM dish_tags WHERE dish_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete dish tags")?;

    let result = sqlx::query("DELETE FROM dishes WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete dish")?;

    tx.commit().await.context("Failed to commit dish delete")?;
    Ok(result.rows_affected() > 0)
}

/// Replace all tag associations of a dish with `tag_ids` (first occurrence wins)
pub(crate) async fn replace_dish_tags(
    conn: &mut SqliteConnection,
    dish_id: i64,
    tag_ids: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM dish_tags WHERE dish_id = ?")
        .bind(dish_id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear dish tags")?;

    for tag_id in dedup_tag_ids(tag_ids) {
        sqlx::query("INSERT INTO dish_tags (dish_id, tag_id) VALUES (?, ?)")
            .bind(dish_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to link tag {} to dish {}", tag_id, dish_id))?;
    }

    Ok(())
}

/// Load tags for one dish, or for every dish when `dish_id` is `None`
async fn load_tags_for_dishes(
    pool: &SqlitePool,
    dish_id: Option<i64>,
) -> Result<HashMap<i64, Vec<Tag>>> {
    let base = r#"
        SELECT dt.dish_id, t.id, t.name, t.category, t.position
        FROM dish_tags AS dt
        JOIN tags AS t ON t.id = dt.tag_id
    "#;

    let rows = match dish_id {
        Some(id) => {
            let sql = format!("{} WHERE dt.dish_id = ?", base);
            sqlx::query(&sql).bind(id).fetch_all(pool).await
        }
        None => sqlx::query(base).fetch_all(pool).await,
    }
    .context("Failed to load dish tags")?;

    let mut mapping: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in &rows {
        mapping
            .entry(row.get("dish_id"))
            .or_default()
            .push(row_to_tag(row));
    }
    for tags in mapping.values_mut() {
        tags.sort_by_key(|tag| tag.sort_key());
    }

    Ok(mapping)
}

fn row_to_dish(row: &sqlx::sqlite::SqliteRow, tags: Vec<Tag>) -> DishEntry {
    let id: i64 = row.get("id");
    let allergens: Vec<String> =
        serde_json::from_str(row.get::<&str, _>("allergens")).unwrap_or_default();

    let dietary_flags = if tags.is_empty() {
        serde_json::from_str(row.get::<&str, _>("dietary_flags")).unwrap_or_default()
    } else {
        tags.iter().map(|tag| tag.name.clone()).collect()
    };

    let raw_created_at: String = row.get("created_at");
    let created_at = parse_timestamp(&raw_created_at).unwrap_or_else(|| {
        tracing::warn!(dish_id = id, created_at = %raw_created_at, "Unparseable dish timestamp");
        Utc::now()
    });

    DishEntry {
        id,
        contributor: row.get("contributor"),
        dish_name: row.get("dish_name"),
        dish_type: row.get("dish_type"),
        allergens,
        dietary_flags,
        tag_ids: tags.iter().map(|tag| tag.id).collect(),
        tags,
        notes: row.get("notes"),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxTagRepository, TagRepository};
    use crate::db::{create_test_pool, migrations};
    use chrono::{Duration, TimeZone};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxDishRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxDishRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_dish(name: &str, tags: &[&Tag]) -> DishEntry {
        DishEntry {
            id: 0,
            contributor: "Marta".to_string(),
            dish_name: name.to_string(),
            dish_type: "Main Dish".to_string(),
            allergens: vec!["walnuts".to_string()],
            dietary_flags: tags.iter().map(|t| t.name.clone()).collect(),
            tag_ids: tags.iter().map(|t| t.id).collect(),
            tags: vec![],
            notes: Some("Needs an outlet".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 11, 28, 17, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let (pool, repo) = setup_test_repo().await;
        let tags = SqlxTagRepository::new(pool.clone());
        let vegan = tags.create("Vegan", "Dietary patterns").await.unwrap();
        let gf = tags.create("Gluten-Free", "Ingredient avoidances").await.unwrap();

        let created = repo
            .create(&create_test_dish("Lentil Stew", &[&gf, &vegan]))
            .await
            .unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert!(created.id > 0);
        assert_eq!(fetched, created);
        assert_eq!(fetched.contributor, "Marta");
        assert_eq!(fetched.allergens, vec!["walnuts"]);
        assert_eq!(fetched.notes.as_deref(), Some("Needs an outlet"));
        assert_eq!(fetched.tag_ids, vec![vegan.id, gf.id]);
        assert_eq!(fetched.dietary_flags, vec!["Vegan", "Gluten-Free"]);
        assert_eq!(
            fetched.created_at,
            Utc.with_ymd_and_hms(2024, 11, 28, 17, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_deduplicates_tag_ids() {
        let (pool, repo) = setup_test_repo().await;
        let tags = SqlxTagRepository::new(pool.clone());
        let vegan = tags.create("Vegan", "Dietary patterns").await.unwrap();

        let mut dish = create_test_dish("Salad", &[&vegan]);
        dish.tag_ids = vec![vegan.id, vegan.id];
        let created = repo.create(&dish).await.unwrap();

        assert_eq!(created.tag_ids, vec![vegan.id]);
    }

    #[tokio::test]
    async fn test_get_missing_dish() {
        let (_pool, repo) = setup_test_repo().await;
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_id_tiebreak() {
        let (_pool, repo) = setup_test_repo().await;

        let mut old = create_test_dish("Old", &[]);
        old.created_at = old.created_at - Duration::days(1);
        repo.create(&old).await.unwrap();
        let first_tie = repo.create(&create_test_dish("Tie A", &[])).await.unwrap();
        let second_tie = repo.create(&create_test_dish("Tie B", &[])).await.unwrap();

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.dish_name)
            .collect();
        assert!(second_tie.id > first_tie.id);
        assert_eq!(names, vec!["Tie B", "Tie A", "Old"]);
    }

    #[tokio::test]
    async fn test_list_orders_by_created_at_before_id() {
        let (_pool, repo) = setup_test_repo().await;

        let newer = repo.create(&create_test_dish("New", &[])).await.unwrap();
        let mut old = create_test_dish("Old", &[]);
        old.created_at = old.created_at - Duration::days(3);
        let older = repo.create(&old).await.unwrap();
        assert!(older.id > newer.id);

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.dish_name)
            .collect();
        assert_eq!(names, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_update_replaces_tags_and_keeps_created_at() {
        let (pool, repo) = setup_test_repo().await;
        let tags = SqlxTagRepository::new(pool.clone());
        let vegan = tags.create("Vegan", "Dietary patterns").await.unwrap();
        let spicy = tags.create("Spicy heat", "Spice and suitability").await.unwrap();

        let mut dish = repo.create(&create_test_dish("Curry", &[&vegan])).await.unwrap();
        let original_created_at = dish.created_at;

        dish.dish_name = "Green Curry".to_string();
        dish.tag_ids = vec![spicy.id];
        dish.dietary_flags = vec![spicy.name.clone()];
        dish.created_at = Utc::now();
        assert!(repo.update(&dish).await.unwrap());

        let fetched = repo.get_by_id(dish.id).await.unwrap().unwrap();
        assert_eq!(fetched.dish_name, "Green Curry");
        assert_eq!(fetched.tag_ids, vec![spicy.id]);
        assert_eq!(fetched.dietary_flags, vec!["Spicy heat"]);
        assert_eq!(fetched.created_at, original_created_at);
    }

    #[tokio::test]
    async fn test_update_missing_dish_returns_false() {
        let (_pool, repo) = setup_test_repo().await;
        let mut dish = create_test_dish("Ghost", &[]);
        dish.id = 77;
        assert!(!repo.update(&dish).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_dish_and_links() {
        let (pool, repo) = setup_test_repo().await;
        let tags = SqlxTagRepository::new(pool.clone());
        let vegan = tags.create("Vegan", "Dietary patterns").await.unwrap();
        let dish = repo.create(&create_test_dish("Hummus", &[&vegan])).await.unwrap();

        assert!(repo.delete(dish.id).await.unwrap());
        assert!(repo.get_by_id(dish.id).await.unwrap().is_none());
        assert!(!repo.delete(dish.id).await.unwrap());

        let row = sqlx::query("SELECT COUNT(*) AS count FROM dish_tags")
            .fetch_one(pool.sqlite())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("count"), 0);
    }

    #[tokio::test]
    async fn test_deleting_tag_removes_it_from_dishes() {
        let (pool, repo) = setup_test_repo().await;
        let tags = SqlxTagRepository::new(pool.clone());
        let vegan = tags.create("Vegan", "Dietary patterns").await.unwrap();
        let keto = tags.create("Keto", "Dietary patterns").await.unwrap();
        let dish = repo
            .create(&create_test_dish("Frittata", &[&vegan, &keto]))
            .await
            .unwrap();

        tags.delete(vegan.id).await.unwrap();

        let fetched = repo.get_by_id(dish.id).await.unwrap().unwrap();
        assert_eq!(fetched.tag_ids, vec![keto.id]);
        assert_eq!(fetched.dietary_flags, vec!["Keto"]);
    }

    #[tokio::test]
    async fn test_legacy_row_falls_back_to_stored_flags() {
        let (pool, repo) = setup_test_repo().await;
        sqlx::query(
            r#"INSERT INTO dishes (contributor, dish_name, dish_type, allergens, dietary_flags, notes, created_at)
               VALUES ('Lee', 'Kimchi', 'Side Dish', '["fish sauce"]', '["Spicy", "Fermented"]', NULL, '2023-06-01T12:00:00')"#,
        )
        .execute(pool.sqlite())
        .await
        .unwrap();

        let dishes = repo.list().await.unwrap();
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].dietary_flags, vec!["Spicy", "Fermented"]);
        assert!(dishes[0].tag_ids.is_empty());
        assert_eq!(
            dishes[0].created_at,
            Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap()
        );
    }
}
