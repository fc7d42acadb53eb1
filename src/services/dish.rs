//! Dish service
//!
//! Business rules for dish sign-ups: field validation, dish type and tag
//! checks against the current configuration, and search filtering.

use crate::db::repositories::{DishRepository, TagRepository};
use crate::models::{
    dedup_tag_ids, normalize_notes, parse_allergens, AppConfig, DishEntry, DishInput,
    CONTRIBUTOR_MAX_CHARS, DISH_NAME_MAX_CHARS,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for dish service operations
#[derive(Debug, thiserror::Error)]
pub enum DishServiceError {
    /// Dish not found
    #[error("Dish not found")]
    NotFound(i64),

    /// Rejected submission; the message is shown to the user
    #[error("{0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Dish service
pub struct DishService {
    repo: Arc<dyn DishRepository>,
    tag_repo: Arc<dyn TagRepository>,
}

/// A submission that passed validation
struct ValidDish {
    contributor: String,
    dish_name: String,
    dish_type: String,
    allergens: Vec<String>,
    notes: Option<String>,
    tag_ids: Vec<i64>,
    dietary_flags: Vec<String>,
}

impl DishService {
    pub fn new(repo: Arc<dyn DishRepository>, tag_repo: Arc<dyn TagRepository>) -> Self {
        Self { repo, tag_repo }
    }

    /// All dishes, newest first
    pub async fn list(&self) -> Result<Vec<DishEntry>, DishServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list dishes")
            .map_err(Into::into)
    }

    /// Dishes matching `query`; see [`filter_dishes`]
    pub async fn search(&self, query: &str) -> Result<Vec<DishEntry>, DishServiceError> {
        Ok(filter_dishes(self.list().await?, query))
    }

    pub async fn get(&self, id: i64) -> Result<DishEntry, DishServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get dish")?
            .ok_or(DishServiceError::NotFound(id))
    }

    /// Validate and store a new dish, stamped with the current time
    pub async fn create(
        &self,
        input: DishInput,
        config: &AppConfig,
    ) -> Result<DishEntry, DishServiceError> {
        let valid = self.validate(input, config).await?;

        let entry = DishEntry {
            id: 0,
            contributor: valid.contributor,
            dish_name: valid.dish_name,
            dish_type: valid.dish_type,
            allergens: valid.allergens,
            dietary_flags: valid.dietary_flags,
            tag_ids: valid.tag_ids,
            tags: Vec::new(),
            notes: valid.notes,
            created_at: Utc::now(),
        };

        let created = self
            .repo
            .create(&entry)
            .await
            .context("Failed to create dish")?;
        tracing::info!(dish_id = created.id, dish = %created.dish_name, "Dish added");
        Ok(created)
    }

    /// Validate and overwrite an existing dish. The creation time is kept.
    pub async fn update(
        &self,
        id: i64,
        input: DishInput,
        config: &AppConfig,
    ) -> Result<DishEntry, DishServiceError> {
        let mut dish = self.get(id).await?;
        let valid = self.validate(input, config).await?;

        dish.contributor = valid.contributor;
        dish.dish_name = valid.dish_name;
        dish.dish_type = valid.dish_type;
        dish.allergens = valid.allergens;
        dish.notes = valid.notes;
        dish.tag_ids = valid.tag_ids;
        dish.dietary_flags = valid.dietary_flags;

        if !self
            .repo
            .update(&dish)
            .await
            .context("Failed to update dish")?
        {
            return Err(DishServiceError::NotFound(id));
        }

        tracing::info!(dish_id = id, "Dish updated");
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), DishServiceError> {
        self.get(id).await?;
        self.repo.delete(id).await.context("Failed to delete dish")?;
        tracing::info!(dish_id = id, "Dish deleted");
        Ok(())
    }

    async fn validate(
        &self,
        input: DishInput,
        config: &AppConfig,
    ) -> Result<ValidDish, DishServiceError> {
        let contributor = input.contributor.trim().to_string();
        check_length("Contributor", &contributor, CONTRIBUTOR_MAX_CHARS)?;

        let dish_name = input.dish_name.trim().to_string();
        check_length("Dish name", &dish_name, DISH_NAME_MAX_CHARS)?;

        if !config.allows_dish_type(&input.dish_type) {
            return Err(DishServiceError::ValidationError(
                "Unknown dish type".to_string(),
            ));
        }

        let tag_ids = dedup_tag_ids(&input.tag_ids);
        let tags = self
            .tag_repo
            .get_by_ids(&tag_ids)
            .await
            .context("Failed to look up tags")?;
        if tags.len() != tag_ids.len() {
            return Err(DishServiceError::ValidationError(
                "Unknown dietary tag selected".to_string(),
            ));
        }

        Ok(ValidDish {
            contributor,
            dish_name,
            dish_type: input.dish_type,
            allergens: parse_allergens(input.allergens.as_deref()),
            notes: normalize_notes(input.notes.as_deref()),
            tag_ids: tags.iter().map(|tag| tag.id).collect(),
            dietary_flags: tags.into_iter().map(|tag| tag.name).collect(),
        })
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), DishServiceError> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(DishServiceError::ValidationError(format!(
            "{} must be between 1 and {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Keep the dishes whose name, contributor, type, notes, allergens or
/// dietary flags contain `query` (trimmed, case-insensitive). A blank query
/// keeps everything.
pub fn filter_dishes(dishes: Vec<DishEntry>, query: &str) -> Vec<DishEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return dishes;
    }
    dishes.into_iter().filter(|dish| dish.matches(&needle)).collect()
}
