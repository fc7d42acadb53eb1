//! Tag service
//!
//! Implements business logic for the dietary tag catalog:
//! - Creating tags with name and category validation
//! - Grouping tags by category for the forms and admin panel

use crate::db::repositories::TagRepository;
use crate::models::{Tag, TagCategory, TagGroup};
use anyhow::Context;
use std::sync::Arc;

/// Longest accepted tag name, in characters
pub const TAG_NAME_MAX_CHARS: usize = 120;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Rejected input; the message is shown to the admin as-is
    #[error("{0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service for managing the dietary tag catalog
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    /// Create a new tag service
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// Create a tag at the end of `category`.
    ///
    /// # Errors
    /// - `ValidationError` if the trimmed name is empty or too long, the
    ///   category is not one of [`TagCategory`], or a tag with the same name
    ///   (ignoring case) exists
    pub async fn create(&self, name: &str, category: &str) -> Result<Tag, TagServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > TAG_NAME_MAX_CHARS {
            return Err(TagServiceError::ValidationError(format!(
                "Tag name must be at most {} characters",
                TAG_NAME_MAX_CHARS
            )));
        }

        let category = TagCategory::parse(category)
            .ok_or_else(|| TagServiceError::ValidationError("Unknown category".to_string()))?;

        if self
            .repo
            .get_by_name(name)
            .await
            .context("Failed to check existing tag")?
            .is_some()
        {
            return Err(TagServiceError::ValidationError(
                "That tag already exists".to_string(),
            ));
        }

        let tag = self
            .repo
            .create(name, category.as_str())
            .await
            .context("Failed to create tag")?;

        tracing::info!(tag_id = tag.id, name = %tag.name, category = %tag.category, "Tag created");
        Ok(tag)
    }

    /// Delete a tag. Missing ids are ignored.
    pub async fn delete(&self, id: i64) -> Result<(), TagServiceError> {
        let removed = self.repo.delete(id).await.context("Failed to delete tag")?;
        if removed {
            tracing::info!(tag_id = id, "Tag deleted");
        }
        Ok(())
    }

    /// All tags grouped by category, in display order
    pub async fn list_groups(&self) -> Result<Vec<TagGroup>, TagServiceError> {
        let tags = self.repo.list().await.context("Failed to list tags")?;
        Ok(group_tags(tags))
    }

    /// The category names an admin may choose from
    pub fn categories(&self) -> Vec<&'static str> {
        TagCategory::names()
    }
}

/// Group tags by category.
///
/// The fixed categories come first in catalog order (empty ones omitted),
/// followed by any unknown categories sorted by name. Tags inside a group
/// are ordered by position, then lowercase name.
pub fn group_tags(mut tags: Vec<Tag>) -> Vec<TagGroup> {
    tags.sort_by_cached_key(|tag| {
        let (category_index, position, name) = tag.sort_key();
        (category_index, tag.category.clone(), position, name)
    });

    let mut groups: Vec<TagGroup> = Vec::new();
    for tag in tags {
        match groups.last_mut() {
            Some(group) if group.category == tag.category => group.tags.push(tag),
            _ => groups.push(TagGroup {
                category: tag.category.clone(),
                tags: vec![tag],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxTagRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> TagService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        TagService::new(SqlxTagRepository::boxed(pool))
    }

    fn tag(id: i64, name: &str, category: &str, position: i64) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            category: category.to_string(),
            position,
        }
    }

    fn validation_message(err: TagServiceError) -> String {
        match err {
            TagServiceError::ValidationError(message) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_trims_name() {
        let service = setup_test_service().await;

        let tag = service.create("  Halal ", "Dietary patterns").await.unwrap();
        assert_eq!(tag.name, "Halal");
        assert_eq!(tag.category, "Dietary patterns");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let service = setup_test_service().await;
        let err = service.create("   ", "Dietary patterns").await.unwrap_err();
        assert_eq!(validation_message(err), "Tag name cannot be empty");
    }

    #[tokio::test]
    async fn test_create_rejects_long_name() {
        let service = setup_test_service().await;
        let err = service
            .create(&"x".repeat(TAG_NAME_MAX_CHARS + 1), "Dietary patterns")
            .await
            .unwrap_err();
        assert!(validation_message(err).contains("at most 120"));

        assert!(service
            .create(&"y".repeat(TAG_NAME_MAX_CHARS), "Dietary patterns")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category() {
        let service = setup_test_service().await;
        let err = service.create("Vegan", "Desserts").await.unwrap_err();
        assert_eq!(validation_message(err), "Unknown category");
    }

    #[tokio::test]
    async fn test_create_rejects_case_insensitive_duplicate() {
        let service = setup_test_service().await;
        service.create("Vegan", "Dietary patterns").await.unwrap();

        let err = service.create("vEGAN", "Ingredient avoidances").await.unwrap_err();
        assert_eq!(validation_message(err), "That tag already exists");
    }

    #[tokio::test]
    async fn test_delete_missing_tag_is_ok() {
        let service = setup_test_service().await;
        service.delete(12345).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_groups_follows_catalog_order() {
        let service = setup_test_service().await;
        service.create("Keep chilled", "Serving logistics").await.unwrap();
        service.create("Vegan", "Dietary patterns").await.unwrap();
        service.create("Keto", "Dietary patterns").await.unwrap();

        let groups = service.list_groups().await.unwrap();
        let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(categories, vec!["Dietary patterns", "Serving logistics"]);
        assert_eq!(groups[0].tags.len(), 2);
        assert_eq!(groups[0].tags[0].name, "Vegan");
    }

    #[test]
    fn test_group_tags_places_unknown_categories_last_alphabetically() {
        let groups = group_tags(vec![
            tag(1, "Old B", "Zeta legacy", 0),
            tag(2, "Mild heat", "Spice and suitability", 0),
            tag(3, "Old A", "Alpha legacy", 0),
            tag(4, "Vegan", "Dietary patterns", 0),
            tag(5, "Older A", "Alpha legacy", 1),
        ]);

        let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(
            categories,
            vec![
                "Dietary patterns",
                "Spice and suitability",
                "Alpha legacy",
                "Zeta legacy"
            ]
        );
        let alpha: Vec<&str> = groups[2].tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(alpha, vec!["Old A", "Older A"]);
    }

    #[test]
    fn test_group_tags_empty() {
        assert!(group_tags(Vec::new()).is_empty());
    }
}
