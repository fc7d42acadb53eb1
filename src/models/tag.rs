//! Tag model
//!
//! This module provides:
//! - `Tag` entity for a dietary tag in the catalog
//! - `TagCategory` enum of the fixed catalog categories
//! - `TagGroup` for rendering tags grouped by category
//! - The default tag catalog seeded on first run

use serde::{Deserialize, Serialize};

/// Dietary tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Display name, unique ignoring case
    pub name: String,
    /// Stored category name. Usually one of [`TagCategory`], but legacy rows
    /// may carry anything.
    pub category: String,
    /// Ordering within the category
    pub position: i64,
}

impl Tag {
    /// Sort key: known categories in catalog order, then position, then name
    pub fn sort_key(&self) -> (usize, i64, String) {
        (
            TagCategory::sort_index(&self.category),
            self.position,
            self.name.to_lowercase(),
        )
    }
}

/// The fixed tag categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagCategory {
    DietaryPatterns,
    IngredientAvoidances,
    PreparationAndCrossContact,
    AdditivesAndContent,
    SpiceAndSuitability,
    ServingLogistics,
}

impl TagCategory {
    /// All categories in display order
    pub const ALL: [TagCategory; 6] = [
        TagCategory::DietaryPatterns,
        TagCategory::IngredientAvoidances,
        TagCategory::PreparationAndCrossContact,
        TagCategory::AdditivesAndContent,
        TagCategory::SpiceAndSuitability,
        TagCategory::ServingLogistics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::DietaryPatterns => "Dietary patterns",
            TagCategory::IngredientAvoidances => "Ingredient avoidances",
            TagCategory::PreparationAndCrossContact => "Preparation and cross-contact",
            TagCategory::AdditivesAndContent => "Additives and content",
            TagCategory::SpiceAndSuitability => "Spice and suitability",
            TagCategory::ServingLogistics => "Serving logistics",
        }
    }

    /// Parse an exact category name (surrounding whitespace ignored)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Position of a category name in display order. Unknown names sort last.
    pub fn sort_index(name: &str) -> usize {
        Self::ALL
            .iter()
            .position(|c| c.as_str() == name)
            .unwrap_or(Self::ALL.len())
    }

    /// Category names in display order, for form select boxes
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }

    /// Tags seeded into this category on a fresh database
    pub fn default_tags(&self) -> &'static [&'static str] {
        match self {
            TagCategory::DietaryPatterns => &[
                "Vegan",
                "Vegetarian",
                "Vegetarian but not vegan (contains eggs/honey)",
                "Pescatarian",
                "Kosher",
                "Halal",
                "Keto",
                "Paleo",
                "Whole30",
                "Low-FODMAP",
                "Low-carb",
                "Low-sodium",
                "Low-sugar/Diabetic-friendly",
            ],
            TagCategory::IngredientAvoidances => &[
                "Gluten-Free",
                "Dairy-Free",
                "Lactose-free (distinct from dairy-free)",
                "Peanut-free",
                "Tree-nut-free",
                "Egg-free",
                "Soy-free",
                "Sesame-free",
                "Shellfish-free",
                "Fish-free",
                "Corn-free",
                "Nightshade-free",
                "Onion-free",
                "Garlic-free",
            ],
            TagCategory::PreparationAndCrossContact => &[
                "Prepared in GF kitchen",
                "Shared fryer/oil",
                "Separate utensils used",
                "May contain trace allergens",
                "Contains pork/beef",
                "Gelatin present",
            ],
            TagCategory::AdditivesAndContent => &[
                "Contains alcohol",
                "Caffeine present (e.g., tiramisu/coffee desserts)",
                "Artificial sweeteners",
                "MSG added",
            ],
            TagCategory::SpiceAndSuitability => {
                &["Mild heat", "Medium heat", "Spicy heat", "Kid-friendly"]
            }
            TagCategory::ServingLogistics => &[
                "Requires reheating",
                "Keep chilled",
                "Contains raw/undercooked ingredients (e.g., cured fish/meat)",
                "Shelf-stable",
            ],
        }
    }
}

impl std::fmt::Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags that older databases filed under the wrong category, with the
/// category they belong in.
pub const CATEGORY_CORRECTIONS: &[(&str, TagCategory)] = &[
    (
        "Vegetarian but not vegan (contains eggs/honey)",
        TagCategory::DietaryPatterns,
    ),
    (
        "Lactose-free (distinct from dairy-free)",
        TagCategory::IngredientAvoidances,
    ),
];

/// Tags of one category, ready for display
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagGroup {
    pub category: String,
    pub tags: Vec<Tag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, category: &str, position: i64) -> Tag {
        Tag {
            id: 0,
            name: name.to_string(),
            category: category.to_string(),
            position,
        }
    }

    #[test]
    fn test_category_parse_round_trips_names() {
        for category in TagCategory::ALL {
            assert_eq!(TagCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(
            TagCategory::parse("  Serving logistics "),
            Some(TagCategory::ServingLogistics)
        );
        assert_eq!(TagCategory::parse("serving logistics"), None);
        assert_eq!(TagCategory::parse("Desserts"), None);
    }

    #[test]
    fn test_unknown_category_sorts_last() {
        assert_eq!(TagCategory::sort_index("Dietary patterns"), 0);
        assert_eq!(TagCategory::sort_index("Serving logistics"), 5);
        assert_eq!(TagCategory::sort_index("Legacy"), 6);
    }

    #[test]
    fn test_sort_key_orders_by_category_position_then_name() {
        let mut tags = vec![
            tag("b", "Serving logistics", 0),
            tag("Zucchini-free", "Dietary patterns", 1),
            tag("apple", "Dietary patterns", 1),
            tag("Vegan", "Dietary patterns", 0),
            tag("Old", "Legacy", 0),
        ];
        tags.sort_by_key(|t| t.sort_key());

        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Vegan", "apple", "Zucchini-free", "b", "Old"]);
    }

    #[test]
    fn test_default_catalog_names_are_unique_ignoring_case() {
        let mut seen = std::collections::HashSet::new();
        for category in TagCategory::ALL {
            assert!(!category.default_tags().is_empty());
            for name in category.default_tags() {
                assert!(seen.insert(name.to_lowercase()), "duplicate default tag {}", name);
            }
        }
    }
}
