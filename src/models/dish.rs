//! Dish model
//!
//! This module provides:
//! - `DishEntry` entity for one potluck sign-up
//! - `DishInput` for submissions coming from the add and edit forms
//! - Helpers for the free-text allergen list and tag id lists

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tag;

/// Longest accepted contributor name, in characters
pub const CONTRIBUTOR_MAX_CHARS: usize = 80;
/// Longest accepted dish name, in characters
pub const DISH_NAME_MAX_CHARS: usize = 120;

/// A dish someone has signed up to bring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DishEntry {
    /// Unique identifier (0 until stored)
    pub id: i64,
    pub contributor: String,
    pub dish_name: String,
    pub dish_type: String,
    /// Free-text allergen notes
    pub allergens: Vec<String>,
    /// Tag names. Mirrors `tags` when the dish has associations, otherwise the
    /// denormalized list stored with the row.
    pub dietary_flags: Vec<String>,
    pub tag_ids: Vec<i64>,
    pub tags: Vec<Tag>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DishEntry {
    /// Case-insensitive substring match over the searchable fields.
    ///
    /// `needle` must already be trimmed and lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        let allergens = self.allergens.join(", ");
        let flags = self.dietary_flags.join(", ");
        [
            self.dish_name.as_str(),
            self.contributor.as_str(),
            self.dish_type.as_str(),
            self.notes.as_deref().unwrap_or(""),
            allergens.as_str(),
            flags.as_str(),
        ]
        .iter()
        .any(|chunk| !chunk.is_empty() && chunk.to_lowercase().contains(needle))
    }
}

/// Fields submitted from the add/edit dish forms, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DishInput {
    pub contributor: String,
    pub dish_name: String,
    pub dish_type: String,
    /// Comma separated allergen text
    pub allergens: Option<String>,
    pub notes: Option<String>,
    /// Selected tag ids, possibly repeated
    pub tag_ids: Vec<i64>,
}

/// Split comma separated allergen text into trimmed, non-empty items
pub fn parse_allergens(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim notes, mapping blank text to `None`
pub fn normalize_notes(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(str::to_string)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 text as well as naive ISO 8601 timestamps written by
/// older versions, which are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Remove repeated ids, keeping the first occurrence of each
pub fn dedup_tag_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
