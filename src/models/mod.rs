//! Data models
//!
//! This module contains the data structures shared across DishList:
//! - Database entities (DishEntry, Tag)
//! - The admin-editable AppConfig
//! - Form input types and small normalization helpers

mod app_config;
mod dish;
mod tag;

pub use app_config::AppConfig;
pub use dish::{
    dedup_tag_ids, normalize_notes, parse_allergens, parse_timestamp, DishEntry, DishInput,
    CONTRIBUTOR_MAX_CHARS, DISH_NAME_MAX_CHARS,
};
pub use tag::{Tag, TagCategory, TagGroup, CATEGORY_CORRECTIONS};
