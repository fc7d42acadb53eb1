//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod app_config;
pub mod dish;
pub mod tag;

pub use app_config::{AppConfigRepository, SqlxAppConfigRepository};
pub use dish::{DishRepository, SqlxDishRepository};
pub use tag::{SqlxTagRepository, TagRepository};
