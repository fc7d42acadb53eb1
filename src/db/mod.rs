//! Database layer
//!
//! SQLite persistence for DishList: the connection pool, embedded schema
//! migrations, first-run seeding, and one repository per table group.
//!
//! # Usage
//!
//! ```ignore
//! use dishlist::config::DatabaseConfig;
//! use dishlist::db::{create_pool, migrations, seed};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! seed::seed_database(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;
pub mod seed;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
