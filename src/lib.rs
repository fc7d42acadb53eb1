//! DishList - a small potluck sign-up app
//!
//! This library provides the core functionality: dish entries with dietary
//! tags, the app config mirrored between a JSON file and SQLite, and the
//! server-rendered web interface.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod views;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use api::AppState;
use db::{
    repositories::{SqlxAppConfigRepository, SqlxDishRepository, SqlxTagRepository},
    DynDatabasePool,
};
use services::{ConfigStore, DishService, TagService};
use views::ViewEngine;

/// Prepare the schema, seed defaults and wire every service.
///
/// Reconciles the app config file at `app_config_path` with the database
/// before returning.
pub async fn build_state(
    pool: DynDatabasePool,
    app_config_path: impl Into<PathBuf>,
) -> Result<AppState> {
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    db::seed::seed_database(&pool).await?;

    let tag_repo = SqlxTagRepository::boxed(pool.clone());
    let dish_repo = SqlxDishRepository::boxed(pool.clone());
    let config_repo = SqlxAppConfigRepository::boxed(pool);

    let config_store = ConfigStore::load(app_config_path, config_repo).await?;
    tracing::info!(
        "App config loaded from {} ({} dish types)",
        config_store.path().display(),
        config_store.current().dish_types.len()
    );

    Ok(AppState {
        dish_service: Arc::new(DishService::new(dish_repo, tag_repo.clone())),
        tag_service: Arc::new(TagService::new(tag_repo)),
        config_store: Arc::new(config_store),
        views: Arc::new(ViewEngine::new()?),
    })
}
