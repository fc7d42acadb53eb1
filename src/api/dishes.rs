//! Public dish pages
//!
//! - `GET /` lists dishes as cards or a table, optionally filtered
//! - `GET /add` and `POST /add` submit a new dish
//! - `GET /table/rows` and `GET /cards/grid` return the filtered fragments
//!   used for live search

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    routing::get,
    Form, Router,
};
use tera::Context as TeraContext;

use crate::api::forms::{DishForm, DishFormValues, ListQuery, ViewMode};
use crate::api::middleware::{ApiError, AppState};
use crate::api::{render, ADMIN_PATH};
use crate::services::filter_dishes;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/add", get(add_form).post(add_submission))
        .route("/table/rows", get(table_rows))
        .route("/cards/grid", get(card_grid))
}

async fn home(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, ApiError> {
    let view_mode = ViewMode::parse(query.view.as_deref());
    let search_query = query.search.trim().to_string();

    let dishes = state.dish_service.list().await?;
    let filtered = filter_dishes(dishes.clone(), &search_query);

    let mut context = TeraContext::new();
    context.insert("dishes", &dishes);
    context.insert("dish_types", &state.config_store.current().dish_types);
    context.insert("admin_path", ADMIN_PATH);
    context.insert("view_mode", view_mode.as_str());
    context.insert("search_query", &search_query);
    context.insert("table_dishes", &filtered);
    context.insert("card_dishes", &filtered);
    render(&state, "home.html", &context)
}

async fn add_form(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let config = state.config_store.current();

    let mut context = TeraContext::new();
    context.insert("dish_types", &config.dish_types);
    context.insert("admin_path", ADMIN_PATH);
    context.insert("tag_groups", &state.tag_service.list_groups().await?);
    context.insert("form", &DishFormValues::blank(&config));
    render(&state, "add.html", &context)
}

async fn add_submission(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, ApiError> {
    let input = DishForm::from_pairs(pairs).into_input()?;
    let config = state.config_store.current();
    state.dish_service.create(input, &config).await?;
    Ok(Redirect::to("/"))
}

async fn table_rows(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, ApiError> {
    let mut context = TeraContext::new();
    context.insert("table_dishes", &state.dish_service.search(&query.search).await?);
    render(&state, "partials/table_rows.html", &context)
}

async fn card_grid(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, ApiError> {
    let mut context = TeraContext::new();
    context.insert("card_dishes", &state.dish_service.search(&query.search).await?);
    render(&state, "partials/card_grid.html", &context)
}
