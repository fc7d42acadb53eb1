//! Admin panel
//!
//! Every route here sits behind the admin network gate. Settings and dish
//! edits redirect back to the panel; tag actions also carry a
//! `tag_success` or `tag_error` message in the query string.

use axum::{
    extract::{Path, Query, State},
    middleware as axum_middleware,
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use tera::Context as TeraContext;

use crate::api::forms::{AdminQuery, AdminSettingsForm, DishForm, DishFormValues, TagForm};
use crate::api::middleware::{self, ApiError, AppState};
use crate::api::{render, ADMIN_PATH};
use crate::services::TagServiceError;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(ADMIN_PATH, get(admin_page).post(update_settings))
        .route(&format!("{}/tags", ADMIN_PATH), post(add_tag))
        .route(&format!("{}/tags/{{id}}/delete", ADMIN_PATH), post(delete_tag))
        .route(
            &format!("{}/dishes/{{id}}", ADMIN_PATH),
            get(edit_dish_form).post(edit_dish_submit),
        )
        .route(&format!("{}/dishes/{{id}}/delete", ADMIN_PATH), post(delete_dish))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin_network,
        ))
}

async fn admin_page(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Html<String>, ApiError> {
    let config = state.config_store.current();

    let mut context = TeraContext::new();
    context.insert("config", &config);
    context.insert("dish_types_text", &config.dish_types.join("\n"));
    context.insert("admin_networks_text", &config.admin_networks.join("\n"));
    context.insert("dishes", &state.dish_service.list().await?);
    context.insert("admin_path", ADMIN_PATH);
    context.insert("tag_groups", &state.tag_service.list_groups().await?);
    context.insert("tag_categories", &state.tag_service.categories());
    context.insert("tag_success", &query.tag_success);
    context.insert("tag_error", &query.tag_error);
    render(&state, "admin.html", &context)
}

async fn update_settings(
    State(state): State<AppState>,
    Form(form): Form<AdminSettingsForm>,
) -> Result<Redirect, ApiError> {
    state
        .config_store
        .update_from_text(&form.dish_types_input, &form.admin_networks_input)
        .await?;
    Ok(Redirect::to(ADMIN_PATH))
}

async fn add_tag(
    State(state): State<AppState>,
    Form(form): Form<TagForm>,
) -> Result<Redirect, ApiError> {
    match state.tag_service.create(&form.tag_name, &form.tag_category).await {
        Ok(_) => redirect_to_admin(Some("Tag added"), None),
        Err(TagServiceError::ValidationError(msg)) => redirect_to_admin(None, Some(&msg)),
        Err(e) => Err(e.into()),
    }
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, ApiError> {
    state.tag_service.delete(id).await?;
    redirect_to_admin(Some("Tag removed"), None)
}

async fn edit_dish_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, ApiError> {
    let dish = state.dish_service.get(id).await?;
    let config = state.config_store.current();

    let mut context = TeraContext::new();
    context.insert("form", &DishFormValues::from(&dish));
    context.insert("dish", &dish);
    context.insert("dish_types", &config.dish_types);
    context.insert("admin_path", ADMIN_PATH);
    context.insert("tag_groups", &state.tag_service.list_groups().await?);
    render(&state, "admin_edit_dish.html", &context)
}

async fn edit_dish_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, ApiError> {
    let input = DishForm::from_pairs(pairs).into_input()?;
    let config = state.config_store.current();
    state.dish_service.update(id, input, &config).await?;
    Ok(Redirect::to(ADMIN_PATH))
}

async fn delete_dish(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, ApiError> {
    state.dish_service.delete(id).await?;
    Ok(Redirect::to(ADMIN_PATH))
}

fn redirect_to_admin(success: Option<&str>, error: Option<&str>) -> Result<Redirect, ApiError> {
    let mut params = Vec::new();
    if let Some(msg) = success {
        params.push(("tag_success", msg));
    }
    if let Some(msg) = error {
        params.push(("tag_error", msg));
    }
    if params.is_empty() {
        return Ok(Redirect::to(ADMIN_PATH));
    }

    let query = serde_urlencoded::to_string(&params)
        .map_err(|e| ApiError::from(anyhow::Error::new(e).context("Failed to encode redirect")))?;
    Ok(Redirect::to(&format!("{}?{}", ADMIN_PATH, query)))
}
