//! API layer - HTTP handlers and routing
//!
//! Server-rendered HTML endpoints:
//! - Public dish list, search fragments and submission form
//! - IP-gated admin panel under [`ADMIN_PATH`]
//! - Embedded static assets

pub mod admin;
pub mod dishes;
pub mod forms;
pub mod middleware;
pub mod static_files;

use axum::{response::Html, routing::get, Router};
use tera::Context as TeraContext;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState};

/// Mount point of the admin panel
pub const ADMIN_PATH: &str = "/pantry-admin";

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(dishes::router())
        .merge(admin::router(state.clone()))
        .route("/static/{*path}", get(static_files::serve_static))
        .route("/favicon.ico", get(static_files::serve_favicon))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render a page template into an HTML response
pub(crate) fn render(
    state: &AppState,
    template: &str,
    context: &TeraContext,
) -> Result<Html<String>, ApiError> {
    Ok(Html(state.views.render(template, context)?))
}
