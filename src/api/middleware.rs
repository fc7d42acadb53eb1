//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The HTML error response used by every handler
//! - The admin network gate

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::services::{
    is_ip_allowed, ConfigStore, ConfigStoreError, DishService, DishServiceError, TagService,
    TagServiceError,
};
use crate::views::ViewEngine;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub dish_service: Arc<DishService>,
    pub tag_service: Arc<TagService>,
    pub config_store: Arc<ConfigStore>,
    pub views: Arc<ViewEngine>,
}

/// Error response for HTML endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = format!(
            "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{code} | DishList</title></head>\
             <body><h1>{code}</h1><p>{message}</p><p><a href=\"/\">Back to the dish list</a></p></body></html>\n",
            code = status,
            message = tera::escape_html(&self.message),
        );

        (
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!("Request failed: {:#}", e);
    ApiError::internal_error("Internal server error")
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        internal(e)
    }
}

impl From<DishServiceError> for ApiError {
    fn from(e: DishServiceError) -> Self {
        match e {
            DishServiceError::NotFound(_) => ApiError::not_found("Dish not found"),
            DishServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            DishServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<TagServiceError> for ApiError {
    fn from(e: TagServiceError) -> Self {
        match e {
            TagServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            TagServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<ConfigStoreError> for ApiError {
    fn from(e: ConfigStoreError) -> Self {
        match e {
            ConfigStoreError::ValidationError(msg) => ApiError::validation_error(msg),
            ConfigStoreError::InternalError(e) => internal(e),
        }
    }
}

/// Admin network gate.
///
/// Lets the request through only when the peer address falls inside one of
/// the configured admin networks. Requests without connection info are
/// refused.
pub async fn require_admin_network(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let client = ConnectInfo::<SocketAddr>::from_request_parts(&mut parts, &state)
        .await
        .ok()
        .map(|ConnectInfo(addr)| addr.ip());
    let request = Request::from_parts(parts, body);

    let Some(client) = client else {
        tracing::warn!(path = %request.uri().path(), "Admin request without peer address");
        return Err(ApiError::forbidden("Admin access restricted"));
    };

    let config = state.config_store.current();
    if !is_ip_allowed(client, &config.admin_networks) {
        tracing::warn!(client = %client, path = %request.uri().path(), "Admin access denied");
        return Err(ApiError::forbidden("Admin access restricted"));
    }

    Ok(next.run(request).await)
}
