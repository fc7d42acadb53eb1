//! Embedded static assets under `/static/`

use axum::{
    body::Body,
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

/// Embedded stylesheet and script files
#[derive(RustEmbed)]
#[folder = "static/"]
#[include = "*"]
struct StaticAssets;

/// Serve an embedded asset by path
pub async fn serve_static(Path(path): Path<String>) -> Response {
    // URL decode the path to handle encoded characters like %20
    let decoded = urlencoding::decode(&path).unwrap_or_else(|_| path.as_str().into());
    let asset_path = decoded.trim_start_matches('/');

    match StaticAssets::get(asset_path) {
        Some(content) => build_response(asset_path, &content.data),
        None => not_found(),
    }
}

/// Serve the embedded favicon at `/favicon.ico`
pub async fn serve_favicon() -> Response {
    match StaticAssets::get("favicon.ico") {
        Some(content) => build_response("favicon.ico", &content.data),
        None => not_found(),
    }
}

fn build_response(path: &str, data: &[u8]) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, get_content_type(path)),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        Body::from(data.to_vec()),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        "<html><body><h1>404 Not Found</h1></body></html>",
    )
        .into_response()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
