//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{header, Request, Response};
use axum::Router;
use dishlist::api::{build_router, AppState};
use dishlist::build_state;
use dishlist::db::create_test_pool;
use tempfile::TempDir;
use tower::ServiceExt;

/// A fully wired app on an in-memory database with its config file in a
/// temporary directory.
pub struct TestApp {
    pub state: AppState,
    pub config_path: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let pool = create_test_pool().await.unwrap();
        let state = build_state(pool, config_path.clone()).await.unwrap();
        Self {
            state,
            config_path,
            _dir: dir,
        }
    }

    /// Router whose requests appear to come from `client`
    pub fn router_from(&self, client: &str) -> Router {
        let addr: SocketAddr = format!("{}:40000", client)
            .parse()
            .or_else(|_| format!("[{}]:40000", client).parse())
            .unwrap();
        build_router(self.state.clone()).layer(MockConnectInfo(addr))
    }

    /// Router for requests from loopback, which the default config admits
    pub fn router(&self) -> Router {
        self.router_from("127.0.0.1")
    }

    pub async fn tag_id(&self, name: &str) -> i64 {
        self.state
            .tag_service
            .list_groups()
            .await
            .unwrap()
            .into_iter()
            .flat_map(|group| group.tags)
            .find(|tag| tag.name == name)
            .map(|tag| tag.id)
            .unwrap_or_else(|| panic!("seeded tag {} missing", name))
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: Router, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
    let body = serde_urlencoded::to_string(fields).unwrap();
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}
