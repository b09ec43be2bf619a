//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pagechain_core::config::AppConfig;
use pagechain_server::bootstrap::ensure_bootstrap_list;
use pagechain_server::metrics::register_metrics;
use pagechain_server::{AppState, create_router};
use pagechain_store::{IndexStore, SqliteStore};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A router over a fresh SQLite index with the bootstrap list in place.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build a server after letting the caller adjust the test config.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("index.db");

        let store: Arc<dyn IndexStore> = Arc::new(
            SqliteStore::new(&db_path, None)
                .await
                .expect("Failed to create index store"),
        );

        let mut config = AppConfig::for_testing(db_path.clone());
        adjust(&mut config);

        let state = AppState::new(config, store);
        ensure_bootstrap_list(&state.chain)
            .await
            .expect("Failed to bootstrap list");

        register_metrics();
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Send a request and decode the JSON response body.
    pub async fn json_request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Append an article and assert it was accepted.
    pub async fn append(&self, list_id: i64, title: &str) -> Value {
        let (status, json) = self
            .json_request(
                "POST",
                &format!("/v1/lists/{list_id}/articles"),
                Some(serde_json::json!({
                    "title": title,
                    "author": "tester",
                    "content": format!("body of {title}"),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "append {title}: {json}");
        json
    }
}

/// Titles of every article in a page response, in order.
#[allow(dead_code)]
pub fn page_titles(page: &Value) -> Vec<String> {
    page["articles"]
        .as_array()
        .map(|articles| {
            articles
                .iter()
                .filter_map(|a| a["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
