//! HTTP API tests for list and page endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use pagechain_server::metrics::PAGES_CREATED;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let (status, json) = server.json_request("GET", "/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_bootstrap_list_head() {
    let server = TestServer::new().await;

    let (status, json) = server.json_request("GET", "/v1/lists/1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "next_page_id": 1 }));
}

#[tokio::test]
async fn test_ensure_list_is_idempotent() {
    let server = TestServer::new().await;

    let (status, first) = server.json_request("PUT", "/v1/lists/9", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["list_id"], 9);
    assert_eq!(first["tail_page_id"], first["head_page_id"]);

    let (status, second) = server.json_request("PUT", "/v1/lists/9", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["head_page_id"], first["head_page_id"]);
}

#[tokio::test]
async fn test_ensure_list_counts_first_page() {
    let server = TestServer::new().await;

    // Other tests share the counter, so only a lower bound holds.
    let before = PAGES_CREATED.get();
    let (status, _) = server.json_request("PUT", "/v1/lists/31", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(PAGES_CREATED.get() > before);
}

#[tokio::test]
async fn test_append_fills_pages_in_order() {
    let server = TestServer::new().await;

    let mut created = Vec::new();
    for i in 1..=7 {
        let json = server.append(1, &format!("A{i}")).await;
        created.push(json["created_page"].as_bool().unwrap());
        assert_eq!(json["list_id"], 1);
    }
    // Only the sixth article needs a new page.
    assert_eq!(created, vec![false, false, false, false, false, true, false]);

    let (status, first) = server.json_request("GET", "/v1/pages/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page_titles(&first), vec!["A1", "A2", "A3", "A4", "A5"]);
    assert_eq!(first["articles"][0]["author"], "tester");
    assert_eq!(first["articles"][0]["content"], "body of A1");

    let second_id = first["next_page_id"].as_i64().unwrap();
    assert!(second_id > 1);

    let (status, second) = server
        .json_request("GET", &format!("/v1/pages/{second_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page_titles(&second), vec!["A6", "A7"]);
    assert!(second["next_page_id"].is_null());

    let (status, chain) = server.json_request("GET", "/v1/lists/1/pages", None).await;
    assert_eq!(status, StatusCode::OK);
    let pages = chain["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["page_id"], 1);
    assert_eq!(pages[1]["page_id"], second_id);
}

#[tokio::test]
async fn test_append_rejects_invalid_article() {
    let server = TestServer::new().await;

    let (status, json) = server
        .json_request(
            "POST",
            "/v1/lists/1/articles",
            Some(json!({ "title": "  ", "author": "tester" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");

    let (status, json) = server
        .json_request("POST", "/v1/lists/1/articles", Some(json!({ "title": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");

    let (status, chain) = server.json_request("GET", "/v1/lists/1/pages", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(chain["pages"][0]["articles"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_replace_page_articles() {
    let server = TestServer::new().await;
    for i in 1..=6 {
        server.append(1, &format!("A{i}")).await;
    }

    // Page 1 is closed: it must stay exactly full.
    let (status, json) = server
        .json_request(
            "PUT",
            "/v1/pages/1",
            Some(json!([{ "title": "R1", "author": "editor" }])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");

    let replacement: Vec<_> = (1..=5)
        .map(|i| json!({ "title": format!("R{i}"), "author": "editor" }))
        .collect();
    let (status, json) = server
        .json_request("PUT", "/v1/pages/1", Some(json!(replacement)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page_titles(&json), vec!["R1", "R2", "R3", "R4", "R5"]);
    let tail_id = json["next_page_id"].as_i64().unwrap();

    // The open tail page takes a single object.
    let (status, json) = server
        .json_request(
            "PUT",
            &format!("/v1/pages/{tail_id}"),
            Some(json!({ "title": "T1", "author": "editor", "content": "new" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page_titles(&json), vec!["T1"]);
    assert!(json["next_page_id"].is_null());

    // Appends continue on the replaced tail.
    let appended = server.append(1, "A7").await;
    assert_eq!(appended["page_id"], tail_id);
    assert_eq!(appended["created_page"], false);

    let (status, json) = server
        .json_request(
            "PUT",
            "/v1/pages/999",
            Some(json!([{ "title": "X", "author": "editor" }])),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn test_delete_list_cascades() {
    let server = TestServer::new().await;
    for i in 1..=7 {
        server.append(1, &format!("A{i}")).await;
    }
    server.append(2, "other").await;

    let (status, json) = server.json_request("DELETE", "/v1/lists/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["list_id"], 1);
    assert_eq!(json["pages_deleted"], 2);
    assert_eq!(json["articles_deleted"], 7);

    let (status, _) = server.json_request("GET", "/v1/pages/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The head marker survives; the chain is empty until the next append.
    let (status, json) = server.json_request("GET", "/v1/lists/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["next_page_id"], 1);
    let (_, chain) = server.json_request("GET", "/v1/lists/1/pages", None).await;
    assert!(chain["pages"].as_array().unwrap().is_empty());

    // Other lists are untouched.
    let (_, chain) = server.json_request("GET", "/v1/lists/2/pages", None).await;
    assert_eq!(page_titles(&chain["pages"][0]), vec!["other"]);

    let appended = server.append(1, "again").await;
    assert_eq!(appended["page_id"], 1);
    assert_eq!(appended["created_page"], true);

    let (status, json) = server.json_request("DELETE", "/v1/lists/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn test_unknown_and_invalid_ids() {
    let server = TestServer::new().await;

    let (status, json) = server.json_request("GET", "/v1/lists/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");

    let (status, _) = server.json_request("GET", "/v1/lists/77/pages", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.json_request("GET", "/v1/pages/12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for uri in ["/v1/lists/abc", "/v1/lists/0", "/v1/lists/-3", "/v1/pages/xyz"] {
        let (status, json) = server.json_request("GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["code"], "validation_error", "{uri}");
    }
}

#[tokio::test]
async fn test_bootstrap_disabled() {
    let server = TestServer::with_config(|config| {
        config.index.bootstrap_on_startup = false;
    })
    .await;

    let (status, _) = server.json_request("GET", "/v1/lists/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Append creates the list with its fixed first page.
    let appended = server.append(1, "first").await;
    assert_eq!(appended["page_id"], 1);
    assert_eq!(appended["created_page"], true);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = TestServer::new().await;
    server.append(1, "counted").await;

    let request = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("pagechain_articles_appended_total"));
    assert!(text.contains("pagechain_append_duration_seconds"));
}

#[tokio::test]
async fn test_metrics_disabled() {
    let server = TestServer::with_config(|config| {
        config.server.metrics_enabled = false;
    })
    .await;

    let (status, _) = server.json_request("GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
