//! `Store` workflows end to end against a mock conversion service.

mod common;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{spawn_server, store};
use doc2md_client::{
    ConversionOptions, DocumentFile, Store, WorkflowError, CONVERSION_FAILED, FETCH_FORMATS_FAILED,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn sample_pdf() -> DocumentFile {
    DocumentFile::from_bytes("paper.pdf", b"%PDF-1.7".to_vec())
}

fn convert_route(status: StatusCode, body: &'static str) -> Router {
    Router::new().route("/api/convert", post(move || async move { (status, body) }))
}

// ── fetch_supported_formats ──────────────────────────────────────────────────

#[tokio::test]
async fn fetch_formats_stores_server_list() {
    let app = Router::new().route(
        "/api/formats",
        get(|| async { Json(json!({ "formats": [".pdf", ".docx"] })) }),
    );
    let s = store(&spawn_server(app).await);

    s.fetch_supported_formats().await.unwrap();

    let st = s.state();
    assert_eq!(st.supported_formats, vec![".pdf", ".docx"]);
    assert_eq!(st.error, None);
    assert!(!st.is_loading);
    assert!(s.is_supported_format("Scan.PDF"));
    assert!(!s.is_supported_format("notes.txt"));
}

#[tokio::test]
async fn fetch_formats_failure_keeps_previous_list() {
    let app = Router::new().route(
        "/api/formats",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream unavailable") }),
    );
    let s = store(&spawn_server(app).await);
    s.set_supported_formats(vec![".txt".into()]);

    s.fetch_supported_formats().await.unwrap();

    let st = s.state();
    assert_eq!(st.supported_formats, vec![".txt"]);
    assert_eq!(st.error.as_deref(), Some("upstream unavailable"));
    assert!(!st.is_loading);
}

#[tokio::test]
async fn fetch_formats_failure_without_body_reports_status() {
    let app = Router::new().route(
        "/api/formats",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let s = store(&spawn_server(app).await);

    s.fetch_supported_formats().await.unwrap();

    let st = s.state();
    assert_eq!(
        st.error.as_deref(),
        Some("Server returned 500 Internal Server Error")
    );
    assert_ne!(st.error.as_deref(), Some(FETCH_FORMATS_FAILED));
    assert!(!st.is_loading);
}

#[tokio::test]
async fn fetch_formats_wrong_base_url_reports_not_found() {
    let s = store(&spawn_server(Router::new()).await);

    s.fetch_supported_formats().await.unwrap();

    let err = s.state().error.unwrap_or_default();
    assert!(err.contains("404"), "got: {err}");
}

#[tokio::test]
async fn fetch_formats_stalled_error_body_reports_timeout() {
    let base = common::spawn_truncated_error_server(true).await;
    let s = Store::new(common::client_with_timeout(&base, 1));

    s.fetch_supported_formats().await.unwrap();

    let st = s.state();
    let err = st.error.unwrap_or_default();
    assert!(err.contains("timed out after 1s"), "got: {err}");
    assert!(!st.is_loading);
}

#[tokio::test]
async fn fetch_formats_unreachable_reports_transport_message() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let s = store(&format!("http://{addr}/api"));

    s.fetch_supported_formats().await.unwrap();

    let st = s.state();
    let err = st.error.unwrap_or_default();
    assert!(err.contains("/api/formats"), "got: {err}");
    assert!(!st.is_loading);
}

#[tokio::test]
async fn fetch_formats_clears_stale_error() {
    let app = Router::new().route(
        "/api/formats",
        get(|| async { Json(json!({ "formats": [".rtf"] })) }),
    );
    let s = store(&spawn_server(app).await);
    s.set_error("from an earlier attempt");

    s.fetch_supported_formats().await.unwrap();
    assert_eq!(s.state().error, None);
}

// ── convert_document ─────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_stores_body_verbatim() {
    let app = Router::new().route(
        "/api/convert",
        post(|| async { Json(json!({ "markdown": "# Title" })) }),
    );
    let s = store(&spawn_server(app).await);

    s.convert_document(&sample_pdf(), &ConversionOptions::default())
        .await
        .unwrap();

    let st = s.state();
    assert_eq!(st.conversion_result, Some(json!({ "markdown": "# Title" })));
    assert_eq!(st.error, None);
    assert!(!st.is_loading);
}

#[tokio::test]
async fn convert_result_decodes_into_response() {
    let app = Router::new().route(
        "/api/convert",
        post(|| async {
            Json(json!({
                "success": true,
                "content": "# Paper\n\nBody.\n",
                "filename": "paper.md",
                "error": null
            }))
        }),
    );
    let s = store(&spawn_server(app).await);

    s.convert_document(&sample_pdf(), &ConversionOptions::default())
        .await
        .unwrap();

    let out = s.state().conversion_response().unwrap();
    assert!(out.success);
    assert_eq!(out.filename.as_deref(), Some("paper.md"));
    assert_eq!(out.content.as_deref(), Some("# Paper\n\nBody.\n"));
}

#[tokio::test]
async fn convert_failure_prefers_server_detail() {
    let app = convert_route(StatusCode::BAD_REQUEST, r#"{"detail":"bad file"}"#);
    let s = store(&spawn_server(app).await);
    s.set_conversion_result(Some(json!({ "content": "previous" })));

    s.convert_document(&sample_pdf(), &ConversionOptions::default())
        .await
        .unwrap();

    let st = s.state();
    assert_eq!(st.error.as_deref(), Some("bad file"));
    assert_eq!(st.conversion_result, None);
    assert!(!st.is_loading);
}

#[tokio::test]
async fn convert_failure_falls_back_to_plain_message() {
    let app = convert_route(StatusCode::SERVICE_UNAVAILABLE, "try again later");
    let s = store(&spawn_server(app).await);

    s.convert_document(&sample_pdf(), &ConversionOptions::default())
        .await
        .unwrap();

    assert_eq!(s.state().error.as_deref(), Some("try again later"));
}

#[tokio::test]
async fn convert_failure_without_detail_or_message_uses_default() {
    let app = convert_route(StatusCode::INTERNAL_SERVER_ERROR, "");
    let s = store(&spawn_server(app).await);

    s.convert_document(&sample_pdf(), &ConversionOptions::default())
        .await
        .unwrap();

    let st = s.state();
    assert_eq!(st.error.as_deref(), Some(CONVERSION_FAILED));
    assert!(!st.is_loading);
}

#[tokio::test]
async fn failed_convert_keeps_known_formats() {
    let app = convert_route(StatusCode::BAD_REQUEST, r#"{"detail":"x"}"#);
    let s = store(&spawn_server(app).await);
    s.set_supported_formats(vec![".pdf".into()]);

    s.convert_document(&sample_pdf(), &ConversionOptions::default())
        .await
        .unwrap();

    assert_eq!(s.state().supported_formats, vec![".pdf"]);
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

fn slow_convert(delay: Duration, reply: serde_json::Value) -> Router {
    Router::new().route(
        "/api/convert",
        post(move || async move {
            tokio::time::sleep(delay).await;
            Json(reply)
        }),
    )
}

/// Wait until the store reports a workflow in flight.
async fn wait_for_loading(s: &Store) {
    let mut rx = s.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|st| st.is_loading))
        .await
        .expect("workflow never started")
        .unwrap();
}

#[tokio::test]
async fn overlapping_workflow_is_rejected() {
    let app = slow_convert(Duration::from_millis(300), json!({ "content": "first" }));
    let s = Arc::new(store(&spawn_server(app).await));

    let first = {
        let s = Arc::clone(&s);
        tokio::spawn(async move {
            s.convert_document(&sample_pdf(), &ConversionOptions::default())
                .await
        })
    };
    wait_for_loading(&s).await;

    let second = s
        .convert_document(
            &DocumentFile::from_bytes("other.pdf", b"%PDF".to_vec()),
            &ConversionOptions::default(),
        )
        .await;
    assert_eq!(second, Err(WorkflowError::InFlight));
    assert_eq!(s.fetch_supported_formats().await, Err(WorkflowError::InFlight));
    assert!(s.state().is_loading);

    first.await.unwrap().unwrap();
    let st = s.state();
    assert_eq!(st.conversion_result, Some(json!({ "content": "first" })));
    assert!(!st.is_loading);
}

#[tokio::test]
async fn dropped_workflow_resets_loading() {
    let app = slow_convert(Duration::from_secs(10), json!({}));
    let s = store(&spawn_server(app).await);

    let outcome = tokio::time::timeout(
        Duration::from_millis(200),
        s.convert_document(&sample_pdf(), &ConversionOptions::default()),
    )
    .await;
    assert!(outcome.is_err(), "workflow should still be in flight");

    let st = s.state();
    assert!(!st.is_loading);
    assert_eq!(st.conversion_result, None);

    // The store accepts new work afterwards.
    s.set_supported_formats(vec![".pdf".into()]);
    assert!(s.is_supported_format("again.pdf"));
}

#[tokio::test]
async fn subscribers_observe_loading_round_trip() {
    let app = slow_convert(Duration::from_millis(100), json!({ "content": "done" }));
    let s = Arc::new(store(&spawn_server(app).await));
    let mut rx = s.subscribe();

    let task = {
        let s = Arc::clone(&s);
        tokio::spawn(async move {
            s.convert_document(&sample_pdf(), &ConversionOptions::default())
                .await
        })
    };

    rx.wait_for(|st| st.is_loading).await.unwrap();
    let done = rx
        .wait_for(|st| !st.is_loading)
        .await
        .unwrap()
        .clone();
    assert_eq!(done.conversion_result, Some(json!({ "content": "done" })));
    task.await.unwrap().unwrap();
}
