use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use bytes::Bytes;
use tower::ServiceExt;

use sweeplog_blob::{AttachmentStore, BlobError, LocatorScheme};
use sweeplog_blob_memory::MemoryAttachmentStore;
use sweeplog_core::Locator;
use sweeplog_records::RecordStore;
use sweeplog_records_memory::MemoryRecordStore;
use sweeplog_server::api::AppState;

const BASE: &str = "http://sweeplog.test/v1/attachments";

// -- Failing attachment store ---------------------------------------------

struct UnavailableAttachments;

#[async_trait]
impl AttachmentStore for UnavailableAttachments {
    async fn store(&self, _data: Bytes, _name_hint: &str) -> Result<Locator, BlobError> {
        Err(BlobError::StorageUnavailable("bucket offline".into()))
    }

    async fn fetch(&self, locator: &Locator) -> Result<Bytes, BlobError> {
        Err(BlobError::NotFound(locator.to_string()))
    }
}

// -- Helpers --------------------------------------------------------------

fn build_test_state() -> (AppState, Arc<MemoryRecordStore>) {
    let scheme = LocatorScheme::new(BASE);
    let attachments = Arc::new(MemoryAttachmentStore::new().with_scheme(scheme.clone()));
    let records = Arc::new(MemoryRecordStore::new());
    let state = AppState::new(attachments, scheme, Arc::clone(&records) as Arc<dyn RecordStore>);
    (state, records)
}

fn app() -> axum::Router {
    sweeplog_server::api::router(build_test_state().0)
}

async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn json_request(method: http::Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Upload raw bytes and return the issued locator.
async fn upload(app: &axum::Router, data: &'static [u8], name: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri(format!("/v1/attachments?name={name}"))
                .body(Body::from(data))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["locator"]
        .as_str()
        .unwrap()
        .to_owned()
}

// -- Health ---------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let response = app().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let response = app().oneshot(get("/api-doc/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert_eq!(doc["info"]["title"], "Sweeplog API");
    assert!(doc["paths"]["/v1/reports"].is_object());
}

// -- Attachments ----------------------------------------------------------

#[tokio::test]
async fn upload_then_download_round_trips() {
    let app = app();
    let locator = upload(&app, b"\x89PNG fake", "img1.png").await;

    assert!(locator.starts_with(&format!("{BASE}/images/")));
    assert!(locator.ends_with("-img1.png"));

    let path = locator.trim_start_matches("http://sweeplog.test");
    let response = app.oneshot(get(path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[http::header::CONTENT_TYPE],
        "image/png"
    );
    assert_eq!(&body_bytes(response).await[..], b"\x89PNG fake");
}

#[tokio::test]
async fn same_bytes_get_distinct_locators() {
    let app = app();
    let a = upload(&app, b"same", "x.png").await;
    let b = upload(&app, b"same", "x.png").await;
    assert_ne!(a, b);
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri("/v1/attachments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("invalid payload"));
}

#[tokio::test]
async fn unknown_attachment_is_not_found() {
    let response = app()
        .oneshot(get("/v1/attachments/images/1700000000000-nothing-here.png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Records --------------------------------------------------------------

#[tokio::test]
async fn create_and_list_records_newest_first() {
    let app = app();
    let locator = upload(&app, b"before", "before.jpg").await;

    let first = app
        .clone()
        .oneshot(json_request(
            http::Method::POST,
            "/v1/records",
            &serde_json::json!({
                "before_note": "dirty",
                "before_locator": locator,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;
    assert_eq!(first["before_note"], "dirty");
    assert_eq!(first["after_note"], "");
    assert_eq!(first["before_attachment"]["locator"], locator.as_str());
    assert!(first["after_attachment"].is_null());

    let second = app
        .clone()
        .oneshot(json_request(
            http::Method::POST,
            "/v1/records",
            &serde_json::json!({ "after_note": "clean" }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CREATED);
    let second = body_json(second).await;
    assert_ne!(first["id"], second["id"]);

    let response = app.oneshot(get("/v1/records")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list["count"], 2);
    assert_eq!(list["records"][0]["id"], second["id"]);
    assert_eq!(list["records"][1]["id"], first["id"]);
}

#[tokio::test]
async fn list_records_empty() {
    let response = app().oneshot(get("/v1/records")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list["count"], 0);
    assert_eq!(list["records"], serde_json::json!([]));
}

// -- Reports --------------------------------------------------------------

#[tokio::test]
async fn submit_report_uploads_and_persists() {
    let (state, records) = build_test_state();
    let app = sweeplog_server::api::router(state);

    let response = app
        .clone()
        .oneshot(json_request(
            http::Method::POST,
            "/v1/reports",
            &serde_json::json!({
                "before_note": "dirty",
                "after_note": "clean",
                // "before" / "after"
                "before_image": { "name": "img1.png", "data_base64": "YmVmb3Jl" },
                "after_image": { "name": "img2.png", "data_base64": "YWZ0ZXI=" },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let record = body_json(response).await;
    assert_eq!(record["before_note"], "dirty");
    assert_eq!(record["after_note"], "clean");
    assert_eq!(records.len(), 1);

    let before = record["before_attachment"]["locator"].as_str().unwrap();
    let after = record["after_attachment"]["locator"].as_str().unwrap();
    assert!(before.ends_with("-img1.png"));
    assert!(after.ends_with("-img2.png"));

    let response = app
        .clone()
        .oneshot(get(before.trim_start_matches("http://sweeplog.test")))
        .await
        .unwrap();
    assert_eq!(&body_bytes(response).await[..], b"before");

    // The workflow is reset after each submission.
    let response = app.clone().oneshot(get("/v1/reports/session")).await.unwrap();
    let session = body_json(response).await;
    assert_eq!(session["session_id"], "default");
    assert_eq!(session["state"], "idle");

    let response = app.oneshot(get("/v1/reports")).await.unwrap();
    let list = body_json(response).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["records"][0]["id"], record["id"]);
}

#[tokio::test]
async fn submit_report_without_images() {
    let response = app()
        .oneshot(json_request(
            http::Method::POST,
            "/v1/reports",
            &serde_json::json!({ "before_note": "note only" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let record = body_json(response).await;
    assert_eq!(record["before_note"], "note only");
    assert!(record["before_attachment"].is_null());
    assert!(record["after_attachment"].is_null());
}

#[tokio::test]
async fn submit_report_rejects_bad_base64() {
    let (state, records) = build_test_state();
    let response = sweeplog_server::api::router(state)
        .oneshot(json_request(
            http::Method::POST,
            "/v1/reports",
            &serde_json::json!({
                "before_image": { "name": "a.png", "data_base64": "%%%" },
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(records.is_empty());
}

#[tokio::test]
async fn submit_report_with_empty_image_is_rejected() {
    let (state, records) = build_test_state();
    let response = sweeplog_server::api::router(state)
        .oneshot(json_request(
            http::Method::POST,
            "/v1/reports",
            &serde_json::json!({
                "before_image": { "name": "a.png", "data_base64": "" },
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(records.is_empty());
}

#[tokio::test]
async fn failed_upload_persists_nothing() {
    let records = Arc::new(MemoryRecordStore::new());
    let state = AppState::new(
        Arc::new(UnavailableAttachments),
        LocatorScheme::new(BASE),
        Arc::clone(&records) as Arc<dyn RecordStore>,
    );
    let app = sweeplog_server::api::router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri("/v1/reports")
                .header(http::header::CONTENT_TYPE, "application/json")
                .header("x-session-id", "tablet-1")
                .body(Body::from(
                    serde_json::json!({
                        "before_note": "dirty",
                        "before_image": { "name": "a.png", "data_base64": "YQ==" },
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("bucket offline"));
    assert!(records.is_empty());

    // The session is usable again.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/reports/session")
                .header("x-session-id", "tablet-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let session = body_json(response).await;
    assert_eq!(session["session_id"], "tablet-1");
    assert_eq!(session["state"], "idle");
}

#[tokio::test]
async fn session_reads_do_not_register_sessions() {
    let (state, _records) = build_test_state();
    let sessions = Arc::clone(&state.sessions);
    let app = sweeplog_server::api::router(state);

    for i in 0..50 {
        let id = format!("s{i}");
        for uri in ["/v1/reports", "/v1/reports/session"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(uri)
                        .header("x-session-id", id.as_str())
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
    assert!(sessions.is_empty());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/reports/session")
                .header("x-session-id", "tablet-9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let session = body_json(response).await;
    assert_eq!(session["session_id"], "tablet-9");
    assert_eq!(session["state"], "idle");
}

#[tokio::test]
async fn finished_submissions_release_their_session() {
    let (state, records) = build_test_state();
    let sessions = Arc::clone(&state.sessions);
    let app = sweeplog_server::api::router(state);

    for id in ["a", "b", "c"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(http::Method::POST)
                    .uri("/v1/reports")
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .header("x-session-id", id)
                    .body(Body::from(
                        serde_json::json!({ "before_note": id }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    assert_eq!(records.len(), 3);
    assert!(sessions.is_empty());
}

// -- Record locators ------------------------------------------------------

#[tokio::test]
async fn blank_locator_is_stored_as_absent() {
    let response = app()
        .oneshot(json_request(
            http::Method::POST,
            "/v1/records",
            &serde_json::json!({ "before_note": "dirty", "before_locator": "", "after_locator": "  " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let record = body_json(response).await;
    assert!(record["before_attachment"].is_null());
    assert!(record["after_attachment"].is_null());
}

#[tokio::test]
async fn foreign_locator_is_rejected() {
    let (state, records) = build_test_state();
    let response = sweeplog_server::api::router(state)
        .oneshot(json_request(
            http::Method::POST,
            "/v1/records",
            &serde_json::json!({ "after_locator": "https://elsewhere.example.com/img.png" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("invalid locator"));
    assert!(records.is_empty());
}

#[tokio::test]
async fn traversal_locator_is_rejected() {
    let (state, records) = build_test_state();
    let response = sweeplog_server::api::router(state)
        .oneshot(json_request(
            http::Method::POST,
            "/v1/records",
            &serde_json::json!({ "before_locator": format!("{BASE}/images/../secret") }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(records.is_empty());
}
