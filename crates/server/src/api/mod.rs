pub mod attachments;
pub mod health;
pub mod openapi;
pub mod records;
pub mod reports;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use sweeplog_blob::{AttachmentStore, LocatorScheme};
use sweeplog_records::RecordStore;

use crate::sessions::SessionRegistry;

use self::openapi::ApiDoc;

/// Request body limit when none is configured (two 10 MiB images, base64).
pub const DEFAULT_BODY_LIMIT: usize = 30 * 1024 * 1024 + 64 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Attachment (blob) store.
    pub attachments: Arc<dyn AttachmentStore>,
    /// Scheme used by `attachments`; resolves keys served under `/v1/attachments`.
    pub attachment_scheme: LocatorScheme,
    /// Record store.
    pub records: Arc<dyn RecordStore>,
    /// Per-session report workflows.
    pub sessions: Arc<SessionRegistry>,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
}

impl AppState {
    /// Build the state from the two stores.
    pub fn new(
        attachments: Arc<dyn AttachmentStore>,
        attachment_scheme: LocatorScheme,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new(
            Arc::clone(&attachments),
            Arc::clone(&records),
        ));
        Self {
            attachments,
            attachment_scheme,
            records,
            sessions,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Set the maximum request body size.
    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit;

    Router::new()
        .route("/health", get(health::health))
        // Attachments
        .route("/v1/attachments", axum::routing::post(attachments::upload))
        .route("/v1/attachments/{*key}", get(attachments::download))
        // Records
        .route(
            "/v1/records",
            get(records::list_records).post(records::create_record),
        )
        // Reports (upload + persist workflow)
        .route(
            "/v1/reports",
            get(reports::list_reports).post(reports::submit_report),
        )
        .route("/v1/reports/session", get(reports::session_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
