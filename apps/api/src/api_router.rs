use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::form_handler))
        .route("/health", get(handlers::health_handler))
        .route("/lock-batches", post(handlers::lock_batch_page_handler))
        .route("/api/lock-batches", post(handlers::lock_batch_handler))
        .route(
            "/api/lock-batches/report.csv",
            post(handlers::lock_batch_report_handler),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
