use axum::{
    http::StatusCode,
    response::IntoResponse,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::webhooks::WebhookDispatcher;

pub mod error;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub dispatcher: WebhookDispatcher,
}

/// Standard success wrapper: every endpoint answers `{"data": ...}`.
#[derive(Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/health", routes::health_routes::router())
        .nest("/tickets", routes::ticket_routes::router())
        .nest("/stats", routes::stats_routes::router())
        .nest("/webhooks", routes::webhook_routes::router())
        .fallback(not_found_handler)
        .with_state(Arc::new(state))
        .layer(cors)
}

async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Route not found" })),
    )
}
