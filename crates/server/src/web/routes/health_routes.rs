use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::web::AppState;

/// Liveness probe: reports whether the database answers a trivial query.
/// Always responds 200; `db` carries the verdict.
async fn health_check_handler(State(app_state): State<Arc<AppState>>) -> Json<Value> {
    let db_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&app_state.pool)
        .await
        .map(|v| v == 1)
        .unwrap_or(false);

    Json(json!({
        "status": "ok",
        "db": db_ok,
        "time": Utc::now(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(health_check_handler))
}
