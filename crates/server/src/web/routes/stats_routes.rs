use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::db::services::stats_service::{self, TicketStats};
use crate::web::{AppError, AppState, DataBody};

async fn ticket_stats_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<DataBody<TicketStats>>, AppError> {
    let stats = stats_service::ticket_stats(&app_state.pool).await?;
    Ok(Json(DataBody { data: stats }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/tickets", get(ticket_stats_handler))
}
