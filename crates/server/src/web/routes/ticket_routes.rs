use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use ticketry_common::events;

use crate::db::models::{Ticket, TicketInput};
use crate::db::services::ticket_service::{self, TicketFilter};
use crate::web::{AppError, AppState, DataBody};

#[derive(Debug, Default, Deserialize)]
pub struct ListTicketsQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, alias = "CI_Name", alias = "ciName")]
    pub ci_name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default, alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(default, alias = "sortDir")]
    pub sort_dir: Option<String>,
}

#[derive(Serialize)]
struct Paging {
    total: i64,
    limit: i64,
    offset: i64,
}

#[derive(Serialize)]
struct TicketListResponse {
    data: Vec<Ticket>,
    paging: Paging,
}

#[derive(Serialize)]
struct UpdateOutcome {
    before: Ticket,
    after: Ticket,
}

async fn list_tickets_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Json<TicketListResponse>, AppError> {
    let filter = TicketFilter {
        status: query.status,
        priority: query.priority,
        ci_name: query.ci_name,
        limit: query.limit.unwrap_or(10).clamp(0, 100),
        offset: query.offset.unwrap_or(0).max(0),
        sort_by: query.sort_by.unwrap_or_else(|| "id".to_string()),
        sort_dir: query
            .sort_dir
            .unwrap_or_else(|| "asc".to_string())
            .to_lowercase(),
    };

    let page = ticket_service::list_tickets(&app_state.pool, &filter).await?;

    Ok(Json(TicketListResponse {
        data: page.rows,
        paging: Paging {
            total: page.total,
            limit: filter.limit,
            offset: filter.offset,
        },
    }))
}

async fn get_ticket_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DataBody<Ticket>>, AppError> {
    let ticket = ticket_service::get_ticket_by_id(&app_state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;
    Ok(Json(DataBody { data: ticket }))
}

async fn create_ticket_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<TicketInput>,
) -> Result<(StatusCode, Json<DataBody<Ticket>>), AppError> {
    let created = ticket_service::create_ticket(&app_state.pool, &payload).await?;

    app_state
        .dispatcher
        .dispatch_detached(events::TICKET_CREATED, serde_json::to_value(&created)?);

    Ok((StatusCode::CREATED, Json(DataBody { data: created })))
}

async fn patch_ticket_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<TicketInput>,
) -> Result<Json<DataBody<UpdateOutcome>>, AppError> {
    let before = ticket_service::get_ticket_by_id(&app_state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    let after = ticket_service::update_ticket(&app_state.pool, id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    app_state.dispatcher.dispatch_detached(
        events::TICKET_UPDATED,
        serde_json::json!({ "before": before, "after": after }),
    );

    Ok(Json(DataBody {
        data: UpdateOutcome { before, after },
    }))
}

async fn delete_ticket_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DataBody<Ticket>>, AppError> {
    let deleted = ticket_service::delete_ticket(&app_state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    app_state
        .dispatcher
        .dispatch_detached(events::TICKET_DELETED, serde_json::to_value(&deleted)?);

    Ok(Json(DataBody { data: deleted }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tickets_handler).post(create_ticket_handler))
        .route(
            "/{id}",
            get(get_ticket_handler)
                .patch(patch_ticket_handler)
                .delete(delete_ticket_handler),
        )
}
