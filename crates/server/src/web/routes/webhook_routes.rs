use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::models::WebhookSubscription;
use crate::db::services::subscription_service;
use crate::web::{AppError, AppState, DataBody};
use crate::webhooks::filter::parse_events;

#[derive(Deserialize)]
pub struct CreateSubscriptionRequest {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    events: Option<Vec<String>>,
}

/// Subscription as the API renders it: `events` deserialized to an array.
/// A row whose stored list no longer parses renders as `[]`.
#[derive(Serialize)]
struct SubscriptionView {
    id: i64,
    url: String,
    events: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<WebhookSubscription> for SubscriptionView {
    fn from(sub: WebhookSubscription) -> Self {
        let events = parse_events(&sub.events);
        Self {
            id: sub.id,
            url: sub.url,
            events,
            created_at: sub.created_at,
        }
    }
}

async fn list_subscriptions_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<DataBody<Vec<SubscriptionView>>>, AppError> {
    let subscriptions = subscription_service::list_subscriptions(&app_state.pool).await?;
    Ok(Json(DataBody {
        data: subscriptions.into_iter().map(SubscriptionView::from).collect(),
    }))
}

async fn create_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<DataBody<SubscriptionView>>), AppError> {
    let url = payload.url.unwrap_or_default();
    let events = payload.events.unwrap_or_default();

    let created =
        subscription_service::create_subscription(&app_state.pool, &url, &events).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataBody {
            data: created.into(),
        }),
    ))
}

async fn delete_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DataBody<SubscriptionView>>, AppError> {
    let deleted = subscription_service::delete_subscription(&app_state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

    Ok(Json(DataBody {
        data: deleted.into(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/subscriptions",
            get(list_subscriptions_handler).post(create_subscription_handler),
        )
        .route("/subscriptions/{id}", delete(delete_subscription_handler))
}
