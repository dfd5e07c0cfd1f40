use chrono::Utc;
use sqlx::SqlitePool;
use url::Url;

use crate::db::models::WebhookSubscription;
use crate::web::error::AppError;

const SUBSCRIPTION_COLUMNS: &str = "id, url, events, created_at";

/// All subscriptions, most recently created first.
pub async fn list_subscriptions(
    pool: &SqlitePool,
) -> Result<Vec<WebhookSubscription>, AppError> {
    let rows = sqlx::query_as::<_, WebhookSubscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM webhook_subscriptions ORDER BY id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_subscription_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<WebhookSubscription>, AppError> {
    let row = sqlx::query_as::<_, WebhookSubscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM webhook_subscriptions WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

fn is_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Validates and persists a subscription. The `events` list keeps its
/// order and duplicates; entries that are empty after trimming are dropped,
/// and an empty surviving list is rejected.
pub async fn create_subscription(
    pool: &SqlitePool,
    url: &str,
    events: &[String],
) -> Result<WebhookSubscription, AppError> {
    if !is_http_url(url) {
        return Err(AppError::InvalidInput("Valid 'url' is required".to_string()));
    }

    let normalized: Vec<String> = events
        .iter()
        .filter(|e| !e.trim().is_empty())
        .cloned()
        .collect();
    if normalized.is_empty() {
        return Err(AppError::InvalidInput(
            "Valid 'events' array is required".to_string(),
        ));
    }

    let events_json = serde_json::to_string(&normalized)?;
    let result = sqlx::query(
        "INSERT INTO webhook_subscriptions (url, events, created_at) VALUES (?, ?, ?)",
    )
    .bind(url)
    .bind(events_json)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    get_subscription_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| {
            AppError::InternalServerError("Created subscription vanished".to_string())
        })
}

/// Deletes a subscription, returning the deleted snapshot, or `None` when
/// no such id exists (the store is left untouched).
pub async fn delete_subscription(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<WebhookSubscription>, AppError> {
    let Some(existing) = get_subscription_by_id(pool, id).await? else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM webhook_subscriptions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(Some(existing))
}
