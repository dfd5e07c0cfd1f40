//! Demo webhook subscriber: accepts ticket lifecycle deliveries from the
//! main server, validates the shared secret and logs the payload.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dotenv::dotenv;
use serde_json::{json, Value};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ticketry_common::{events, WEBHOOK_SECRET_HEADER};

#[derive(Clone)]
struct ReceiverState {
    /// Expected shared secret; unset means deliveries are accepted as-is.
    secret: Option<String>,
}

async fn receive_webhook_handler(
    State(state): State<Arc<ReceiverState>>,
    headers: HeaderMap,
    Json(envelope): Json<Value>,
) -> Response {
    if let Some(expected) = &state.secret {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!("Rejected webhook delivery with missing or wrong secret");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid webhook secret" })),
            )
                .into_response();
        }
    }

    // Updates carry a before/after pair worth logging separately.
    if envelope["event"] == events::TICKET_UPDATED
        && envelope["data"]["before"].is_object()
        && envelope["data"]["after"].is_object()
    {
        info!(
            before = %envelope["data"]["before"],
            after = %envelope["data"]["after"],
            "Webhook received: ticket.updated"
        );
    } else {
        info!(body = %envelope, "Webhook received");
    }

    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

async fn health_check_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn app(secret: Option<String>) -> Router {
    Router::new()
        .route("/webhooks", post(receive_webhook_handler))
        .route("/health", get(health_check_handler))
        .with_state(Arc::new(ReceiverState { secret }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    dotenv().ok();

    let port = env::var("RECEIVER_PORT")
        .or_else(|_| env::var("PORT"))
        .ok()
        .map(|raw| raw.parse::<u16>())
        .transpose()
        .map_err(|e| format!("RECEIVER_PORT must be a port number: {e}"))?
        .unwrap_or(4001);
    let secret = env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

    if secret.is_none() {
        info!("No WEBHOOK_SECRET configured, accepting all deliveries");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Receiver listening on {}", addr);

    axum::serve(listener, app(secret))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install SIGINT handler");
            info!("Shutting down...");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn delivery_request(secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhooks")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header(WEBHOOK_SECRET_HEADER, secret);
        }
        builder
            .body(Body::from(
                json!({ "event": "ticket.created", "data": { "id": 1 }, "sent_at": "2024-01-01T00:00:00Z" })
                    .to_string(),
            ))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn rejects_wrong_or_missing_secret_when_configured() {
        let app = app(Some("s3cret".to_string()));

        let response = app
            .clone()
            .oneshot(delivery_request(Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(delivery_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Invalid webhook secret" })
        );
    }

    #[tokio::test]
    async fn acknowledges_valid_deliveries() {
        let app = app(Some("s3cret".to_string()));

        let response = app
            .oneshot(delivery_request(Some("s3cret")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "received": true }));
    }

    #[tokio::test]
    async fn accepts_anything_without_configured_secret() {
        let app = app(None);

        let response = app.oneshot(delivery_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app(None);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));
    }
}
