use std::time::Duration;

use futures::future;
use reqwest::{header, Client};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, warn};

use ticketry_common::{WebhookEnvelope, WEBHOOK_SECRET_HEADER};

use crate::db::models::WebhookSubscription;
use crate::db::services::subscription_service;
use crate::webhooks::filter;

/// Outcome of one dispatch call. `attempted` counts the interested
/// subscriptions, `delivered` those that answered 2xx.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub attempted: usize,
}

/// Fans a ticket lifecycle event out to every interested subscription.
///
/// Cheap to clone; the inner `reqwest::Client` is shared. Deliveries are
/// single best-effort attempts with a per-request timeout: no retry, no
/// ordering across subscribers.
#[derive(Clone)]
pub struct WebhookDispatcher {
    pool: SqlitePool,
    client: Client,
    secret: Option<String>,
}

impl WebhookDispatcher {
    pub fn new(
        pool: SqlitePool,
        secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            pool,
            client,
            secret,
        })
    }

    /// Notifies all subscriptions interested in `event`, once, best-effort.
    ///
    /// Never returns an error: a missing store, a malformed row or a failed
    /// delivery degrades to a lower count. With no interested subscription
    /// this returns `{0, 0}` without touching the network.
    pub async fn dispatch(&self, event: &str, payload: Value) -> DispatchSummary {
        let subscriptions = match subscription_service::list_subscriptions(&self.pool).await {
            Ok(subscriptions) => subscriptions,
            Err(err) => {
                warn!(event, error = %err, "webhook dispatch skipped, subscription store unavailable");
                return DispatchSummary::default();
            }
        };

        let targets = filter::select_interested(&subscriptions, event);
        let attempted = targets.len();
        if attempted == 0 {
            return DispatchSummary::default();
        }

        let envelope = WebhookEnvelope::new(event, payload);
        let outcomes = future::join_all(
            targets
                .iter()
                .map(|target| self.deliver_one(target, &envelope)),
        )
        .await;
        let delivered = outcomes.into_iter().filter(|delivered| *delivered).count();

        DispatchSummary {
            delivered,
            attempted,
        }
    }

    /// Hands a dispatch off to a background task and returns immediately.
    /// Mutation handlers use this so notification can never delay or fail
    /// the primary operation; the summary is only logged.
    pub fn dispatch_detached(&self, event: &'static str, payload: Value) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let summary = dispatcher.dispatch(event, payload).await;
            if summary.attempted > 0 {
                info!(
                    event,
                    delivered = summary.delivered,
                    attempted = summary.attempted,
                    "webhook dispatch finished"
                );
            }
        });
    }

    async fn deliver_one(&self, target: &WebhookSubscription, envelope: &WebhookEnvelope) -> bool {
        let mut request = self
            .client
            .post(&target.url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(envelope);
        if let Some(secret) = &self.secret {
            request = request.header(WEBHOOK_SECRET_HEADER, secret);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    subscription_id = target.id,
                    url = %target.url,
                    status = %response.status(),
                    "webhook delivery rejected"
                );
                false
            }
            Err(err) => {
                warn!(
                    subscription_id = target.id,
                    url = %target.url,
                    error = %err,
                    "webhook delivery failed"
                );
                false
            }
        }
    }
}
