//! Wire types shared between the ticketry server and the webhook receiver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header carrying the shared webhook secret, attached to every outbound
/// delivery when a secret is configured.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Ticket lifecycle event names, as stored in subscription interest lists.
pub mod events {
    pub const TICKET_CREATED: &str = "ticket.created";
    pub const TICKET_UPDATED: &str = "ticket.updated";
    pub const TICKET_DELETED: &str = "ticket.deleted";
}

/// Body POSTed to every interested subscriber on a ticket lifecycle event.
///
/// `sent_at` is assigned at dispatch time and serializes as RFC3339; it is
/// not persisted anywhere on the sending side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub data: Value,
    pub sent_at: DateTime<Utc>,
}

impl WebhookEnvelope {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            sent_at: Utc::now(),
        }
    }
}
