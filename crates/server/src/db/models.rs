use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A ticket row. Column and JSON field spellings follow the imported CSV
/// dataset (`CI_Name`, `Open_Time`, ...), which the API exposes verbatim.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    #[serde(rename = "CI_Name")]
    #[sqlx(rename = "CI_Name")]
    pub ci_name: String,
    #[serde(rename = "CI_Cat")]
    #[sqlx(rename = "CI_Cat")]
    pub ci_cat: String,
    #[serde(rename = "Status")]
    #[sqlx(rename = "Status")]
    pub status: String,
    #[serde(rename = "Priority")]
    #[sqlx(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Open_Time")]
    #[sqlx(rename = "Open_Time")]
    pub open_time: String,
    #[serde(rename = "Close_Time")]
    #[sqlx(rename = "Close_Time")]
    pub close_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ticket fields accepted on create and patch. Every field is optional;
/// create fills in defaults, patch only touches what is present. Each field
/// accepts the dataset spelling, snake_case and camelCase.
///
/// `close_time` is doubly optional so a patch can distinguish "leave
/// unchanged" (absent) from "clear the close time" (explicit null).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketInput {
    #[serde(default, alias = "CI_Name", alias = "ciName")]
    pub ci_name: Option<String>,
    #[serde(default, alias = "CI_Cat", alias = "ciCat")]
    pub ci_cat: Option<String>,
    #[serde(default, alias = "Status")]
    pub status: Option<String>,
    #[serde(default, alias = "Priority")]
    pub priority: Option<String>,
    #[serde(default, alias = "Open_Time", alias = "openTime")]
    pub open_time: Option<String>,
    #[serde(default, alias = "Close_Time", alias = "closeTime")]
    pub close_time: Option<Option<String>>,
}

/// A webhook subscription row. `events` holds the raw serialized JSON
/// array; deserialization happens at the API and filter boundaries
/// (see `webhooks::filter`).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WebhookSubscription {
    pub id: i64,
    pub url: String,
    pub events: String,
    pub created_at: DateTime<Utc>,
}
