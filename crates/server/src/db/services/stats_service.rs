use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::web::error::AppError;

#[derive(Debug, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PriorityCount {
    pub priority: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Totals {
    pub total: i64,
    pub open: i64,
    pub closed: i64,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentTicket {
    pub id: i64,
    #[sqlx(rename = "CI_Name")]
    pub ci_name: String,
    #[sqlx(rename = "Status")]
    pub status: String,
    #[sqlx(rename = "Priority")]
    pub priority: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RecentWindow {
    pub count: i64,
    pub tickets: Vec<RecentTicket>,
}

#[derive(Debug, Serialize)]
pub struct TicketStats {
    pub totals: Totals,
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,
    pub recent_7_days: RecentWindow,
}

/// Aggregate view over the tickets table. A ticket is open while its
/// `Close_Time` is NULL or empty.
pub async fn ticket_stats(pool: &SqlitePool) -> Result<TicketStats, AppError> {
    let by_status = sqlx::query_as::<_, StatusCount>(
        "SELECT Status AS status, COUNT(*) AS count FROM tickets \
         GROUP BY Status ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;

    let by_priority = sqlx::query_as::<_, PriorityCount>(
        "SELECT Priority AS priority, COUNT(*) AS count FROM tickets \
         GROUP BY Priority ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;

    let totals = sqlx::query_as::<_, Totals>(
        "SELECT \
           COUNT(*) AS total, \
           COALESCE(SUM(CASE WHEN NULLIF(Close_Time, '') IS NULL THEN 1 ELSE 0 END), 0) AS open, \
           COALESCE(SUM(CASE WHEN NULLIF(Close_Time, '') IS NOT NULL THEN 1 ELSE 0 END), 0) AS closed \
         FROM tickets",
    )
    .fetch_one(pool)
    .await?;

    let recent_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tickets \
         WHERE datetime(created_at) >= datetime('now', '-7 days')",
    )
    .fetch_one(pool)
    .await?;

    let recent_tickets = sqlx::query_as::<_, RecentTicket>(
        "SELECT id, CI_Name, Status, Priority, created_at FROM tickets \
         WHERE datetime(created_at) >= datetime('now', '-7 days') \
         ORDER BY datetime(created_at) DESC LIMIT 20",
    )
    .fetch_all(pool)
    .await?;

    Ok(TicketStats {
        totals,
        by_status,
        by_priority,
        recent_7_days: RecentWindow {
            count: recent_count,
            tickets: recent_tickets,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::TicketInput;
    use crate::db::services::ticket_service::create_ticket;
    use crate::db::test_pool;

    async fn seed(pool: &SqlitePool, status: &str, close_time: Option<&str>) {
        create_ticket(
            pool,
            &TicketInput {
                status: Some(status.to_string()),
                close_time: Some(close_time.map(|t| t.to_string())),
                open_time: Some("2024-01-01 08:00:00".to_string()),
                ..TicketInput::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn totals_treat_empty_close_time_as_open() {
        let pool = test_pool().await;
        seed(&pool, "Work In Progress", None).await;
        seed(&pool, "Work In Progress", Some("")).await;
        seed(&pool, "Closed", Some("2024-01-02 09:00:00")).await;

        let stats = ticket_stats(&pool).await.unwrap();

        assert_eq!(stats.totals.total, 3);
        assert_eq!(stats.totals.open, 2);
        assert_eq!(stats.totals.closed, 1);
    }

    #[tokio::test]
    async fn grouping_counts_by_status_and_priority() {
        let pool = test_pool().await;
        seed(&pool, "Closed", Some("2024-01-02 09:00:00")).await;
        seed(&pool, "Closed", Some("2024-01-03 09:00:00")).await;
        seed(&pool, "Work In Progress", None).await;

        let stats = ticket_stats(&pool).await.unwrap();

        assert_eq!(stats.by_status[0].status, "Closed");
        assert_eq!(stats.by_status[0].count, 2);
        assert_eq!(stats.by_priority[0].priority, "1");
        assert_eq!(stats.by_priority[0].count, 3);
    }

    #[tokio::test]
    async fn recent_window_counts_fresh_rows() {
        let pool = test_pool().await;
        seed(&pool, "Work In Progress", None).await;

        let stats = ticket_stats(&pool).await.unwrap();

        // created_at is assigned at insert time, so the row is recent.
        assert_eq!(stats.recent_7_days.count, 1);
        assert_eq!(stats.recent_7_days.tickets.len(), 1);
    }

    #[tokio::test]
    async fn empty_table_yields_zero_totals() {
        let pool = test_pool().await;

        let stats = ticket_stats(&pool).await.unwrap();

        assert_eq!(stats.totals.total, 0);
        assert_eq!(stats.totals.open, 0);
        assert!(stats.by_status.is_empty());
    }
}
