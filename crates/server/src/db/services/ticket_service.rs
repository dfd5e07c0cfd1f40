use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::models::{Ticket, TicketInput};
use crate::web::error::AppError;

const TICKET_COLUMNS: &str =
    "id, CI_Name, CI_Cat, Status, Priority, Open_Time, Close_Time, created_at, updated_at";

/// Columns accepted for `sort_by`; anything else falls back to `id`.
const SORTABLE_COLUMNS: &[&str] = &[
    "id",
    "CI_Name",
    "CI_Cat",
    "Status",
    "Priority",
    "Open_Time",
    "Close_Time",
    "created_at",
    "updated_at",
];

pub const DEFAULT_STATUS: &str = "Work In Progress";
pub const DEFAULT_PRIORITY: &str = "1";

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Substring match against `CI_Name`.
    pub ci_name: Option<String>,
    pub limit: i64,
    pub offset: i64,
    pub sort_by: String,
    /// `asc` sorts ascending; any other value sorts descending.
    pub sort_dir: String,
}

#[derive(Debug)]
pub struct TicketPage {
    pub total: i64,
    pub rows: Vec<Ticket>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &TicketFilter) {
    let mut prefix = " WHERE ";
    if let Some(status) = &filter.status {
        qb.push(prefix).push("Status = ").push_bind(status.clone());
        prefix = " AND ";
    }
    if let Some(priority) = &filter.priority {
        qb.push(prefix).push("Priority = ").push_bind(priority.clone());
        prefix = " AND ";
    }
    if let Some(ci_name) = &filter.ci_name {
        qb.push(prefix)
            .push("CI_Name LIKE ")
            .push_bind(format!("%{ci_name}%"));
    }
}

pub async fn list_tickets(
    pool: &SqlitePool,
    filter: &TicketFilter,
) -> Result<TicketPage, AppError> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tickets");
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let sort_by = SORTABLE_COLUMNS
        .iter()
        .find(|col| **col == filter.sort_by)
        .copied()
        .unwrap_or("id");
    let sort_dir = if filter.sort_dir.eq_ignore_ascii_case("asc") {
        "ASC"
    } else {
        "DESC"
    };

    let mut qb =
        QueryBuilder::<Sqlite>::new(format!("SELECT {TICKET_COLUMNS} FROM tickets"));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY ").push(sort_by).push(" ").push(sort_dir);
    qb.push(" LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    let rows = qb.build_query_as::<Ticket>().fetch_all(pool).await?;

    Ok(TicketPage { total, rows })
}

pub async fn get_ticket_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Ticket>, AppError> {
    let row = sqlx::query_as::<_, Ticket>(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create_ticket(pool: &SqlitePool, input: &TicketInput) -> Result<Ticket, AppError> {
    let open_time = input
        .open_time
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Open_Time is required".to_string()))?;

    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO tickets \
         (CI_Name, CI_Cat, Status, Priority, Open_Time, Close_Time, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(input.ci_name.clone().unwrap_or_default())
    .bind(input.ci_cat.clone().unwrap_or_default())
    .bind(
        input
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
    )
    .bind(
        input
            .priority
            .clone()
            .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
    )
    .bind(open_time)
    .bind(input.close_time.clone().flatten())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    get_ticket_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Created ticket vanished".to_string()))
}

/// Applies only the fields present in `patch`; an empty patch returns the
/// current row untouched.
pub async fn update_ticket(
    pool: &SqlitePool,
    id: i64,
    patch: &TicketInput,
) -> Result<Option<Ticket>, AppError> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE tickets SET ");
    let mut changed = false;
    {
        let mut sets = qb.separated(", ");
        if let Some(ci_name) = &patch.ci_name {
            sets.push("CI_Name = ").push_bind_unseparated(ci_name.clone());
            changed = true;
        }
        if let Some(ci_cat) = &patch.ci_cat {
            sets.push("CI_Cat = ").push_bind_unseparated(ci_cat.clone());
            changed = true;
        }
        if let Some(status) = &patch.status {
            sets.push("Status = ").push_bind_unseparated(status.clone());
            changed = true;
        }
        if let Some(priority) = &patch.priority {
            sets.push("Priority = ").push_bind_unseparated(priority.clone());
            changed = true;
        }
        if let Some(open_time) = &patch.open_time {
            sets.push("Open_Time = ").push_bind_unseparated(open_time.clone());
            changed = true;
        }
        if let Some(close_time) = &patch.close_time {
            sets.push("Close_Time = ").push_bind_unseparated(close_time.clone());
            changed = true;
        }
        if changed {
            sets.push("updated_at = ").push_bind_unseparated(Utc::now());
        }
    }

    if !changed {
        return get_ticket_by_id(pool, id).await;
    }

    qb.push(" WHERE id = ").push_bind(id);
    qb.build().execute(pool).await?;

    get_ticket_by_id(pool, id).await
}

pub async fn delete_ticket(pool: &SqlitePool, id: i64) -> Result<Option<Ticket>, AppError> {
    let Some(existing) = get_ticket_by_id(pool, id).await? else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM tickets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(Some(existing))
}
