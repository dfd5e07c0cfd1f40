//! Seeds the tickets table from a CSV export.
//!
//! Header-driven: columns are located by name, accepting both the dataset
//! spelling (`CI_Name`) and snake_case (`ci_name`). Rows without an
//! `Open_Time` are skipped. Runs only against an empty table; the caller
//! checks.

use chrono::Utc;
use sqlx::SqlitePool;
use std::path::Path;

use crate::db::services::ticket_service::{DEFAULT_PRIORITY, DEFAULT_STATUS};
use crate::web::error::AppError;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

pub async fn import_tickets_from_csv(
    pool: &SqlitePool,
    path: &Path,
) -> Result<ImportReport, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::InternalServerError(format!("Failed to read CSV file {path:?}: {e}"))
    })?;
    import_tickets(pool, &content).await
}

pub async fn import_tickets(pool: &SqlitePool, content: &str) -> Result<ImportReport, AppError> {
    let mut lines = content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Ok(ImportReport::default());
    };
    let headers = split_fields(header_line);

    let columns = ColumnMap {
        ci_name: resolve(&headers, &["CI_Name", "ci_name"]),
        ci_cat: resolve(&headers, &["CI_Cat", "ci_cat"]),
        status: resolve(&headers, &["Status", "status"]),
        priority: resolve(&headers, &["Priority", "priority"]),
        open_time: resolve(&headers, &["Open_Time", "open_time"]),
        close_time: resolve(&headers, &["Close_Time", "close_time"]),
    };

    let mut report = ImportReport::default();
    for line in lines {
        let fields = split_fields(line);
        let cell = |index: Option<usize>| -> Option<&str> {
            index.and_then(|i| fields.get(i)).map(String::as_str)
        };

        let Some(open_time) = cell(columns.open_time).filter(|t| !t.is_empty()) else {
            report.skipped += 1;
            continue;
        };

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO tickets \
             (CI_Name, CI_Cat, Status, Priority, Open_Time, Close_Time, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(cell(columns.ci_name).unwrap_or(""))
        .bind(cell(columns.ci_cat).unwrap_or(""))
        .bind(cell(columns.status).filter(|s| !s.is_empty()).unwrap_or(DEFAULT_STATUS))
        .bind(
            cell(columns.priority)
                .filter(|p| !p.is_empty())
                .unwrap_or(DEFAULT_PRIORITY),
        )
        .bind(open_time)
        .bind(cell(columns.close_time))
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        report.imported += 1;
    }

    Ok(report)
}

struct ColumnMap {
    ci_name: Option<usize>,
    ci_cat: Option<usize>,
    status: Option<usize>,
    priority: Option<usize>,
    open_time: Option<usize>,
    close_time: Option<usize>,
}

fn resolve(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.iter().any(|name| header == name))
}

/// Splits one CSV line into fields, respecting quoted values; a doubled
/// quote inside a quoted field is an escaped quote.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::ticket_service::{get_ticket_by_id, list_tickets, TicketFilter};
    use crate::db::test_pool;

    #[test]
    fn split_fields_respects_quotes() {
        assert_eq!(split_fields("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(
            split_fields(r#"plain,"with, comma","escaped "" quote""#),
            vec!["plain", "with, comma", "escaped \" quote"]
        );
        assert_eq!(split_fields("trailing,"), vec!["trailing", ""]);
    }

    #[tokio::test]
    async fn imports_rows_with_dataset_headers() {
        let pool = test_pool().await;
        let csv = "CI_Name,CI_Cat,Status,Priority,Open_Time,Close_Time\n\
                   switch-1,networking,Closed,2,2024-01-01 08:00:00,2024-01-02 09:00:00\n\
                   db-7,storage,,,2024-01-03 10:00:00,\n";

        let report = import_tickets(&pool, csv).await.unwrap();
        assert_eq!(
            report,
            ImportReport {
                imported: 2,
                skipped: 0
            }
        );

        let first = get_ticket_by_id(&pool, 1).await.unwrap().unwrap();
        assert_eq!(first.ci_name, "switch-1");
        assert_eq!(first.status, "Closed");

        // Empty cells fall back to the creation defaults.
        let second = get_ticket_by_id(&pool, 2).await.unwrap().unwrap();
        assert_eq!(second.status, DEFAULT_STATUS);
        assert_eq!(second.priority, DEFAULT_PRIORITY);
    }

    #[tokio::test]
    async fn accepts_snake_case_headers() {
        let pool = test_pool().await;
        let csv = "ci_name,open_time\nrouter-3,2024-02-01 12:00:00\n";

        let report = import_tickets(&pool, csv).await.unwrap();
        assert_eq!(report.imported, 1);

        let ticket = get_ticket_by_id(&pool, 1).await.unwrap().unwrap();
        assert_eq!(ticket.ci_name, "router-3");
    }

    #[tokio::test]
    async fn rows_without_open_time_are_skipped() {
        let pool = test_pool().await;
        let csv = "CI_Name,Open_Time\nkept,2024-01-01 08:00:00\ndropped,\n";

        let report = import_tickets(&pool, csv).await.unwrap();
        assert_eq!(
            report,
            ImportReport {
                imported: 1,
                skipped: 1
            }
        );

        let filter = TicketFilter {
            limit: 10,
            sort_by: "id".to_string(),
            sort_dir: "asc".to_string(),
            ..TicketFilter::default()
        };
        let page = list_tickets(&pool, &filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0].ci_name, "kept");
    }
}
