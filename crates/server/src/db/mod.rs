use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;

pub mod models;
pub mod services;

static SCHEMA_SQL: &str = include_str!("schema.sql");

/// Opens (creating if missing) the SQLite database at `db_file`.
pub async fn connect(db_file: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_file)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
}

/// Applies the embedded schema. Statements are idempotent, so this runs on
/// every startup.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    // A pool of one: each in-memory SQLite connection is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    migrate(&pool).await.expect("failed to apply schema");
    pool
}
