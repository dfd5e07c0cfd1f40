use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ticketry_server::db;
use ticketry_server::server::config::ServerConfig;
use ticketry_server::services::csv_import;
use ticketry_server::web::{self, AppState};
use ticketry_server::webhooks::WebhookDispatcher;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Path to a ticket CSV used to seed an empty database
    #[arg(long)]
    csv: Option<String>,
}

fn init_logging() {
    // Log to a file: daily rotation, no colors
    let file_appender = rolling::daily("logs", "server.log");
    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    init_logging();
    dotenv().ok();

    let mut config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load server configuration: {}", e);
            return Err(e.into());
        }
    };
    if args.csv.is_some() {
        config.csv_path = args.csv;
    }

    // A database can only be created from seed data; refuse to start with
    // neither an existing file nor a CSV to build one from.
    let db_exists = Path::new(&config.db_file).exists();
    if !db_exists && config.csv_path.is_none() {
        error!(
            db_file = %config.db_file,
            "Database file not found and no CSV provided. \
             Pass --csv <path> or set CSV_PATH to create it."
        );
        return Err("missing database and seed CSV".into());
    }

    let pool = db::connect(&config.db_file).await?;
    db::migrate(&pool).await?;
    info!(db_file = %config.db_file, "Database ready");

    if let Some(csv_path) = &config.csv_path {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets")
            .fetch_one(&pool)
            .await?;
        if count == 0 {
            info!(path = %csv_path, "Tickets table empty, importing CSV");
            let report =
                csv_import::import_tickets_from_csv(&pool, Path::new(csv_path)).await?;
            info!(
                imported = report.imported,
                skipped = report.skipped,
                "CSV import done"
            );
        } else {
            info!(count, "Tickets table already populated, skipping CSV import");
        }
    }

    let dispatcher = WebhookDispatcher::new(
        pool.clone(),
        config.webhook_secret.clone(),
        Duration::from_secs(config.webhook_timeout_secs),
    )?;

    let app = web::create_router(AppState { pool, dispatcher });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Main server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down...");
}
