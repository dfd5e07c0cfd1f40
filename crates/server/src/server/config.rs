use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,

    /// Path to the SQLite database file. The parent directory is created
    /// on startup if it does not exist.
    pub db_file: String,

    /// Shared secret attached to outbound webhook deliveries as the
    /// `x-webhook-secret` header. No header is sent when unset.
    pub webhook_secret: Option<String>,

    /// Per-request timeout for webhook deliveries, in seconds.
    pub webhook_timeout_secs: u64,

    /// CSV file used to seed the tickets table when it is empty.
    pub csv_path: Option<String>,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    port: Option<u16>,
    db_file: Option<String>,
    webhook_secret: Option<String>,
    webhook_timeout_secs: Option<u64>,
    csv_path: Option<String>,
}

fn default_db_file() -> String {
    "data/app.db".to_string()
}

impl ServerConfig {
    /// Loads configuration from an optional TOML file, then applies
    /// environment-variable overrides (`PORT`, `DB_FILE`, `WEBHOOK_SECRET`,
    /// `WEBHOOK_TIMEOUT_SECS`, `CSV_PATH`). Environment wins over file.
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialServerConfig::default()
            }
        } else {
            PartialServerConfig::default()
        };

        // 2. Environment overrides
        let env_port = match env::var("PORT") {
            Ok(raw) => Some(
                raw.parse::<u16>()
                    .map_err(|e| format!("PORT must be a port number: {e}"))?,
            ),
            Err(_) => None,
        };
        let env_timeout = match env::var("WEBHOOK_TIMEOUT_SECS") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|e| format!("WEBHOOK_TIMEOUT_SECS must be an integer: {e}"))?,
            ),
            Err(_) => None,
        };

        // 3. Merge: environment overrides file, then defaults
        let final_config = ServerConfig {
            port: env_port.or(file_config.port).unwrap_or(3000),
            db_file: env::var("DB_FILE")
                .ok()
                .or(file_config.db_file)
                .unwrap_or_else(default_db_file),
            // An empty secret means "no secret": no header is attached.
            webhook_secret: env::var("WEBHOOK_SECRET")
                .ok()
                .or(file_config.webhook_secret)
                .filter(|s| !s.is_empty()),
            webhook_timeout_secs: env_timeout.or(file_config.webhook_timeout_secs).unwrap_or(10),
            csv_path: env::var("CSV_PATH").ok().or(file_config.csv_path),
        };

        Ok(final_config)
    }
}
