use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::db::DbConfig;

/// Which record store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl StoreBackend {
    fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => bail!("unknown SITEVISIT_STORE '{other}': expected 'memory' or 'postgres'"),
        }
    }
}

/// Credentials for appending through the Sheets v4 API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsApiConfig {
    pub api_key: String,
    pub spreadsheet_id: String,
    pub range: String,
}

/// Spreadsheet export settings.
///
/// The Apps Script web app wins when both targets are set; with neither,
/// export is disabled.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub webhook_url: Option<String>,
    pub api: Option<SheetsApiConfig>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub dev_mode: bool,
    pub store: StoreBackend,
    pub issue_retries: u32,
    pub sheets: SheetsConfig,
    pub database: DbConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let set = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let listen_addr: SocketAddr = parse_or(
            &set,
            "SITEVISIT_LISTEN_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 8080)),
        )?;
        let log_level = set("SITEVISIT_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let dev_mode = set("SITEVISIT_DEV")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let store = match set("SITEVISIT_STORE") {
            Some(v) => StoreBackend::parse(&v)?,
            None => StoreBackend::Memory,
        };

        let issue_retries = parse_or(&set, "SITEVISIT_ISSUE_RETRIES", 3)?;

        let api = match (
            set("SITEVISIT_SHEETS_API_KEY"),
            set("SITEVISIT_SHEETS_SPREADSHEET_ID"),
        ) {
            (Some(api_key), Some(spreadsheet_id)) => Some(SheetsApiConfig {
                api_key,
                spreadsheet_id,
                range: set("SITEVISIT_SHEETS_RANGE").unwrap_or_else(|| "Sheet1!A:T".to_string()),
            }),
            (None, None) => None,
            _ => bail!(
                "SITEVISIT_SHEETS_API_KEY and SITEVISIT_SHEETS_SPREADSHEET_ID must be set together"
            ),
        };
        let sheets = SheetsConfig {
            webhook_url: set("SITEVISIT_SHEETS_WEBHOOK_URL"),
            api,
            timeout: Duration::from_secs(parse_or(&set, "SITEVISIT_SHEETS_TIMEOUT_SECS", 10)?),
        };

        let defaults = DbConfig::default();
        let database = DbConfig {
            database_url: set("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_or(&set, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_or(&set, "DB_MIN_CONNECTIONS", defaults.min_connections)?,
            acquire_timeout: Duration::from_secs(parse_or(
                &set,
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            )?),
            migrations_dir: set("SITEVISIT_MIGRATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.migrations_dir),
        };
        if database.min_connections > database.max_connections {
            bail!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                database.min_connections,
                database.max_connections
            );
        }

        Ok(Self {
            listen_addr,
            log_level,
            dev_mode,
            store,
            issue_retries,
            sheets,
            database,
        })
    }
}

/// Parses `key` when set, otherwise returns `default`.
fn parse_or<T>(set: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match set(key) {
        Some(v) => v.trim().parse().with_context(|| format!("invalid {key} '{v}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.issue_retries, 3);
        assert!(config.sheets.webhook_url.is_none());
        assert!(config.sheets.api.is_none());
        assert_eq!(config.sheets.timeout, Duration::from_secs(10));
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SITEVISIT_LISTEN_ADDR", "0.0.0.0:9000"),
            ("SITEVISIT_STORE", "Postgres"),
            ("SITEVISIT_DEV", "true"),
            ("SITEVISIT_ISSUE_RETRIES", "7"),
            ("SITEVISIT_SHEETS_WEBHOOK_URL", "https://script.google.com/macros/s/x/exec"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.store, StoreBackend::Postgres);
        assert!(config.dev_mode);
        assert_eq!(config.issue_retries, 7);
        assert!(config.sheets.webhook_url.is_some());
    }

    #[test]
    fn test_blank_webhook_disables_export() {
        let config = load(&[("SITEVISIT_SHEETS_WEBHOOK_URL", "  ")]).unwrap();
        assert!(config.sheets.webhook_url.is_none());
    }

    #[test]
    fn test_database_settings() {
        let config = load(&[
            ("DATABASE_URL", "postgres://intake@db/visits"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("DB_MIN_CONNECTIONS", "2"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "9"),
            ("SITEVISIT_MIGRATIONS_DIR", "/srv/intake/migrations"),
        ])
        .unwrap();
        assert_eq!(config.database.database_url, "postgres://intake@db/visits");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 2);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(9));
        assert_eq!(
            config.database.migrations_dir,
            PathBuf::from("/srv/intake/migrations")
        );
    }

    #[test]
    fn test_database_defaults() {
        let config = load(&[]).unwrap();
        assert!(config.database.database_url.ends_with("/sitevisit"));
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.migrations_dir.ends_with("migrations"));
    }

    #[test]
    fn test_rejects_bad_database_numbers() {
        assert!(load(&[("DB_MAX_CONNECTIONS", "many")]).is_err());
        assert!(load(&[("DB_MIN_CONNECTIONS", "12")]).is_err());
    }

    #[test]
    fn test_sheets_api_settings() {
        let config = load(&[
            ("SITEVISIT_SHEETS_API_KEY", "key-1"),
            ("SITEVISIT_SHEETS_SPREADSHEET_ID", "sheet-1"),
        ])
        .unwrap();
        assert_eq!(
            config.sheets.api,
            Some(SheetsApiConfig {
                api_key: "key-1".to_string(),
                spreadsheet_id: "sheet-1".to_string(),
                range: "Sheet1!A:T".to_string(),
            })
        );
        assert!(config.sheets.webhook_url.is_none());
    }

    #[test]
    fn test_sheets_api_needs_both_values() {
        assert!(load(&[("SITEVISIT_SHEETS_API_KEY", "key-1")]).is_err());
    }

    #[test]
    fn test_rejects_unknown_store() {
        assert!(load(&[("SITEVISIT_STORE", "sqlite")]).is_err());
    }
}
