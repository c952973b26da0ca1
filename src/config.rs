//! Environment-based configuration.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file by the binary, and fall back to defaults suitable for local
//! development.

use std::env;
use std::path::PathBuf;

use crate::domain::message::DEFAULT_DATE_FORMAT;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Directory holding the durable promotion slot.
    pub data_dir: PathBuf,
    /// Fixed application-wide key of the slot.
    pub storage_key: String,
    /// Postgres database holding the authoritative promotion. No reconciliation without it.
    pub database_url: Option<String>,
    pub remote_promotion_id: String,
    pub reconcile_on_start: bool,
    /// chrono format for `%START_DATE%` and `%END_DATE%`.
    pub date_format: String,
    pub nats_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8083,
            data_dir: PathBuf::from("./data"),
            storage_key: "promotion_settings".to_string(),
            database_url: None,
            remote_promotion_id: "storewide".to_string(),
            reconcile_on_start: true,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            nats_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            port: var("PORT").and_then(|s| s.parse().ok()).unwrap_or(defaults.port),
            data_dir: var("PROMOTION_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            storage_key: var("PROMOTION_STORAGE_KEY").unwrap_or(defaults.storage_key),
            database_url: var("DATABASE_URL"),
            remote_promotion_id: var("PROMOTION_REMOTE_ID").unwrap_or(defaults.remote_promotion_id),
            reconcile_on_start: var("RECONCILE_ON_START")
                .map(|s| !matches!(s.to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(defaults.reconcile_on_start),
            date_format: var("PROMOTION_DATE_FORMAT").unwrap_or(defaults.date_format),
            nats_url: var("NATS_URL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.port, 8083);
        assert_eq!(config.storage_key, "promotion_settings");
        assert!(config.database_url.is_none());
        assert!(config.reconcile_on_start);
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("PROMOTION_DATA_DIR", "/var/lib/shop"),
            ("DATABASE_URL", "postgres://shop@db/shop"),
            ("RECONCILE_ON_START", "false"),
            ("NATS_URL", "  "),
        ]));
        assert_eq!(config.port, 9000);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/shop"));
        assert_eq!(config.database_url.as_deref(), Some("postgres://shop@db/shop"));
        assert!(!config.reconcile_on_start);
        assert!(config.nats_url.is_none());
    }

    #[test]
    fn test_bad_port_falls_back() {
        assert_eq!(AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).port, 8083);
    }
}
