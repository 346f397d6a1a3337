//! Handles settings for the application.
//!
//! Values are read from `settings.toml` (optional) and overridden by
//! environment variables prefixed with `BANK__`, e.g.
//! `BANK__DATABASE__URL=postgres://...` or `BANK__SERVER__PORT=8080`.
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Database {
    /// `sqlite:...` or `postgres://...`. An in-memory SQLite database needs
    /// `max_connections = 1`, every connection would open its own.
    pub url: String,
    pub max_connections: u32,
    /// Roll back any ledger transaction running longer than this.
    pub transaction_timeout_ms: Option<u64>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite:./bank.db?mode=rwc".to_string(),
            max_connections: 10,
            transaction_timeout_ms: Some(5_000),
        }
    }
}

impl Database {
    pub fn transaction_timeout(&self) -> Option<Duration> {
        self.transaction_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("settings")
    }

    fn from_file(name: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("BANK").prefix_separator("__").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
