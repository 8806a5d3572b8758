//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Remote database configuration. `None` runs the app local-only.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Local key-value store configuration.
    #[serde(default)]
    pub store: StoreSettings,
    /// Cloud sync configuration.
    #[serde(default)]
    pub sync: SyncSettings,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionSettings,
    /// Fiscal calendar configuration.
    #[serde(default)]
    pub fiscal: FiscalSettings,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

/// Local store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Directory holding one JSON document per key.
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
    /// Keep documents in memory only (demo mode).
    #[serde(default)]
    pub in_memory: bool,
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            in_memory: false,
        }
    }
}

/// Cloud sync configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    /// Quiet period before a local edit is pushed to the remote table.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Capacity of the remote change channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_debounce_ms() -> u64 {
    1500
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Inactivity threshold before the session is logged out.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_idle_timeout() -> u64 {
    1800 // 30 minutes
}

impl SessionSettings {
    /// Inactivity threshold as a duration.
    #[must_use]
    pub const fn idle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

/// Fiscal calendar configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FiscalSettings {
    /// IANA timezone of the shop, used to read the wall clock.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "Africa/Cairo".to_string()
}

impl Default for FiscalSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

impl FiscalSettings {
    /// Parses the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a known IANA timezone.
    pub fn tz(&self) -> Result<chrono_tz::Tz, config::ConfigError> {
        self.timezone.parse().map_err(|_| {
            config::ConfigError::Message(format!("unknown timezone: {}", self.timezone))
        })
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("SHIFTBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Returns true when a remote database is configured.
    #[must_use]
    pub fn is_cloud_enabled(&self) -> bool {
        self.database.is_some()
    }
}
