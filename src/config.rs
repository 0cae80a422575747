use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{env, fs, path::Path};

const DEFAULT_CONFIG_PATH: &str = "ledger.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    /// Path of the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Path of the JSON file backing the godown collections.
    #[serde(default = "default_godown_store_path")]
    pub godown_store_path: String,
    /// Address the HTTP server binds to, e.g. "127.0.0.1:3000".
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            godown_store_path: default_godown_store_path(),
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_database_path() -> String {
    "poultry-ledger.db".to_string()
}

fn default_godown_store_path() -> String {
    "godown-store.json".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = fs::read_to_string(path_ref)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path_ref, e)))?;
    let app_config: AppConfig = toml::from_str(&contents).map_err(|e| {
        Error::Config(format!(
            "Failed to parse TOML from config file {:?}: {}",
            path_ref, e
        ))
    })?;
    Ok(app_config)
}

/// Loads the application configuration.
///
/// Reads `ledger.toml` (or the file named by `LEDGER_CONFIG`) when it exists,
/// falling back to defaults otherwise. `DATABASE_PATH`, `GODOWN_STORE_PATH`
/// and `BIND_ADDR` environment variables override the file's values, so a
/// deployment can be configured without a config file at all.
pub fn load_app_configuration() -> Result<AppConfig> {
    let config_path = env::var("LEDGER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = if Path::new(&config_path).exists() {
        load_config(&config_path)?
    } else {
        tracing::debug!(
            "Config file {} not found, using built-in defaults.",
            config_path
        );
        AppConfig::default()
    };

    if let Ok(db_path) = env::var("DATABASE_PATH") {
        config.database_path = db_path;
    }
    if let Ok(store_path) = env::var("GODOWN_STORE_PATH") {
        config.godown_store_path = store_path;
    }
    if let Ok(addr) = env::var("BIND_ADDR") {
        config.bind_addr = addr;
    }

    tracing::info!(
        "Configuration loaded: database={}, godown_store={}, bind={}",
        config.database_path,
        config.godown_store_path,
        config.bind_addr
    );
    Ok(config)
}
