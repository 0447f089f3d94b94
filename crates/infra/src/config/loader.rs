//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file from the working directory, if present
//! 2. Uses environment variables when `RISMA_API_BASE_URL` is set
//! 3. Otherwise probes for a config file (JSON or TOML)
//! 4. Otherwise falls back to [`ClientConfig::default`]
//!
//! ## Environment Variables
//! - `RISMA_API_BASE_URL`: Base URL of the Risma API (required for env mode)
//! - `RISMA_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `RISMA_API_USER_AGENT`: User agent sent with every request
//! - `RISMA_POLL_INTERVAL_MS`: Delay between job status polls
//! - `RISMA_POLL_TIMEOUT_SECS`: Give up polling a job after this long
//! - `RISMA_CREDENTIAL_BACKEND`: `keychain` or `memory`
//! - `RISMA_KEYCHAIN_SERVICE`: Keychain service name for stored tokens
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./risma.toml`, `./risma.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent directory
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use risma_domain::{ApiConfig, ClientConfig, ClientError, CredentialBackend, Result};

const CONFIG_FILE_NAMES: &[&str] = &["risma.toml", "risma.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ClientError::Config` if a source is present but invalid. A
/// missing source is not an error.
pub fn load() -> Result<ClientConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    if std::env::var("RISMA_API_BASE_URL").is_ok() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("No configuration found; using defaults");
            Ok(ClientConfig::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `RISMA_API_BASE_URL` is required; every other variable falls back to its
/// default.
///
/// # Errors
/// Returns `ClientError::Config` if the base URL is missing or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let defaults = ClientConfig::default();

    let api = ApiConfig {
        base_url: env_var("RISMA_API_BASE_URL")?,
        timeout_secs: env_parse("RISMA_API_TIMEOUT_SECS", defaults.api.timeout_secs)?,
        user_agent: std::env::var("RISMA_API_USER_AGENT").ok().or(defaults.api.user_agent),
    };

    let mut config = ClientConfig { api, ..defaults };
    config.polling.interval_ms = env_parse("RISMA_POLL_INTERVAL_MS", config.polling.interval_ms)?;
    config.polling.timeout_secs =
        env_parse("RISMA_POLL_TIMEOUT_SECS", config.polling.timeout_secs)?;

    if let Ok(backend) = std::env::var("RISMA_CREDENTIAL_BACKEND") {
        config.credentials.backend = CredentialBackend::from_str(&backend)
            .map_err(|e| ClientError::Config(format!("Invalid RISMA_CREDENTIAL_BACKEND: {e}")))?;
    }
    if let Ok(service) = std::env::var("RISMA_KEYCHAIN_SERVICE") {
        config.credentials.keychain_service = service;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `ClientError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ClientError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ClientError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ClientError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration, detecting the format from the file extension.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ClientError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ClientError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional numeric environment variable, using `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ClientError::Config(format!("Invalid {key} '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}
