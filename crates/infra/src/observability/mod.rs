//! Logging setup
//!
//! The client logs through `tracing` only. Applications embedding it call
//! [`init_tracing`] once at startup; libraries and tests never install a
//! subscriber themselves.
//!
//! Tokens are never recorded in spans or events.

use std::str::FromStr;

use risma_domain::{ClientError, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info,risma_core=debug,risma_infra=debug";

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Plain,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" | "pretty" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(ClientError::Config(format!("Unknown log format '{other}'"))),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// # Errors
/// Returns `ClientError::Config` if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter());

    let installed = match format {
        LogFormat::Plain => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => {
            registry.with(fmt::layer().json().with_current_span(true)).try_init()
        }
    };

    installed.map_err(|e| ClientError::Config(format!("Failed to install tracing subscriber: {e}")))
}
