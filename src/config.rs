//! Runtime configuration for the telemetry service.
//!
//! Settings come from the environment with sensible defaults; CLI flags
//! override on top (see `main`).

use std::env;
use std::path::PathBuf;

/// Main configuration for the service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface the HTTP server binds to.
    pub host: String,
    /// TCP port (0 picks a free port).
    pub port: u16,
    /// CSV file holding the initial device roster.
    pub devices_path: PathBuf,
    /// Whether inbound timestamps are checked against the sanity policy.
    pub timestamp_policy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            devices_path: PathBuf::from("devices.csv"),
            timestamp_policy: true,
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `DEVICEPULSE_HOST`, `DEVICEPULSE_PORT` (with
    /// plain `PORT` as a fallback), `DEVICEPULSE_DEVICES`,
    /// `DEVICEPULSE_TIMESTAMP_POLICY`. Unparseable values are logged and
    /// ignored rather than fatal.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("DEVICEPULSE_HOST") {
            if !host.trim().is_empty() {
                config.host = host.trim().to_string();
            }
        }

        for key in ["DEVICEPULSE_PORT", "PORT"] {
            if let Ok(raw) = env::var(key) {
                match raw.trim().parse::<u16>() {
                    Ok(port) => {
                        config.port = port;
                        break;
                    }
                    Err(_) => {
                        tracing::warn!(%key, value = %raw, "ignoring unparseable port");
                    }
                }
            }
        }

        if let Ok(path) = env::var("DEVICEPULSE_DEVICES") {
            if !path.trim().is_empty() {
                config.devices_path = PathBuf::from(path.trim());
            }
        }

        if let Ok(raw) = env::var("DEVICEPULSE_TIMESTAMP_POLICY") {
            match parse_bool(&raw) {
                Some(enabled) => config.timestamp_policy = enabled,
                None => {
                    tracing::warn!(value = %raw, "ignoring unparseable timestamp policy flag");
                }
            }
        }

        config
    }
}

/// Parse common boolean spellings ("1"/"true"/"on"/"yes" and their
/// negations), case-insensitively.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
