use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "VitalWatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable prefix for runtime overrides.
pub const ENV_PREFIX: &str = "VITALWATCH_";

/// Vitals simulation tick.
pub const DEFAULT_VITALS_TICK_SECS: u64 = 2;

/// Emergency countdown length before an alert is sent automatically.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 120;

/// Appointment reminder scan interval.
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 60;

/// Upper bound on a single geolocation lookup.
pub const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 10;

/// Upward skew of the simulated random walk (0.5 = unbiased).
pub const DEFAULT_DRIFT_BIAS: f64 = 0.4;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "vitalwatch_lib=info,vitalwatch=info,tower_http=warn"
}

/// What to do when the location lookup fails while sending an emergency alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationPolicy {
    /// Send anyway, noting that location is unavailable.
    BestEffort,
    /// Abort the send and surface the location error.
    Required,
}

impl FromStr for LocationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "besteffort" => Ok(Self::BestEffort),
            "required" => Ok(Self::Required),
            other => Err(ConfigError::Invalid {
                key: "LOCATION_POLICY".into(),
                value: other.into(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for VITALWATCH_{key}: {value:?}")]
    Invalid { key: String, value: String },
    #[error("Configuration rejected: {0}")]
    Rejected(String),
}

/// Runtime configuration for the monitoring core and its API server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    pub vitals_tick: Duration,
    pub countdown_secs: u32,
    pub reminder_interval: Duration,
    pub location_timeout: Duration,
    pub location_policy: LocationPolicy,
    pub drift_bias: f64,
    /// Fixed coordinates reported by the host location service, if any.
    pub fixed_location: Option<(f64, f64)>,
    pub bind_addr: SocketAddr,
    pub ollama_url: String,
    pub ollama_model: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            vitals_tick: Duration::from_secs(DEFAULT_VITALS_TICK_SECS),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            reminder_interval: Duration::from_secs(DEFAULT_REMINDER_INTERVAL_SECS),
            location_timeout: Duration::from_secs(DEFAULT_LOCATION_TIMEOUT_SECS),
            location_policy: LocationPolicy::BestEffort,
            drift_bias: DEFAULT_DRIFT_BIAS,
            fixed_location: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            ollama_model: DEFAULT_OLLAMA_MODEL.into(),
        }
    }
}

impl MonitorConfig {
    /// Defaults overridden by `VITALWATCH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Build from an arbitrary key lookup (keys are given without prefix).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("VITALS_TICK_SECS") {
            config.vitals_tick = Duration::from_secs(parse_positive("VITALS_TICK_SECS", &v)?);
        }
        if let Some(v) = lookup("COUNTDOWN_SECS") {
            config.countdown_secs = parse_positive("COUNTDOWN_SECS", &v)? as u32;
        }
        if let Some(v) = lookup("REMINDER_INTERVAL_SECS") {
            config.reminder_interval =
                Duration::from_secs(parse_positive("REMINDER_INTERVAL_SECS", &v)?);
        }
        if let Some(v) = lookup("LOCATION_TIMEOUT_SECS") {
            config.location_timeout =
                Duration::from_secs(parse_positive("LOCATION_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("LOCATION_POLICY") {
            config.location_policy = v.parse()?;
        }
        if let Some(v) = lookup("DRIFT_BIAS") {
            let bias: f64 = parse_value("DRIFT_BIAS", &v)?;
            if !(0.0..=1.0).contains(&bias) {
                return Err(invalid("DRIFT_BIAS", &v));
            }
            config.drift_bias = bias;
        }
        match (lookup("LATITUDE"), lookup("LONGITUDE")) {
            (Some(lat), Some(lon)) => {
                let lat: f64 = parse_value("LATITUDE", &lat)?;
                let lon: f64 = parse_value("LONGITUDE", &lon)?;
                config.fixed_location = Some((lat, lon));
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::Rejected(
                    "LATITUDE and LONGITUDE must be set together".into(),
                ))
            }
        }
        if let Some(v) = lookup("BIND_ADDR") {
            config.bind_addr = parse_value("BIND_ADDR", &v)?;
        }
        if let Some(v) = lookup("OLLAMA_URL") {
            config.ollama_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("OLLAMA_MODEL") {
            config.ollama_model = v;
        }

        Ok(config)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.into(),
        value: value.into(),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn parse_positive(key: &str, value: &str) -> Result<u64, ConfigError> {
    match parse_value::<u64>(key, value)? {
        0 => Err(invalid(key, value)),
        n => Ok(n),
    }
}
