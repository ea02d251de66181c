use crate::workflows::allocation::{AllocationError, AllocationSettings, QuotaTable};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_QUOTAS: &str = "central=0.6,martyrs=0.1,parallel=0.3";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub allocation: AllocationSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            allocation: load_allocation_settings()?,
        })
    }
}

fn load_allocation_settings() -> Result<AllocationSettings, ConfigError> {
    let fallback_capacity = env::var("PLACEMENT_FALLBACK_CAPACITY")
        .unwrap_or_else(|_| "100".to_string())
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidFallbackCapacity)?;

    let override_margin = env::var("PLACEMENT_OVERRIDE_MARGIN")
        .unwrap_or_else(|_| "5".to_string())
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|margin| margin.is_finite() && *margin >= 0.0)
        .ok_or(ConfigError::InvalidOverrideMargin)?;

    let quotas = parse_quota_spec(
        &env::var("PLACEMENT_QUOTAS").unwrap_or_else(|_| DEFAULT_QUOTAS.to_string()),
    )?;

    Ok(AllocationSettings {
        quotas,
        fallback_capacity,
        override_margin,
    })
}

/// Parses `label=fraction` pairs separated by commas into a quota table.
pub fn parse_quota_spec(spec: &str) -> Result<QuotaTable, ConfigError> {
    let mut entries = Vec::new();

    for pair in spec.split(',').filter(|pair| !pair.trim().is_empty()) {
        let (label, value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedQuota(pair.trim().to_string()))?;
        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::MalformedQuota(pair.trim().to_string()))?;
        entries.push((label.trim().to_string(), value));
    }

    QuotaTable::from_labels(entries).map_err(|source| ConfigError::InvalidQuotas { source })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFallbackCapacity,
    InvalidOverrideMargin,
    MalformedQuota(String),
    InvalidQuotas { source: AllocationError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFallbackCapacity => {
                write!(f, "PLACEMENT_FALLBACK_CAPACITY must be a non-negative integer")
            }
            ConfigError::InvalidOverrideMargin => {
                write!(f, "PLACEMENT_OVERRIDE_MARGIN must be a non-negative number")
            }
            ConfigError::MalformedQuota(pair) => {
                write!(f, "quota entry '{pair}' must look like label=fraction")
            }
            ConfigError::InvalidQuotas { source } => write!(f, "invalid quotas: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidQuotas { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFallbackCapacity
            | ConfigError::InvalidOverrideMargin
            | ConfigError::MalformedQuota(_) => None,
        }
    }
}

/// Serializes tests that read or mutate process environment variables.
#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    static GUARD: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    GUARD.get_or_init(|| std::sync::Mutex::new(()))
}
