use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::decision::{CreditScore, DecisionPolicy};

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
    pub models: ModelConfig,
    pub catalog: CatalogConfig,
    pub decision: DecisionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let models = ModelConfig {
            eligibility_path: path_var("APP_ELIGIBILITY_MODEL", "models/eligibility_model.json"),
            amount_path: path_var("APP_AMOUNT_MODEL", "models/amount_model.json"),
        };

        let refresh_secs: u64 = parse_var("APP_CATALOG_REFRESH_SECS", 0)?;
        let catalog = CatalogConfig {
            path: path_var("APP_OFFER_CATALOG", "data/loan_interest_rates.csv"),
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
        };

        let timeout_ms: u64 = parse_var("APP_REQUEST_TIMEOUT_MS", 5_000)?;
        let approval_threshold: u16 = parse_var("APP_APPROVAL_THRESHOLD", 650)?;
        if !(CreditScore::MIN..=CreditScore::MAX).contains(&approval_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(approval_threshold));
        }
        let max_offers: usize = parse_var("APP_MAX_OFFERS", 5)?;
        if max_offers == 0 {
            return Err(ConfigError::ZeroOfferLimit);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            models,
            catalog,
            decision: DecisionConfig {
                approval_threshold,
                max_offers,
                request_timeout: Duration::from_millis(timeout_ms),
            },
        })
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue {
                variable: name,
                value: raw,
            }),
        Err(_) => Ok(default),
    }
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

/// Output layout for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Locations of the serialized predictor artifacts.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub eligibility_path: PathBuf,
    pub amount_path: PathBuf,
}

/// Offer catalog source and optional reload cadence.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub refresh_interval: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct DecisionConfig {
    pub approval_threshold: u16,
    pub max_offers: usize,
    pub request_timeout: Duration,
}

impl DecisionConfig {
    pub fn policy(&self) -> DecisionPolicy {
        DecisionPolicy {
            approval_threshold: self.approval_threshold,
            max_offers: self.max_offers,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { variable: &'static str, value: String },
    ThresholdOutOfRange(u16),
    ZeroOfferLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { variable, value } => {
                write!(f, "{variable} has an invalid value '{value}'")
            }
            ConfigError::ThresholdOutOfRange(value) => write!(
                f,
                "APP_APPROVAL_THRESHOLD must be within {}..={}, got {value}",
                CreditScore::MIN,
                CreditScore::MAX
            ),
            ConfigError::ZeroOfferLimit => write!(f, "APP_MAX_OFFERS must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::ThresholdOutOfRange(_)
            | ConfigError::ZeroOfferLimit => None,
        }
    }
}
