//! Configuration module for the coastal alert backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug)]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.var, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// SMTP settings for outgoing email.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; falls back to the SMTP user.
    pub from: Option<String>,
}

/// Twilio settings for outgoing SMS.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub api_base: String,
}

/// Endpoints of the third-party and local services we proxy to.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub sea_level_url: String,
    pub sea_level_station: String,
    pub weather_url: String,
    pub predict_url: String,
    pub cyclone_url: String,
    pub timeout: Duration,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Token signing secret; a random one is generated when absent
    pub jwt_secret: Option<String>,
    pub token_ttl: Duration,
    /// JSON file holding the alert recipient directory
    pub recipients_path: Option<PathBuf>,
    pub smtp: SmtpConfig,
    pub twilio: TwilioConfig,
    pub upstream: UpstreamConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env_or("COASTAL_DB_PATH", "./data/coastal.sqlite").into();

        let bind_addr = env_or("COASTAL_BIND_ADDR", "127.0.0.1:3001")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError {
                var: "COASTAL_BIND_ADDR",
                message: e.to_string(),
            })?;

        let log_level = env_or("COASTAL_LOG_LEVEL", "info");

        let log_format = match env_or("COASTAL_LOG_FORMAT", "text").to_lowercase().as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError {
                    var: "COASTAL_LOG_FORMAT",
                    message: format!("expected `text` or `json`, got `{}`", other),
                })
            }
        };

        let token_ttl_hours: u64 = parse_env("COASTAL_TOKEN_TTL_HOURS", 24)?;
        // Token expiry is a signed unix timestamp.
        let token_ttl_secs = token_ttl_hours
            .checked_mul(3600)
            .filter(|secs| i64::try_from(*secs).is_ok())
            .ok_or_else(|| ConfigError {
                var: "COASTAL_TOKEN_TTL_HOURS",
                message: format!("{} hours is too long", token_ttl_hours),
            })?;
        let smtp_port: u16 = parse_env("COASTAL_SMTP_PORT", 465)?;
        let timeout_secs: u64 = parse_env("COASTAL_UPSTREAM_TIMEOUT_SECS", 30)?;

        let smtp_user = env_opt("COASTAL_SMTP_USER");
        let smtp = SmtpConfig {
            host: env_or("COASTAL_SMTP_HOST", "smtp.gmail.com"),
            port: smtp_port,
            from: env_opt("COASTAL_MAIL_FROM").or_else(|| smtp_user.clone()),
            username: smtp_user,
            password: env_opt("COASTAL_SMTP_PASS"),
        };

        let twilio = TwilioConfig {
            account_sid: env_opt("COASTAL_TWILIO_ACCOUNT_SID"),
            auth_token: env_opt("COASTAL_TWILIO_AUTH_TOKEN"),
            from_number: env_opt("COASTAL_TWILIO_FROM"),
            api_base: env_or("COASTAL_TWILIO_API_BASE", "https://api.twilio.com"),
        };

        let upstream = UpstreamConfig {
            sea_level_url: env_or(
                "COASTAL_SEA_LEVEL_URL",
                "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter",
            ),
            sea_level_station: env_or("COASTAL_SEA_LEVEL_STATION", "9461710"),
            weather_url: env_or(
                "COASTAL_WEATHER_URL",
                "https://api.open-meteo.com/v1/forecast",
            ),
            predict_url: env_or("COASTAL_PREDICT_URL", "http://127.0.0.1:5000/predict"),
            cyclone_url: env_or("COASTAL_CYCLONE_URL", "http://127.0.0.1:6000/cyclone"),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_format,
            jwt_secret: env_opt("COASTAL_JWT_SECRET"),
            token_ttl: Duration::from_secs(token_ttl_secs),
            recipients_path: env_opt("COASTAL_RECIPIENTS_PATH").map(PathBuf::from),
            smtp,
            twilio,
            upstream,
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Unset and empty variables both count as absent.
fn env_opt(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match env_opt(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
            var,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
