//! # API Configuration Module
//!
//! Loads the server and scheduling configuration from environment variables,
//! with defaults where a value is optional.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Per-request timeout (default: 30)
//! - `SCHED_EXCLUDE_WEEKENDS`: Close Saturday and Sunday for full-day modalities (default: false)
//! - `SCHED_BOOKING_LEAD_MINUTES`: Minimum gap between now and a same-day slot (default: 5)
//! - `SCHED_SEARCH_HORIZON_DAYS`: Days scanned by a next-available search (default: 365)
//! - `SCHED_DEFAULT_SLOT_MINUTES`: Slot length when a modality defines none (default: 30)

use eyre::{Result, WrapErr, eyre};
use modsched_core::config::SchedulingConfig;
use std::env;
use std::str::FromStr;
use tracing::Level;

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Tunables handed to the scheduler
    pub scheduling: SchedulingConfig,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid {name} value: {raw}")),
        None => Ok(default),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<bool> {
    match lookup(name).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(eyre!("Invalid {name} value: {other}")),
    }
}

/// Build the scheduling settings from a variable lookup.
pub fn scheduling_from(lookup: impl Fn(&str) -> Option<String>) -> Result<SchedulingConfig> {
    let defaults = SchedulingConfig::default();
    Ok(SchedulingConfig {
        exclude_weekends: parse_flag(&lookup, "SCHED_EXCLUDE_WEEKENDS")?,
        booking_lead_minutes: parse_or(
            &lookup,
            "SCHED_BOOKING_LEAD_MINUTES",
            defaults.booking_lead_minutes,
        )?,
        search_horizon_days: parse_or(
            &lookup,
            "SCHED_SEARCH_HORIZON_DAYS",
            defaults.search_horizon_days,
        )?,
        default_slot_minutes: parse_or(
            &lookup,
            "SCHED_DEFAULT_SLOT_MINUTES",
            defaults.default_slot_minutes,
        )?,
        ..defaults
    })
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// - `DATABASE_URL` is not set
    /// - `API_PORT` or a `SCHED_*` value does not parse
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;

        // Logging settings
        let log_level = match env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()).as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS").ok().map(|origins| {
            origins.split(',').map(|s| s.trim().to_string()).collect()
        });

        // Performance settings
        let request_timeout = env::var("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let scheduling = scheduling_from(|name| env::var(name).ok())?;

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            scheduling,
        })
    }

    /// Returns the server address as a string (e.g., "127.0.0.1:8080")
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
