use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::payment::DEFAULT_FAILURE_RATE;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::security_header_layers;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/bookings";
const DEFAULT_EVENT_SERVICE_URL: &str = "http://localhost:4000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 5_000;

/// `DATABASE_URL` value that selects the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub event_service_url: String,
    pub notification_url: Option<String>,
    pub upstream_timeout: Duration,
    pub payment_failure_rate: f64,
    pub cors_allowed_origins: Option<String>,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parsed(&var, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            bind_addr: parsed(&var, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3001))),
            event_service_url: non_empty("EVENT_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_EVENT_SERVICE_URL.to_string()),
            notification_url: non_empty("NOTIFICATION_URL"),
            upstream_timeout: Duration::from_millis(parsed(
                &var,
                "UPSTREAM_TIMEOUT_MS",
                DEFAULT_UPSTREAM_TIMEOUT_MS,
            )),
            payment_failure_rate: parsed(&var, "PAYMENT_FAILURE_RATE", DEFAULT_FAILURE_RATE)
                .clamp(0.0, 1.0),
            cors_allowed_origins: non_empty("CORS_ALLOWED_ORIGINS"),
            production: var("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

fn parsed<F, T>(var: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match var(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Config: invalid {}='{}' ({}), using {}", name, raw, e, default);
            default
        }),
    }
}
