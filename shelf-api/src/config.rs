//! API Configuration Module
//!
//! Bind address and the `reviews` throttle policy, loaded from environment
//! variables with development defaults.

use std::net::{IpAddr, SocketAddr};

use shelf_core::{ConfigError, ShelfError, ShelfResult};

// ============================================================================
// THROTTLE CONFIGURATION
// ============================================================================

/// Quota for the `reviews` submission policy, per client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Whether submissions are throttled at all.
    pub enabled: bool,

    /// Sustained submissions allowed per hour.
    pub per_hour: u32,

    /// Submissions allowed back to back before the hourly rate applies.
    pub burst: u32,

    /// Peers whose `X-Forwarded-For` / `X-Real-IP` headers are believed.
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_hour: 3,
            burst: 3,
            trusted_proxies: Vec::new(),
        }
    }
}

impl ThrottleConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Load from environment variables with fallback to defaults.
    ///
    /// - `SHELF_THROTTLE_ENABLED` (default: true; true/false, 1/0, yes/no, on/off)
    /// - `SHELF_THROTTLE_REVIEWS_PER_HOUR` (default: 3)
    /// - `SHELF_THROTTLE_REVIEWS_BURST` (default: same as per hour)
    /// - `SHELF_THROTTLE_TRUSTED_PROXIES` (comma-separated IPs, default: none)
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for a value that is set but unreadable.
    pub fn from_env() -> ShelfResult<Self> {
        let defaults = Self::default();
        let enabled = match std::env::var("SHELF_THROTTLE_ENABLED") {
            Ok(raw) => parse_flag("throttle.enabled", &raw)?,
            Err(_) => defaults.enabled,
        };
        let per_hour = match std::env::var("SHELF_THROTTLE_REVIEWS_PER_HOUR") {
            Ok(raw) => parse_number("throttle.per_hour", &raw)?,
            Err(_) => defaults.per_hour,
        };
        let burst = match std::env::var("SHELF_THROTTLE_REVIEWS_BURST") {
            Ok(raw) => parse_number("throttle.burst", &raw)?,
            Err(_) => per_hour,
        };
        let trusted_proxies = match std::env::var("SHELF_THROTTLE_TRUSTED_PROXIES") {
            Ok(raw) => parse_ip_list("throttle.trusted_proxies", &raw)?,
            Err(_) => defaults.trusted_proxies,
        };

        Ok(Self {
            enabled,
            per_hour,
            burst,
            trusted_proxies,
        })
    }

    pub fn validate(&self) -> ShelfResult<()> {
        if self.per_hour == 0 {
            return Err(invalid("throttle.per_hour", self.per_hour, "must be positive"));
        }
        if self.burst == 0 {
            return Err(invalid("throttle.burst", self.burst, "must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub throttle: ThrottleConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            throttle: ThrottleConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load from environment variables with fallback to defaults.
    ///
    /// - `SHELF_API_BIND` (default: 0.0.0.0)
    /// - `PORT` or `SHELF_API_PORT` (default: 3000)
    /// - the `SHELF_THROTTLE_*` variables, see [`ThrottleConfig::from_env`]
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for a value that is set but unreadable.
    pub fn from_env() -> ShelfResult<Self> {
        let defaults = Self::default();
        let port = match std::env::var("PORT").or_else(|_| std::env::var("SHELF_API_PORT")) {
            Ok(raw) => parse_number("port", &raw)?,
            Err(_) => defaults.port,
        };
        Ok(Self {
            host: std::env::var("SHELF_API_BIND").unwrap_or(defaults.host),
            port,
            throttle: ThrottleConfig::from_env()?,
        })
    }

    pub fn validate(&self) -> ShelfResult<()> {
        self.bind_addr()?;
        self.throttle.validate()
    }

    pub fn bind_addr(&self) -> ShelfResult<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| invalid("host", &addr, &e.to_string()))
    }
}

/// Case-insensitive boolean; anything unrecognised is an error rather than `false`.
fn parse_flag(field: &str, raw: &str) -> ShelfResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(field, raw, "expected true/false, 1/0, yes/no or on/off")),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> ShelfResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(field, raw, "expected a non-negative integer"))
}

fn parse_ip_list(field: &str, raw: &str) -> ShelfResult<Vec<IpAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(|_| invalid(field, s, "expected an IP address")))
        .collect()
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ShelfError {
    ShelfError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}
