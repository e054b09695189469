//! API configuration
//!
//! One configuration struct built at startup and passed into the
//! components that need it; no globally mutable environment reads after
//! boot.

use rust_decimal::Decimal;
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Exchange-rate endpoint returning the VED-per-USD quote
    pub exchange_rate_url: String,
    /// Timeout for the exchange-rate fetch, in seconds
    pub exchange_rate_timeout_secs: u64,
    /// Seed rate served until the first successful fetch, if configured
    pub fallback_rate: Option<Decimal>,
    /// Interval between overdue sweep runs, in seconds
    pub sweep_interval_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/billing".to_string(),
            log_level: "info".to_string(),
            exchange_rate_url: "https://api.dolarvzla.com/public/exchange-rate".to_string(),
            exchange_rate_timeout_secs: 10,
            fallback_rate: None,
            // Twice daily by default
            sweep_interval_secs: 12 * 60 * 60,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment variables with the API_ prefix
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addr() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.sweep_interval_secs, 43_200);
    }
}
