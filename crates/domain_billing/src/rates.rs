//! Exchange-rate provider port and adapters
//!
//! The ledger treats the rate source as an opaque async function that
//! yields a positive VED-per-USD multiplier or fails. The HTTP adapter
//! keeps the last successful fetch as a fallback so a flaky upstream
//! degrades to a slightly stale rate instead of failing invoice issuance
//! or payment application.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use core_kernel::{ExchangeRate, PortError};

/// Source of the current VED-per-USD exchange rate
#[async_trait]
pub trait RateProvider: Send + Sync + 'static {
    /// Returns the current rate, or the last known good rate on upstream
    /// failure; errs only when no rate has ever been obtained
    async fn current_rate(&self) -> Result<ExchangeRate, PortError>;
}

/// A provider that always returns the same rate
///
/// Used in tests and as an offline fallback configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateProvider(ExchangeRate);

impl FixedRateProvider {
    pub fn new(rate: ExchangeRate) -> Self {
        Self(rate)
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn current_rate(&self) -> Result<ExchangeRate, PortError> {
        Ok(self.0)
    }
}

/// Wire format of the public exchange-rate endpoint
#[derive(Debug, Deserialize)]
struct RateResponse {
    current: RateQuote,
}

#[derive(Debug, Deserialize)]
struct RateQuote {
    usd: f64,
}

/// HTTP adapter fetching the official VED/USD rate
///
/// Every request carries an explicit timeout; a failed fetch falls back to
/// the last successfully fetched rate.
pub struct HttpRateProvider {
    client: reqwest::Client,
    url: String,
    last_known: RwLock<Option<ExchangeRate>>,
}

impl HttpRateProvider {
    /// Creates a provider against the given endpoint
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: url.into(),
            last_known: RwLock::new(None),
        })
    }

    /// Seeds the fallback rate, e.g. from configuration at startup
    pub async fn seed(&self, rate: ExchangeRate) {
        *self.last_known.write().await = Some(rate);
    }

    async fn fetch(&self) -> Result<ExchangeRate, PortError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PortError::Connection {
                message: format!("exchange rate fetch failed: {e}"),
                source: Some(Box::new(e)),
            })?
            .error_for_status()
            .map_err(|e| PortError::ServiceUnavailable {
                service: format!("exchange rate endpoint ({e})"),
            })?;

        let body: RateResponse = response.json().await.map_err(|e| PortError::Internal {
            message: "malformed exchange rate response".to_string(),
            source: Some(Box::new(e)),
        })?;

        let value = Decimal::try_from(body.current.usd)
            .map_err(|e| PortError::internal(format!("unrepresentable rate value: {e}")))?;

        ExchangeRate::new(value).map_err(|e| PortError::validation(e.to_string()))
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn current_rate(&self) -> Result<ExchangeRate, PortError> {
        match self.fetch().await {
            Ok(rate) => {
                debug!(%rate, "fetched exchange rate");
                *self.last_known.write().await = Some(rate);
                Ok(rate)
            }
            Err(err) => {
                let cached = *self.last_known.read().await;
                match cached {
                    Some(rate) => {
                        warn!(error = %err, fallback = %rate, "exchange rate fetch failed, using last known rate");
                        Ok(rate)
                    }
                    None => Err(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fixed_provider() {
        let rate = ExchangeRate::new(dec!(36.5)).unwrap();
        let provider = FixedRateProvider::new(rate);
        assert_eq!(provider.current_rate().await.unwrap(), rate);
    }

    #[tokio::test]
    async fn test_http_provider_falls_back_to_seed() {
        // Unroutable endpoint: the fetch fails and the seeded rate is served
        let provider =
            HttpRateProvider::new("http://127.0.0.1:1/rate", Duration::from_millis(50)).unwrap();
        let seeded = ExchangeRate::new(dec!(100)).unwrap();
        provider.seed(seeded).await;

        assert_eq!(provider.current_rate().await.unwrap(), seeded);
    }

    #[tokio::test]
    async fn test_http_provider_errors_without_cache() {
        let provider =
            HttpRateProvider::new("http://127.0.0.1:1/rate", Duration::from_millis(50)).unwrap();
        assert!(provider.current_rate().await.is_err());
    }
}
