//! currencyapi.com client
//!
//! One GET per fetch against `/v3/latest`, bounded by the configured timeout.
//! Uses a long-lived reqwest::Client for connection pooling.

use super::{RateSource, RateTable};
use crate::config::RateApiConfig;
use crate::error::ExchangeBotError;
use crate::models::{CurrencyCode, CurrencySet};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

/// Reusable quote client (connection-pooled)
pub struct CurrencyApiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    home_currency: CurrencyCode,
    currencies: CurrencySet,
}

impl CurrencyApiClient {
    pub fn new(config: &RateApiConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            home_currency: config.home_currency.clone(),
            currencies: config.currencies.clone(),
        })
    }

    async fn request_quotes(&self) -> Result<Value> {
        if self.api_key.is_empty() {
            return Err(ExchangeBotError::RatesUnavailable(
                "CURRENCY_API_KEY not configured".to_string(),
            ));
        }

        debug!(base_currency = %self.home_currency, "Requesting exchange rates");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("base_currency", self.home_currency.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Rate API request failed: {}", e);
                ExchangeBotError::RatesUnavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Rate API error response: {}", error_text);
            return Err(ExchangeBotError::RatesUnavailable(format!(
                "rate API returned {}",
                status
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            error!("Failed to parse rate API response: {}", e);
            ExchangeBotError::RatesUnavailable(format!("invalid JSON response: {}", e))
        })
    }
}

#[async_trait]
impl RateSource for CurrencyApiClient {
    async fn fetch(&self) -> Result<RateTable> {
        let body = self.request_quotes().await?;
        let table = RateTable::from_quotes(&body, &self.currencies).map_err(|e| {
            error!("Failed to fetch exchange rates: {}", e);
            e
        })?;

        info!(
            rates = table.len(),
            requested = self.currencies.len(),
            "Exchange rates fetched"
        );

        Ok(table)
    }
}
