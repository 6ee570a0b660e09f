//! Exchange rate sources
//!
//! A rate source returns a fresh snapshot of rates for the configured
//! currency set, quoted as units of foreign currency per one unit of the
//! home currency. Every failure collapses to `RatesUnavailable`.

use crate::error::ExchangeBotError;
use crate::models::{CurrencyCode, CurrencySet};
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

pub mod currency_api;
pub use currency_api::CurrencyApiClient;

/// Trait for fetching current exchange rates (single attempt, no cache)
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<RateTable>;
}

/// Immutable snapshot of rates at fetch time
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: HashMap<CurrencyCode, Decimal>,
}

impl RateTable {
    pub fn new(rates: HashMap<CurrencyCode, Decimal>) -> Self {
        Self { rates }
    }

    /// Build a table from a quote response body.
    ///
    /// The body must carry a non-empty top-level `data` object keyed by
    /// currency code, each entry holding a numeric `value`. Only members of
    /// `currencies` are kept; missing ones are simply absent.
    pub fn from_quotes(body: &Value, currencies: &CurrencySet) -> Result<Self> {
        let data = body
            .get("data")
            .and_then(Value::as_object)
            .filter(|data| !data.is_empty())
            .ok_or_else(|| {
                ExchangeBotError::RatesUnavailable(
                    "response is missing the data envelope".to_string(),
                )
            })?;

        let mut rates = HashMap::with_capacity(currencies.len());

        for code in currencies.iter() {
            let Some(entry) = data.get(code.as_str()) else {
                continue;
            };

            match entry.get("value").and_then(decimal_from_json) {
                Some(rate) if rate < Decimal::ZERO => {
                    warn!(currency = %code, %rate, "Dropping negative rate");
                }
                Some(rate) => {
                    rates.insert(code.clone(), rate);
                }
                None => {
                    warn!(currency = %code, entry = %entry, "Dropping non-numeric rate");
                }
            }
        }

        Ok(Self::new(rates))
    }

    pub fn get(&self, code: &CurrencyCode) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Read a JSON number as an exact decimal via its shortest textual form.
fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let Value::Number(number) = value else {
        return None;
    };
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Rate source backed by a fixed table, or a fixed failure
pub struct StaticRateSource {
    table: Option<RateTable>,
}

impl StaticRateSource {
    pub fn new(rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>) -> Self {
        Self {
            table: Some(RateTable::new(rates.into_iter().collect())),
        }
    }

    /// A source whose every fetch fails
    pub fn unavailable() -> Self {
        Self { table: None }
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch(&self) -> Result<RateTable> {
        self.table.clone().ok_or_else(|| {
            ExchangeBotError::RatesUnavailable("static source has no rates".to_string())
        })
    }
}
