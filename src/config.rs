//! Process configuration
//!
//! Read once at startup from the environment (optionally seeded from `.env`).

use crate::error::ExchangeBotError;
use crate::models::{CurrencyCode, CurrencySet};
use crate::Result;
use std::env;
use std::time::Duration;

pub const DEFAULT_CURRENCY_API_URL: &str = "https://api.currencyapi.com/v3/latest";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_HOME_CURRENCY: &str = "RUB";
pub const DEFAULT_CURRENCIES: &str = "USD,EUR,CNY,KRW,JPY,KZT";

const DEFAULT_RATE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_API_PORT: u16 = 8080;

/// Settings for the remote quote service
#[derive(Debug, Clone)]
pub struct RateApiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub home_currency: CurrencyCode,
    pub currencies: CurrencySet,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub poll_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub rates: RateApiConfig,
    pub telegram: TelegramConfig,
    pub api_port: u16,
}

impl BotConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let home_currency = CurrencyCode::parse(
            &get("HOME_CURRENCY").unwrap_or_else(|| DEFAULT_HOME_CURRENCY.to_string()),
        )?;

        let codes = get("CURRENCIES")
            .unwrap_or_else(|| DEFAULT_CURRENCIES.to_string())
            .split(',')
            .filter(|c| !c.trim().is_empty())
            .map(CurrencyCode::parse)
            .collect::<Result<Vec<_>>>()?;

        if codes.contains(&home_currency) {
            return Err(ExchangeBotError::Config(format!(
                "CURRENCIES must not include the home currency {}",
                home_currency
            )));
        }

        let currencies = CurrencySet::new(codes)?;

        let rate_timeout = parse_secs(get("RATE_FETCH_TIMEOUT_SECS"), DEFAULT_RATE_TIMEOUT_SECS)
            .map_err(|e| ExchangeBotError::Config(format!("RATE_FETCH_TIMEOUT_SECS: {}", e)))?;
        let poll_timeout = parse_secs(get("TELEGRAM_POLL_TIMEOUT_SECS"), DEFAULT_POLL_TIMEOUT_SECS)
            .map_err(|e| ExchangeBotError::Config(format!("TELEGRAM_POLL_TIMEOUT_SECS: {}", e)))?;

        let api_port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(port) => port
                .parse()
                .map_err(|e| ExchangeBotError::Config(format!("PORT: {}", e)))?,
            None => DEFAULT_API_PORT,
        };

        Ok(Self {
            rates: RateApiConfig {
                endpoint: get("CURRENCY_API_URL")
                    .unwrap_or_else(|| DEFAULT_CURRENCY_API_URL.to_string()),
                api_key: get("CURRENCY_API_KEY").unwrap_or_default(),
                home_currency,
                currencies,
                timeout: rate_timeout,
            },
            telegram: TelegramConfig {
                token: get("TELEGRAM_BOT_TOKEN"),
                api_url: get("TELEGRAM_API_URL")
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                poll_timeout,
            },
            api_port,
        })
    }
}

fn parse_secs(value: Option<String>, default: u64) -> std::result::Result<Duration, String> {
    match value {
        Some(v) => match v.parse::<u64>() {
            Ok(0) => Err("must be greater than zero".to_string()),
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => Err(e.to_string()),
        },
        None => Ok(Duration::from_secs(default)),
    }
}
