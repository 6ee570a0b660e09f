use currency_exchange_bot::{
    config::BotConfig,
    dialog::DialogStateMachine,
    dispatch,
    rates::CurrencyApiClient,
    telegram::{TelegramClient, TelegramPoller},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;

    let token = config.telegram.token.clone().ok_or_else(|| {
        eprintln!("⚠️  TELEGRAM_BOT_TOKEN not set in .env");
        eprintln!("📌 See .env.example for setup instructions");
        "TELEGRAM_BOT_TOKEN is required"
    })?;

    if config.rates.api_key.is_empty() {
        warn!("CURRENCY_API_KEY not set - every conversion will report rates unavailable");
    }

    info!("🚀 Currency Exchange Bot - Telegram");
    info!(
        home = %config.rates.home_currency,
        currencies = config.rates.currencies.len(),
        "Currency set loaded"
    );

    // Create components
    let rate_source = Arc::new(CurrencyApiClient::new(&config.rates)?);
    let machine = DialogStateMachine::new(
        rate_source,
        config.rates.home_currency.clone(),
        config.rates.currencies.clone(),
    );
    let (dispatcher, dispatch_task) = dispatch::spawn(machine);

    let client = TelegramClient::new(
        &config.telegram.api_url,
        &token,
        config.telegram.poll_timeout,
    )?;
    let poller = TelegramPoller::new(client, dispatcher, config.telegram.poll_timeout);

    info!("✅ Dispatcher initialized");
    info!("📡 Polling Telegram for updates...");

    tokio::select! {
        result = poller.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    drop(poller);
    dispatch_task.await?;

    Ok(())
}
