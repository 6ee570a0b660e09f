use currency_exchange_bot::{
    api::start_server,
    config::BotConfig,
    dialog::DialogStateMachine,
    dispatch,
    rates::CurrencyApiClient,
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

    // Load environment variables
    let config = BotConfig::from_env()?;

    if config.rates.api_key.is_empty() {
        eprintln!("⚠️  CURRENCY_API_KEY not set in .env");
        eprintln!("📌 See .env.example for setup instructions");
        warn!("Every conversion will report rates unavailable");
    }

    info!("🚀 Currency Exchange Bot - API Server");
    info!("📍 Port: {}", config.api_port);

    // Create components
    let rate_source = Arc::new(CurrencyApiClient::new(&config.rates)?);
    let machine = DialogStateMachine::new(
        rate_source,
        config.rates.home_currency.clone(),
        config.rates.currencies.clone(),
    );
    let (dispatcher, dispatch_task) = dispatch::spawn(machine);

    info!("✅ Dispatcher initialized");
    info!("📡 Starting API server...");

    // Start API server
    start_server(dispatcher, config.api_port).await?;
    dispatch_task.await?;

    Ok(())
}
