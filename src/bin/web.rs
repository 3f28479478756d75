use anyhow::{Context, Result};
use live_odds::server::{load_initial_dataset, router, AppState};
use live_odds::{AppConfig, LineFeedClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("Failed to read configuration")?;
    let client = LineFeedClient::from_config(&config).context("Failed to build HTTP client")?;

    // Serve the newest artifact (or the sample payload) until the first fetch
    let initial = load_initial_dataset(&config).context("Failed to prepare data directory")?;
    match &initial {
        Some(dataset) => println!(
            "Loaded {} matches from {}",
            dataset.records.len(),
            dataset.source
        ),
        None => println!("No data found. Use the dashboard or /api/fetch-live to get live data."),
    }

    let bind_addr = config.bind_addr.clone();
    let app = router(AppState::new(config, client, initial));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!(%bind_addr, "dashboard listening");
    println!("\nDashboard available at http://{}", bind_addr);
    println!("Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
