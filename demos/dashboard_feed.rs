use crypto_pulse_sdk::format::{format_large_number, format_percentage, format_price};
use crypto_pulse_sdk::{
    DashboardConfig, DashboardController, PreferenceStore, RenderUpdate, SortKey,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Crypto Pulse Dashboard Feed");
    println!("===========================");

    let prefs = PreferenceStore::default();
    println!("Theme: {}", prefs.load_theme(false).as_str());

    let config = DashboardConfig::from_env();
    let controller = Arc::new(
        DashboardController::from_config(&config)?.with_refresh_interval(Duration::from_secs(15)),
    );
    let mut updates = controller.subscribe();

    // 1. Load the list and print the top of it
    if let Err(e) = controller.load_list().await {
        eprintln!("Could not load coins: {}", e);
        return Ok(());
    }

    let coins = controller.visible_coins().await;
    println!("\n{:-<70}", "");
    for coin in coins.iter().take(10) {
        println!(
            "{:<8} {:<14} mcap {:<10} 24h {}",
            coin.symbol.to_uppercase(),
            format_price(coin.current_price),
            format_large_number(coin.market_cap),
            format_percentage(coin.price_change_percentage_24h)
        );
    }

    // 2. Re-sort locally, no network involved
    let by_change = controller.sort(SortKey::PriceChange24h).await;
    if let Some(top) = by_change.first() {
        println!(
            "\nBiggest 24h mover: {} ({})",
            top.name,
            format_percentage(top.price_change_percentage_24h)
        );
    }

    // 3. Open the featured coin and ask for an insight
    let featured = config.featured.id.clone();
    match controller.select(&featured).await {
        Ok(()) => {
            if let Some(series) = controller.current_series().await {
                println!(
                    "{}: {} daily points, change {}",
                    featured,
                    series.points.len(),
                    format_percentage(series.change_percentage())
                );
            }
            let insight = controller.request_insight(&featured).await?;
            println!("Insight: {}", insight);
            controller.back().await;
        }
        Err(e) => eprintln!("Could not open {}: {}", featured, e),
    }

    // 4. Watch a couple of refresh cycles
    let watcher = tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            println!("[{}] {}", update.update_type(), update);
            if let RenderUpdate::ErrorRaised { retryable: true, .. } = update {
                println!("   (retry available)");
            }
        }
    });

    controller.start_refresh_task();
    tokio::time::sleep(Duration::from_secs(40)).await;
    controller.stop_refresh_task();

    let health = controller.health_check().await;
    println!("\nHealth: {:?} - {}", health.status, health.message.unwrap_or_default());

    watcher.abort();
    Ok(())
}
