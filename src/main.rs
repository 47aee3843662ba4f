use std::time::Duration;

use signalboard::config::AppConfig;
use signalboard::oracle::PriceClient;
use signalboard::services::daily_highlight::run_daily_highlight;
use signalboard::services::position_refresher::run_position_refresher;
use signalboard::services::verification_runner::run_verification_runner;
use signalboard::{db, metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected");

    let metrics_addr = config.metrics_addr.parse()?;
    metrics::init_metrics(metrics_addr)?;
    tracing::info!(addr = %metrics_addr, "Prometheus exporter listening");

    let price_client = PriceClient::new(
        config.price_oracle_url.clone(),
        Duration::from_secs(config.price_lookup_timeout_secs),
    )?;

    // --- Periodic drivers ---
    {
        let pool = pool.clone();
        let interval_secs = config.refresh_interval_secs;
        let max_lookups = config.max_concurrent_price_lookups;
        let max_age = config.max_signal_age_days;
        tokio::spawn(async move {
            run_position_refresher(pool, price_client, interval_secs, max_lookups, max_age).await;
        });
        tracing::info!(interval_secs, "Position refresher spawned");
    }

    {
        let pool = pool.clone();
        let interval_secs = config.verification_interval_secs;
        tokio::spawn(async move {
            run_verification_runner(pool, interval_secs).await;
        });
        tracing::info!(interval_secs, "Verification runner spawned");
    }

    {
        let pool = pool.clone();
        let interval_secs = config.highlight_interval_secs;
        let window_hours = config.trending_window_hours;
        let top_n = config.trending_top_n;
        tokio::spawn(async move {
            run_daily_highlight(pool, interval_secs, window_hours, top_n).await;
        });
        tracing::info!(interval_secs, "Daily highlight job spawned");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
