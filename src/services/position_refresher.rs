use metrics::gauge;
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::db::signal_repo;
use crate::engine::pnl;
use crate::oracle::PriceClient;

/// Run the position refresh loop. Each tick revalues every open signal
/// against current prices, enforces SL/TP exits, and sweeps positions that
/// exceeded the maximum lifetime. A store outage fails the tick, not the
/// loop; the next tick retries from a fresh snapshot.
pub async fn run_position_refresher(
    pool: PgPool,
    price_client: PriceClient,
    interval_secs: u64,
    max_concurrent_lookups: usize,
    max_signal_age_days: i64,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;

        match pnl::refresh_positions(&pool, &price_client, max_concurrent_lookups).await {
            Ok(summary) => {
                tracing::info!(
                    processed = summary.processed,
                    updated = summary.updated,
                    auto_closed = summary.auto_closed.len(),
                    missing_price = summary.missing_price,
                    skipped_invalid = summary.skipped_invalid,
                    write_errors = summary.write_errors,
                    "Position refresh complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Position refresh failed");
                continue;
            }
        }

        match pnl::close_expired_signals(&pool, max_signal_age_days).await {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "Expiry sweep closed stale signals"),
            Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
        }

        match signal_repo::count_open_signals(&pool).await {
            Ok(count) => gauge!("open_signals").set(count as f64),
            Err(e) => tracing::debug!(error = %e, "Failed to count open signals"),
        }
    }
}
