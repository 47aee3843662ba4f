use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its scrape listener and register
/// all application metrics.
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;

    // Pre-register counters so they appear even before the first increment.
    counter!("signals_refreshed_total").absolute(0);
    counter!("signals_auto_closed_total").absolute(0);
    counter!("signals_expired_total").absolute(0);
    counter!("price_lookup_failures_total").absolute(0);
    counter!("signal_write_failures_total").absolute(0);
    counter!("invalid_signals_total").absolute(0);
    counter!("verifications_run_total").absolute(0);
    counter!("tier_changes_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("open_signals").set(0.0);
    gauge!("daily_pick_score").set(0.0);

    Ok(())
}
