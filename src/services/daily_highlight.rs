use chrono::Utc;
use metrics::gauge;
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::engine::selector;

/// Run the daily content job: pick the signal of the day and refresh the
/// trending lists. An empty candidate set is a normal outcome, not an
/// error.
pub async fn run_daily_highlight(
    pool: PgPool,
    interval_secs: u64,
    trending_window_hours: i64,
    trending_top_n: usize,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;
        let now = Utc::now();

        match selector::select_signal_of_the_day(&pool, now).await {
            Ok(Some(pick)) => {
                gauge!("daily_pick_score").set(pick.score.to_f64().unwrap_or(0.0));
                tracing::info!(
                    id = %pick.signal.id,
                    provider = %pick.signal.provider,
                    token = pick.signal.token.as_deref().unwrap_or("?"),
                    score = %pick.score,
                    reasoning = %pick.reasoning,
                    "Signal of the day"
                );
            }
            Ok(None) => {
                tracing::info!("No signal-of-the-day candidates in any window");
            }
            Err(e) => {
                tracing::error!(error = %e, "Signal-of-the-day selection failed");
                continue;
            }
        }

        match selector::trending_by_category(&pool, trending_window_hours, trending_top_n, now)
            .await
        {
            Ok(trending) => {
                for (class, group) in &trending {
                    tracing::info!(
                        category = %class,
                        count = group.len(),
                        top_score = %group[0].score,
                        "Trending category"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Trending computation failed");
            }
        }
    }
}
