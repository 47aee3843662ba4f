use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Signal, SignalStatus};

/// Snapshot of all open signals, oldest first.
pub async fn list_open_signals(pool: &PgPool) -> anyhow::Result<Vec<Signal>> {
    let signals = sqlx::query_as::<_, Signal>(
        "SELECT * FROM signals WHERE status = 'open' ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(signals)
}

/// All signals created at or after the given instant, newest first.
pub async fn list_recent_signals(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<Signal>> {
    let signals = sqlx::query_as::<_, Signal>(
        "SELECT * FROM signals WHERE created_at >= $1 ORDER BY created_at DESC",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(signals)
}

/// All signals published by one provider.
pub async fn list_signals_by_provider(
    pool: &PgPool,
    address: &str,
) -> anyhow::Result<Vec<Signal>> {
    let signals = sqlx::query_as::<_, Signal>(
        "SELECT * FROM signals WHERE LOWER(provider) = LOWER($1) ORDER BY created_at ASC",
    )
    .bind(address)
    .fetch_all(pool)
    .await?;

    Ok(signals)
}

pub async fn count_open_signals(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM signals WHERE status = 'open'")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Write back live valuation for a still-open signal. The status guard
/// makes this a compare-and-set: if a concurrent writer already closed the
/// row, nothing is touched and `false` is returned.
pub async fn update_open_valuation(
    pool: &PgPool,
    id: Uuid,
    current_price: Decimal,
    unrealized_pnl_pct: Decimal,
    unrealized_pnl_usd: Option<Decimal>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE signals
        SET current_price = $2,
            unrealized_pnl_pct = $3,
            unrealized_pnl_usd = $4
        WHERE id = $1 AND status = 'open'
        "#,
    )
    .bind(id)
    .bind(current_price)
    .bind(unrealized_pnl_pct)
    .bind(unrealized_pnl_usd)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Transition an open signal to closed/stopped, freezing its PnL. The
/// unrealized fields are meaningless after closure and are cleared in the
/// same statement. Returns `false` when a concurrent close won the race.
pub async fn close_signal(
    pool: &PgPool,
    id: Uuid,
    status: SignalStatus,
    exit_price: Decimal,
    pnl_pct: Decimal,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE signals
        SET status = $2,
            exit_price = $3,
            pnl_pct = $4,
            exit_timestamp = NOW(),
            current_price = NULL,
            unrealized_pnl_pct = NULL,
            unrealized_pnl_usd = NULL
        WHERE id = $1 AND status = 'open'
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(exit_price)
    .bind(pnl_pct)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Force-close every open signal older than the horizon. PnL is frozen at
/// the last known unrealized value (zero if no price ever resolved) so
/// delisted tokens cannot keep positions open forever. Returns the number
/// of rows closed.
pub async fn close_expired_signals(pool: &PgPool, max_age_days: i64) -> anyhow::Result<u64> {
    // make_interval takes an int; reject horizons that don't fit rather
    // than silently truncating them.
    let max_age_days = i32::try_from(max_age_days)
        .map_err(|_| anyhow::anyhow!("max_age_days {max_age_days} out of range"))?;

    let result = sqlx::query(
        r#"
        UPDATE signals
        SET status = 'closed',
            pnl_pct = COALESCE(unrealized_pnl_pct, 0),
            exit_price = COALESCE(current_price, entry_price),
            exit_timestamp = NOW(),
            current_price = NULL,
            unrealized_pnl_pct = NULL,
            unrealized_pnl_usd = NULL
        WHERE status = 'open'
          AND created_at < NOW() - make_interval(days => $1)
        "#,
    )
    .bind(max_age_days)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
