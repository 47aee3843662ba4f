use std::collections::BTreeSet;

use metrics::counter;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::signal_repo;
use crate::errors::RecordError;
use crate::models::{Action, CloseReason, Signal, SignalStatus};
use crate::oracle::{fetch_price_map, PriceKey, PriceSource};

/// Leveraged PnL as a percentage of entry-price movement.
/// Positive means the position is in profit, regardless of direction.
pub fn compute_pnl_pct(
    action: Action,
    entry_price: Decimal,
    current_price: Decimal,
    leverage: Decimal,
) -> Decimal {
    action.direction() * ((current_price - entry_price) / entry_price)
        * Decimal::ONE_HUNDRED
        * leverage
}

/// Valuation of one open position at a resolved price.
#[derive(Debug, Clone, Copy)]
pub struct Valuation {
    pub current_price: Decimal,
    pub pnl_pct: Decimal,
    pub pnl_usd: Option<Decimal>,
    /// Set when a non-positive leverage was clamped to 1.
    pub leverage_clamped: bool,
}

/// Decision for one open position after evaluation.
#[derive(Debug)]
pub enum PositionOutcome {
    /// Stays open; write back live valuation.
    Update(Valuation),
    /// Risk exit triggered; transition and freeze PnL at this valuation.
    Close {
        valuation: Valuation,
        status: SignalStatus,
        reason: CloseReason,
    },
    /// Record is unusable this cycle; skip and report.
    Skip(RecordError),
}

/// Evaluate an open position against a resolved current price.
///
/// Pure and deterministic. Close precedence is fixed: take-profit is
/// checked before stop-loss, so misconfigured bounds that cross both
/// thresholds always resolve via take-profit.
pub fn evaluate_position(signal: &Signal, current_price: Decimal) -> PositionOutcome {
    let Some(action) = signal.action() else {
        return PositionOutcome::Skip(RecordError::InvalidData(format!(
            "unknown action '{}'",
            signal.action
        )));
    };

    // Rejected upstream; if a bad row slips through we must never divide by it.
    if signal.entry_price <= Decimal::ZERO {
        return PositionOutcome::Skip(RecordError::InvalidData(format!(
            "non-positive entry price {}",
            signal.entry_price
        )));
    }

    // A leverage below 1 would silently invert or dampen PnL; clamp and flag.
    let leverage_clamped = signal.leverage < Decimal::ONE;
    let leverage = if leverage_clamped {
        Decimal::ONE
    } else {
        signal.leverage
    };

    let pnl_pct = compute_pnl_pct(action, signal.entry_price, current_price, leverage);
    let pnl_usd = signal
        .collateral_usd
        .map(|c| c * pnl_pct / Decimal::ONE_HUNDRED);

    let valuation = Valuation {
        current_price,
        pnl_pct,
        pnl_usd,
        leverage_clamped,
    };

    if let Some(tp) = signal.take_profit_pct {
        if pnl_pct >= tp {
            return PositionOutcome::Close {
                valuation,
                status: SignalStatus::Closed,
                reason: CloseReason::TakeProfit,
            };
        }
    }

    if let Some(sl) = signal.stop_loss_pct {
        if pnl_pct <= -sl {
            return PositionOutcome::Close {
                valuation,
                status: SignalStatus::Stopped,
                reason: CloseReason::StopLoss,
            };
        }
    }

    PositionOutcome::Update(valuation)
}

/// One auto-closed signal, reported to the driver. The reason is for
/// observability only and is not persisted on the signal row.
#[derive(Debug, Clone, Copy)]
pub struct AutoClose {
    pub id: Uuid,
    pub close_reason: CloseReason,
}

/// Aggregate result of one refresh invocation. Per-record failures are
/// counted here rather than thrown past the batch boundary.
#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub processed: usize,
    pub updated: usize,
    pub auto_closed: Vec<AutoClose>,
    pub missing_price: u64,
    pub skipped_invalid: u64,
    pub write_errors: u64,
    pub lookup_failures: u64,
}

/// Refresh live valuation for every open signal and enforce SL/TP exits.
///
/// Reads a snapshot of open signals, resolves one price per distinct token
/// key, then processes each signal as an independent unit of work. All
/// writes are compare-and-set on `status = 'open'`, so a concurrent closer
/// is never clobbered. Only a failed snapshot read propagates as an error.
pub async fn refresh_positions<P: PriceSource>(
    pool: &PgPool,
    price_source: &P,
    max_concurrent_lookups: usize,
) -> anyhow::Result<RefreshSummary> {
    let signals = signal_repo::list_open_signals(pool).await?;

    let keys: BTreeSet<PriceKey> = signals.iter().filter_map(PriceKey::for_signal).collect();
    let (prices, lookup_failures) =
        fetch_price_map(price_source, keys, max_concurrent_lookups).await;
    counter!("price_lookup_failures_total").increment(lookup_failures);

    let mut summary = RefreshSummary {
        processed: signals.len(),
        lookup_failures,
        ..Default::default()
    };

    for signal in &signals {
        let price = PriceKey::for_signal(signal).and_then(|key| prices.get(&key).copied());
        let Some(price) = price else {
            // No price this cycle; the signal is retried on the next run.
            summary.missing_price += 1;
            continue;
        };

        let outcome = evaluate_position(signal, price);

        // The clamp warning must be recorded whether the signal stays open
        // or crosses SL/TP in the same evaluation.
        if let PositionOutcome::Update(v) | PositionOutcome::Close { valuation: v, .. } = &outcome
        {
            if v.leverage_clamped {
                tracing::warn!(
                    id = %signal.id,
                    leverage = %signal.leverage,
                    "Invalid leverage clamped to 1 for PnL computation"
                );
            }
        }

        match outcome {
            PositionOutcome::Update(v) => {
                match signal_repo::update_open_valuation(
                    pool,
                    signal.id,
                    v.current_price,
                    v.pnl_pct,
                    v.pnl_usd,
                )
                .await
                {
                    Ok(true) => summary.updated += 1,
                    Ok(false) => {
                        tracing::debug!(id = %signal.id, "Signal closed concurrently — valuation skipped");
                    }
                    Err(e) => {
                        summary.write_errors += 1;
                        counter!("signal_write_failures_total").increment(1);
                        tracing::warn!(error = %e, id = %signal.id, "Failed to write valuation");
                    }
                }
            }
            PositionOutcome::Close {
                valuation: v,
                status,
                reason,
            } => {
                match signal_repo::close_signal(pool, signal.id, status, v.current_price, v.pnl_pct)
                    .await
                {
                    Ok(true) => {
                        counter!("signals_auto_closed_total").increment(1);
                        tracing::info!(
                            id = %signal.id,
                            entry = %signal.entry_price,
                            exit = %v.current_price,
                            pnl_pct = %v.pnl_pct,
                            reason = %reason,
                            "Auto-closed signal"
                        );
                        summary.auto_closed.push(AutoClose {
                            id: signal.id,
                            close_reason: reason,
                        });
                    }
                    Ok(false) => {
                        tracing::debug!(id = %signal.id, "Signal closed concurrently — close skipped");
                    }
                    Err(e) => {
                        summary.write_errors += 1;
                        counter!("signal_write_failures_total").increment(1);
                        tracing::warn!(error = %e, id = %signal.id, "Failed to close signal");
                    }
                }
            }
            PositionOutcome::Skip(err) => {
                summary.skipped_invalid += 1;
                counter!("invalid_signals_total").increment(1);
                tracing::warn!(id = %signal.id, error = %err, "Skipping unprocessable signal");
            }
        }
    }

    counter!("signals_refreshed_total").increment(summary.updated as u64);
    Ok(summary)
}

/// Force-close open signals older than the horizon. Prevents positions on
/// delisted or permanently unpriceable tokens from staying open forever.
pub async fn close_expired_signals(pool: &PgPool, max_age_days: i64) -> anyhow::Result<u64> {
    let closed = signal_repo::close_expired_signals(pool, max_age_days).await?;

    if closed > 0 {
        counter!("signals_expired_total").increment(closed);
        tracing::info!(count = closed, max_age_days, "Closed expired signals");
    }

    Ok(closed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn make_signal(action: &str, entry: &str, leverage: &str) -> Signal {
        Signal {
            id: Uuid::new_v4(),
            provider: "0xprovider".into(),
            source: "api".into(),
            action: action.into(),
            token: Some("ETH".into()),
            token_address: None,
            entry_price: dec(entry),
            leverage: dec(leverage),
            collateral_usd: None,
            stop_loss_pct: None,
            take_profit_pct: None,
            tx_hash: None,
            exit_tx_hash: None,
            confidence: None,
            reasoning: None,
            status: "open".into(),
            created_at: Utc::now(),
            exit_timestamp: None,
            current_price: None,
            unrealized_pnl_pct: None,
            unrealized_pnl_usd: None,
            exit_price: None,
            pnl_pct: None,
        }
    }

    #[test]
    fn test_long_pnl_monotonic_in_price() {
        let a = compute_pnl_pct(Action::Long, dec("100"), dec("105"), Decimal::ONE);
        let b = compute_pnl_pct(Action::Long, dec("100"), dec("110"), Decimal::ONE);
        assert!(b > a);
    }

    #[test]
    fn test_short_pnl_decreases_with_price() {
        let a = compute_pnl_pct(Action::Short, dec("100"), dec("95"), Decimal::ONE);
        let b = compute_pnl_pct(Action::Short, dec("100"), dec("99"), Decimal::ONE);
        assert!(a > b);
        assert!(a > Decimal::ZERO, "Profitable short must have positive PnL");
    }

    #[test]
    fn test_leverage_scales_pnl_linearly() {
        let one = compute_pnl_pct(Action::Long, dec("100"), dec("108"), Decimal::ONE);
        let two = compute_pnl_pct(Action::Long, dec("100"), dec("108"), dec("2"));
        assert_eq!(two, one * dec("2"));
    }

    #[test]
    fn test_worked_example_long_5x() {
        // entry 1952.68, current 2030.0, 5x long -> ~19.8%
        let pnl = compute_pnl_pct(Action::Long, dec("1952.68"), dec("2030.0"), dec("5"));
        assert_eq!(pnl.round_dp(1), dec("19.8"));
    }

    #[test]
    fn test_worked_example_short_10x() {
        // entry 67443.61, current 66200.0, 10x short -> ~18.4%
        let pnl = compute_pnl_pct(Action::Short, dec("67443.61"), dec("66200.0"), dec("10"));
        assert_eq!(pnl.round_dp(1), dec("18.4"));
    }

    #[test]
    fn test_take_profit_closes_with_frozen_pnl() {
        let mut signal = make_signal("LONG", "100", "1");
        signal.take_profit_pct = Some(dec("10"));

        // +12% move, above the 10% target
        match evaluate_position(&signal, dec("112")) {
            PositionOutcome::Close {
                valuation,
                status,
                reason,
            } => {
                assert_eq!(status, SignalStatus::Closed);
                assert_eq!(reason, CloseReason::TakeProfit);
                assert_eq!(valuation.pnl_pct, dec("12"));
            }
            other => panic!("Expected take-profit close, got {other:?}"),
        }
    }

    #[test]
    fn test_stop_loss_stops_position() {
        let mut signal = make_signal("LONG", "100", "1");
        signal.stop_loss_pct = Some(dec("5"));

        match evaluate_position(&signal, dec("94")) {
            PositionOutcome::Close { status, reason, .. } => {
                assert_eq!(status, SignalStatus::Stopped);
                assert_eq!(reason, CloseReason::StopLoss);
            }
            other => panic!("Expected stop-loss close, got {other:?}"),
        }
    }

    #[test]
    fn test_take_profit_precedence_over_stop_loss() {
        // Misconfigured bounds where any PnL crosses both thresholds.
        let mut signal = make_signal("LONG", "100", "1");
        signal.take_profit_pct = Some(dec("-20"));
        signal.stop_loss_pct = Some(dec("-20"));

        match evaluate_position(&signal, dec("100")) {
            PositionOutcome::Close { reason, .. } => {
                assert_eq!(reason, CloseReason::TakeProfit, "TP must win when both trigger");
            }
            other => panic!("Expected close, got {other:?}"),
        }
    }

    #[test]
    fn test_within_bounds_stays_open() {
        let mut signal = make_signal("LONG", "100", "1");
        signal.stop_loss_pct = Some(dec("10"));
        signal.take_profit_pct = Some(dec("10"));

        match evaluate_position(&signal, dec("103")) {
            PositionOutcome::Update(v) => {
                assert_eq!(v.pnl_pct, dec("3"));
                assert!(!v.leverage_clamped);
            }
            other => panic!("Expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_entry_price_skipped() {
        let signal = make_signal("LONG", "0", "1");
        match evaluate_position(&signal, dec("100")) {
            PositionOutcome::Skip(RecordError::InvalidData(_)) => {}
            other => panic!("Expected invalid-data skip, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_action_skipped() {
        let signal = make_signal("HODL", "100", "1");
        match evaluate_position(&signal, dec("100")) {
            PositionOutcome::Skip(RecordError::InvalidData(_)) => {}
            other => panic!("Expected invalid-data skip, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_leverage_clamped_to_one() {
        let signal = make_signal("LONG", "100", "0");
        match evaluate_position(&signal, dec("110")) {
            PositionOutcome::Update(v) => {
                assert!(v.leverage_clamped);
                assert_eq!(v.pnl_pct, dec("10"), "Clamped leverage must behave as 1x");
            }
            other => panic!("Expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_clamp_flag_survives_risk_exit() {
        // A clamped-leverage signal that crosses its take-profit must still
        // carry the flag so the warning is recorded on the close path.
        let mut signal = make_signal("LONG", "100", "-3");
        signal.take_profit_pct = Some(dec("5"));

        match evaluate_position(&signal, dec("110")) {
            PositionOutcome::Close {
                valuation, reason, ..
            } => {
                assert!(valuation.leverage_clamped);
                assert_eq!(reason, CloseReason::TakeProfit);
                assert_eq!(valuation.pnl_pct, dec("10"));
            }
            other => panic!("Expected take-profit close, got {other:?}"),
        }
    }

    #[test]
    fn test_pnl_usd_from_collateral() {
        let mut signal = make_signal("LONG", "100", "1");
        signal.collateral_usd = Some(dec("500"));

        match evaluate_position(&signal, dec("110")) {
            PositionOutcome::Update(v) => {
                assert_eq!(v.pnl_usd, Some(dec("50")));
            }
            other => panic!("Expected update, got {other:?}"),
        }
    }
}
