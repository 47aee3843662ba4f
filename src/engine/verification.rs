use metrics::counter;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::db::{provider_repo, signal_repo};
use crate::models::{
    Badge, CheckKind, CheckStatus, Provider, Signal, SignalStatus, Tier, Verification,
    VerificationCheck,
};

// Per-check maximums. They sum to the score ceiling of 100.
const SOCIAL_MAX: u32 = 20;
const ONCHAIN_MAX: u32 = 20;
const TRACK_RECORD_MAX: u32 = 30;
const QUALITY_MAX: u32 = 30;

/// A provider is verified once its overall score reaches this threshold.
/// Independent of tier naming.
const VERIFIED_THRESHOLD: u32 = 60;

/// Compute the full trust projection for a provider from its profile and
/// signal history.
///
/// Pure and deterministic: same inputs, bit-identical output. No check is
/// required to succeed — an unevaluable check contributes warn/0, never a
/// failure of the whole computation.
pub fn calculate_verification(provider: &Provider, signals: &[Signal]) -> Verification {
    let checks = vec![
        check_social_presence(provider),
        check_onchain_activity(signals),
        check_track_record(signals),
        check_signal_quality(signals),
    ];

    let raw: Decimal = checks.iter().map(|c| c.score).sum();
    let overall_score = raw.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let tier = Tier::from_score(overall_score);
    let verified = overall_score >= Decimal::from(VERIFIED_THRESHOLD);
    let badges = derive_badges(&checks);

    Verification {
        address: provider.address.to_lowercase(),
        overall_score,
        tier,
        verified,
        badges,
        checks,
    }
}

/// Fetch inputs and compute the verification for one provider. Pure
/// computation over a point-in-time read; nothing is written.
pub async fn run_verification(
    pool: &PgPool,
    address: &str,
) -> anyhow::Result<Option<Verification>> {
    let Some(provider) = provider_repo::get_provider(pool, address).await? else {
        return Ok(None);
    };
    let signals = signal_repo::list_signals_by_provider(pool, address).await?;

    Ok(Some(calculate_verification(&provider, &signals)))
}

/// Persist the derived trust projection. All four trust fields plus the
/// check audit list are written in a single statement.
pub async fn persist_verification(
    pool: &PgPool,
    verification: &Verification,
) -> anyhow::Result<()> {
    provider_repo::update_provider_trust(pool, verification).await?;
    counter!("verifications_run_total").increment(1);

    tracing::debug!(
        address = %verification.address,
        score = %verification.overall_score,
        tier = %verification.tier,
        "Persisted verification"
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Checks, in fixed evaluation order
// ---------------------------------------------------------------------------

fn check(kind: CheckKind, status: CheckStatus, score: u32) -> VerificationCheck {
    VerificationCheck {
        kind,
        status,
        score: Decimal::from(score),
    }
}

/// Identity/social proof: how many plausible off-chain identities are
/// linked. No socials at all is unevaluable, not a failure.
fn check_social_presence(provider: &Provider) -> VerificationCheck {
    let mut linked = provider.linked_socials().len();
    if provider.has_website() {
        linked += 1;
    }

    match linked {
        0 => check(CheckKind::SocialPresence, CheckStatus::Warn, 0),
        1 => check(CheckKind::SocialPresence, CheckStatus::Pass, 10),
        2 => check(CheckKind::SocialPresence, CheckStatus::Pass, 15),
        _ => check(CheckKind::SocialPresence, CheckStatus::Pass, SOCIAL_MAX),
    }
}

/// On-chain footprint: distinct entry transaction hashes across the
/// provider's signals.
fn check_onchain_activity(signals: &[Signal]) -> VerificationCheck {
    let distinct_txs = signals
        .iter()
        .filter_map(|s| s.tx_hash.as_deref())
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    match distinct_txs {
        0 => check(CheckKind::OnchainActivity, CheckStatus::Fail, 0),
        1..=4 => check(CheckKind::OnchainActivity, CheckStatus::Warn, 8),
        5..=19 => check(CheckKind::OnchainActivity, CheckStatus::Pass, 14),
        _ => check(CheckKind::OnchainActivity, CheckStatus::Pass, ONCHAIN_MAX),
    }
}

/// Track record: closed signals with a resolvable realized PnL.
fn check_track_record(signals: &[Signal]) -> VerificationCheck {
    let resolved = signals
        .iter()
        .filter(|s| {
            matches!(
                s.status(),
                Some(SignalStatus::Closed) | Some(SignalStatus::Stopped)
            ) && s.pnl_pct.is_some()
        })
        .count();

    match resolved {
        0..=2 => check(CheckKind::TrackRecord, CheckStatus::Warn, 0),
        3..=9 => check(CheckKind::TrackRecord, CheckStatus::Pass, 15),
        10..=29 => check(CheckKind::TrackRecord, CheckStatus::Pass, 22),
        _ => check(CheckKind::TrackRecord, CheckStatus::Pass, TRACK_RECORD_MAX),
    }
}

/// Signal quality: share of signals backed by an entry transaction hash.
fn check_signal_quality(signals: &[Signal]) -> VerificationCheck {
    if signals.is_empty() {
        return check(CheckKind::SignalQuality, CheckStatus::Warn, 0);
    }

    let backed = signals
        .iter()
        .filter(|s| s.tx_hash.as_deref().is_some_and(|h| !h.trim().is_empty()))
        .count();
    let ratio = Decimal::from(backed as i64) / Decimal::from(signals.len() as i64);

    if ratio >= Decimal::new(9, 1) {
        check(CheckKind::SignalQuality, CheckStatus::Pass, QUALITY_MAX)
    } else if ratio >= Decimal::new(6, 1) {
        check(CheckKind::SignalQuality, CheckStatus::Pass, 20)
    } else if ratio >= Decimal::new(3, 1) {
        check(CheckKind::SignalQuality, CheckStatus::Warn, 10)
    } else {
        check(CheckKind::SignalQuality, CheckStatus::Fail, 0)
    }
}

/// Badges are functions of the check list only, never of the overall
/// score, so new badges cannot perturb score math.
fn derive_badges(checks: &[VerificationCheck]) -> Vec<Badge> {
    let mut badges = Vec::new();

    for c in checks {
        match c.kind {
            CheckKind::SocialPresence if c.status == CheckStatus::Pass => {
                badges.push(Badge::SocialVerified);
            }
            CheckKind::OnchainActivity if c.score == Decimal::from(ONCHAIN_MAX) => {
                badges.push(Badge::Veteran);
            }
            CheckKind::TrackRecord if c.score == Decimal::from(TRACK_RECORD_MAX) => {
                badges.push(Badge::HighVolume);
            }
            CheckKind::SignalQuality if c.score == Decimal::from(QUALITY_MAX) => {
                badges.push(Badge::FullyBacked);
            }
            _ => {}
        }
    }

    badges
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
