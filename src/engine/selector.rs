use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::db::{provider_repo, signal_repo};
use crate::errors::RecordError;
use crate::models::{Provider, ScoreFactor, Signal, TokenClass};

/// Lookback windows for the daily pick, narrowest first. The first window
/// with at least one candidate wins; all empty is a valid `None` outcome.
const SELECTION_WINDOW_HOURS: [i64; 3] = [24, 7 * 24, 30 * 24];

// Factor weights. They sum to the composite-score ceiling of 100.
const PNL_WEIGHT: Decimal = Decimal::from_parts(40, 0, 0, false, 0);
const CONFIDENCE_WEIGHT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
const REPUTATION_WEIGHT: Decimal = Decimal::from_parts(25, 0, 0, false, 0);
const RECENCY_WEIGHT: Decimal = Decimal::from_parts(15, 0, 0, false, 0);

/// PnL normalization cap: a move of +/-50% (leveraged) saturates the PnL
/// factor. Sign-aware — a well-called SHORT carries positive pnl_pct and
/// scores exactly like a well-called LONG.
const PNL_CAP_PCT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Read seam over the ledger store for candidate selection, mirroring the
/// price-source seam: the engine stays testable against in-memory data
/// while production reads go through the repos.
pub trait CandidateSource: Sync {
    fn signals_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = anyhow::Result<Vec<Signal>>> + Send;

    fn provider(
        &self,
        address: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Provider>>> + Send;
}

impl CandidateSource for PgPool {
    async fn signals_since(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<Signal>> {
        signal_repo::list_recent_signals(self, since).await
    }

    async fn provider(&self, address: &str) -> anyhow::Result<Option<Provider>> {
        provider_repo::get_provider(self, address).await
    }
}

/// A candidate ranked by the composite score. Ephemeral — recomputed per
/// request, never persisted.
#[derive(Debug, Clone)]
pub struct ScoredSignal {
    pub signal: Signal,
    pub score: Decimal,
    pub breakdown: BTreeMap<ScoreFactor, Decimal>,
    pub reasoning: String,
}

/// The signal of the day, with the provider record for context.
#[derive(Debug, Clone)]
pub struct DailySelection {
    pub signal: Signal,
    pub provider: Option<Provider>,
    pub score: Decimal,
    pub breakdown: BTreeMap<ScoreFactor, Decimal>,
    pub reasoning: String,
}

/// Reject candidates whose persisted state contradicts the lifecycle
/// invariants. A hard error for the record, not for the batch.
pub fn validate_candidate(signal: &Signal) -> Result<(), RecordError> {
    if signal.status().is_none() {
        return Err(RecordError::InvalidData(format!(
            "unknown status '{}'",
            signal.status
        )));
    }
    if !signal.is_open() && signal.exit_price.is_none() {
        return Err(RecordError::Invariant(
            "closed signal missing exit price".into(),
        ));
    }
    if !signal.is_open() && signal.pnl_pct.is_none() {
        return Err(RecordError::Invariant(
            "closed signal missing realized pnl".into(),
        ));
    }
    Ok(())
}

/// Score one candidate. Every factor is normalized to [0, 1], weighted,
/// and recorded in the breakdown so the final number is fully explainable.
pub fn score_signal(
    signal: &Signal,
    provider_score: Decimal,
    window: Duration,
    now: DateTime<Utc>,
) -> ScoredSignal {
    let pnl_pct = signal.effective_pnl_pct().unwrap_or(Decimal::ZERO);
    let pnl_norm = (pnl_pct.clamp(-PNL_CAP_PCT, PNL_CAP_PCT) / PNL_CAP_PCT + Decimal::ONE)
        / Decimal::TWO;

    let confidence = signal
        .confidence
        .unwrap_or(Decimal::ZERO)
        .clamp(Decimal::ZERO, Decimal::ONE);

    let reputation = provider_score.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        / Decimal::ONE_HUNDRED;

    let age_secs = (now - signal.created_at).num_seconds().max(0);
    let window_secs = window.num_seconds().max(1);
    let recency = (Decimal::ONE
        - Decimal::from(age_secs) / Decimal::from(window_secs))
    .clamp(Decimal::ZERO, Decimal::ONE);

    let mut breakdown = BTreeMap::new();
    breakdown.insert(ScoreFactor::Pnl, pnl_norm * PNL_WEIGHT);
    breakdown.insert(ScoreFactor::Confidence, confidence * CONFIDENCE_WEIGHT);
    breakdown.insert(ScoreFactor::Reputation, reputation * REPUTATION_WEIGHT);
    breakdown.insert(ScoreFactor::Recency, recency * RECENCY_WEIGHT);

    let score: Decimal = breakdown.values().copied().sum();
    let reasoning = build_reasoning(&breakdown);

    ScoredSignal {
        signal: signal.clone(),
        score,
        breakdown,
        reasoning,
    }
}

fn factor_weight(factor: ScoreFactor) -> Decimal {
    match factor {
        ScoreFactor::Pnl => PNL_WEIGHT,
        ScoreFactor::Confidence => CONFIDENCE_WEIGHT,
        ScoreFactor::Reputation => REPUTATION_WEIGHT,
        ScoreFactor::Recency => RECENCY_WEIGHT,
    }
}

/// Mechanical summary of which factors dominated: any factor at >= 70% of
/// its weight is called out. Derivable purely from the breakdown, so it is
/// testable.
pub fn build_reasoning(breakdown: &BTreeMap<ScoreFactor, Decimal>) -> String {
    let threshold = Decimal::new(7, 1);
    let dominant: Vec<&str> = breakdown
        .iter()
        .filter(|(factor, contribution)| **contribution >= factor_weight(**factor) * threshold)
        .map(|(factor, _)| match factor {
            ScoreFactor::Pnl => "strong PnL",
            ScoreFactor::Confidence => "high confidence",
            ScoreFactor::Reputation => "trusted provider",
            ScoreFactor::Recency => "fresh call",
        })
        .collect();

    if dominant.is_empty() {
        "balanced performance across factors".into()
    } else {
        dominant.join(" + ")
    }
}

/// Deterministic selection order: highest score first; ties go to the more
/// recent signal, then to the lexicographically smallest id.
pub fn selection_order(a: &ScoredSignal, b: &ScoredSignal) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.signal.created_at.cmp(&a.signal.created_at))
        .then_with(|| a.signal.id.cmp(&b.signal.id))
}

/// Best candidate under the selection order, or `None` on an empty set.
pub fn pick_best(scored: Vec<ScoredSignal>) -> Option<ScoredSignal> {
    scored.into_iter().min_by(|a, b| selection_order(a, b))
}

/// Group scored candidates by token class and keep the top N per class.
/// Classes with no candidates are absent, never empty placeholders.
pub fn build_trending(
    mut scored: Vec<ScoredSignal>,
    top_n: usize,
) -> BTreeMap<TokenClass, Vec<ScoredSignal>> {
    scored.sort_by(selection_order);

    let mut groups: BTreeMap<TokenClass, Vec<ScoredSignal>> = BTreeMap::new();
    for candidate in scored {
        let class = candidate
            .signal
            .token
            .as_deref()
            .map(TokenClass::classify)
            .unwrap_or(TokenClass::Other);

        let group = groups.entry(class).or_default();
        if group.len() < top_n {
            group.push(candidate);
        }
    }

    groups
}

/// Pick the single best signal from the recent population, widening the
/// lookback window until a candidate appears. An empty 30-day window
/// yields `Ok(None)`.
pub async fn select_signal_of_the_day<S: CandidateSource>(
    source: &S,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<DailySelection>> {
    for hours in SELECTION_WINDOW_HOURS {
        let window = Duration::hours(hours);
        let signals = source.signals_since(now - window).await?;

        let candidates = filter_valid(signals);
        if candidates.is_empty() {
            continue;
        }

        let providers = load_providers(source, &candidates).await?;
        let scored = candidates
            .iter()
            .map(|s| score_signal(s, reputation_of(&providers, &s.provider), window, now))
            .collect();

        let Some(best) = pick_best(scored) else {
            continue;
        };

        let provider = providers
            .get(&best.signal.provider.to_lowercase())
            .cloned()
            .flatten();

        tracing::debug!(
            id = %best.signal.id,
            score = %best.score,
            window_hours = hours,
            "Selected signal of the day"
        );

        return Ok(Some(DailySelection {
            signal: best.signal,
            provider,
            score: best.score,
            breakdown: best.breakdown,
            reasoning: best.reasoning,
        }));
    }

    Ok(None)
}

/// Top-N candidates per token class within the window, ranked by the same
/// composite score as the daily pick.
pub async fn trending_by_category<S: CandidateSource>(
    source: &S,
    window_hours: i64,
    top_n: usize,
    now: DateTime<Utc>,
) -> anyhow::Result<BTreeMap<TokenClass, Vec<ScoredSignal>>> {
    let window = Duration::hours(window_hours);
    let signals = source.signals_since(now - window).await?;

    let candidates = filter_valid(signals);
    let providers = load_providers(source, &candidates).await?;
    let scored = candidates
        .iter()
        .map(|s| score_signal(s, reputation_of(&providers, &s.provider), window, now))
        .collect();

    Ok(build_trending(scored, top_n))
}

fn filter_valid(signals: Vec<Signal>) -> Vec<Signal> {
    signals
        .into_iter()
        .filter(|s| match validate_candidate(s) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(id = %s.id, error = %e, "Dropping invalid selector candidate");
                false
            }
        })
        .collect()
}

/// One point read per distinct provider. The map is per-invocation; the
/// store stays authoritative.
async fn load_providers<S: CandidateSource>(
    source: &S,
    signals: &[Signal],
) -> anyhow::Result<HashMap<String, Option<Provider>>> {
    let mut providers = HashMap::new();
    for signal in signals {
        let address = signal.provider.to_lowercase();
        if providers.contains_key(&address) {
            continue;
        }
        let provider = source.provider(&address).await?;
        providers.insert(address, provider);
    }
    Ok(providers)
}

fn reputation_of(providers: &HashMap<String, Option<Provider>>, address: &str) -> Decimal {
    providers
        .get(&address.to_lowercase())
        .and_then(|p| p.as_ref())
        .map(|p| p.overall_score)
        .unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
