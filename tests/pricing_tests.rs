mod common;

use std::collections::{BTreeSet, HashMap, HashSet};

use rust_decimal::Decimal;

use signalboard::engine::pnl::{evaluate_position, PositionOutcome};
use signalboard::models::CloseReason;
use signalboard::oracle::{fetch_price_map, PriceKey, PriceSource};

/// HashMap-backed price source with optional per-key failures, standing in
/// for the real oracle.
struct MapSource {
    prices: HashMap<PriceKey, Decimal>,
    failing: HashSet<PriceKey>,
}

impl MapSource {
    fn new(entries: &[(PriceKey, &str)]) -> Self {
        Self {
            prices: entries
                .iter()
                .map(|(k, v)| (k.clone(), v.parse().unwrap()))
                .collect(),
            failing: HashSet::new(),
        }
    }

    fn with_failure(mut self, key: PriceKey) -> Self {
        self.failing.insert(key);
        self
    }
}

impl PriceSource for MapSource {
    async fn get_price(&self, key: &PriceKey) -> anyhow::Result<Option<Decimal>> {
        if self.failing.contains(key) {
            anyhow::bail!("oracle unavailable for {key}");
        }
        Ok(self.prices.get(key).copied())
    }
}

fn sym(s: &str) -> PriceKey {
    PriceKey::Symbol(s.into())
}

#[tokio::test]
async fn test_fetch_resolves_known_keys() {
    let source = MapSource::new(&[(sym("ETH"), "2030.0"), (sym("BTC"), "66200.0")]);
    let keys: BTreeSet<PriceKey> = [sym("ETH"), sym("BTC")].into();

    let (prices, failures) = fetch_price_map(&source, keys, 4).await;

    assert_eq!(failures, 0);
    assert_eq!(prices.len(), 2);
    assert_eq!(prices[&sym("ETH")], "2030.0".parse().unwrap());
}

#[tokio::test]
async fn test_one_failing_key_does_not_poison_the_batch() {
    let source =
        MapSource::new(&[(sym("ETH"), "2030.0"), (sym("BTC"), "66200.0")]).with_failure(sym("BTC"));
    let keys: BTreeSet<PriceKey> = [sym("ETH"), sym("BTC"), sym("DELISTED")].into();

    let (prices, failures) = fetch_price_map(&source, keys, 4).await;

    // ETH resolved, BTC errored, DELISTED was simply unknown.
    assert_eq!(failures, 1);
    assert_eq!(prices.len(), 1);
    assert!(prices.contains_key(&sym("ETH")));
}

#[tokio::test]
async fn test_non_positive_prices_are_discarded() {
    let source = MapSource::new(&[(sym("ZERO"), "0"), (sym("NEG"), "-1"), (sym("OK"), "5")]);
    let keys: BTreeSet<PriceKey> = [sym("ZERO"), sym("NEG"), sym("OK")].into();

    let (prices, failures) = fetch_price_map(&source, keys, 4).await;

    assert_eq!(failures, 0);
    assert_eq!(prices.len(), 1);
    assert!(prices.contains_key(&sym("OK")));
}

#[tokio::test]
async fn test_sequential_and_parallel_fetch_agree() {
    let source = MapSource::new(&[(sym("A"), "1"), (sym("B"), "2"), (sym("C"), "3")]);
    let keys: BTreeSet<PriceKey> = [sym("A"), sym("B"), sym("C")].into();

    let (parallel, _) = fetch_price_map(&source, keys.clone(), 8).await;
    let (sequential, _) = fetch_price_map(&source, keys, 1).await;

    assert_eq!(parallel, sequential);
}

#[test]
fn test_price_key_prefers_address_and_normalizes_case() {
    let mut signal = common::make_signal("0xp", "LONG", "eth", "100");
    assert_eq!(PriceKey::for_signal(&signal), Some(sym("ETH")));

    signal.token_address = Some("0xAbC123".into());
    assert_eq!(
        PriceKey::for_signal(&signal),
        Some(PriceKey::Address("0xabc123".into()))
    );
}

#[tokio::test]
async fn test_missing_price_skips_signal_but_closes_the_rest() {
    // Two open signals; only one token has a price this cycle. The priced
    // one crosses its take-profit and must still close.
    let mut priced = common::make_signal("0xp", "LONG", "ETH", "1952.68");
    priced.leverage = "5".parse().unwrap();
    priced.take_profit_pct = Some("15".parse().unwrap());
    let unpriced = common::make_signal("0xp", "LONG", "DELISTED", "1.0");

    let source = MapSource::new(&[(sym("ETH"), "2030.0")]);
    let keys: BTreeSet<PriceKey> = [&priced, &unpriced]
        .iter()
        .filter_map(|s| PriceKey::for_signal(s))
        .collect();
    let (prices, _) = fetch_price_map(&source, keys, 4).await;

    assert!(prices
        .get(&PriceKey::for_signal(&unpriced).unwrap())
        .is_none());

    let price = prices[&PriceKey::for_signal(&priced).unwrap()];
    match evaluate_position(&priced, price) {
        PositionOutcome::Close {
            valuation, reason, ..
        } => {
            assert_eq!(reason, CloseReason::TakeProfit);
            // ~19.8% leveraged move, frozen at evaluation time.
            assert_eq!(valuation.pnl_pct.round_dp(1), "19.8".parse().unwrap());
        }
        other => panic!("Expected take-profit close, got {other:?}"),
    }
}
