pub mod client;

pub use client::PriceClient;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use futures_util::{stream, StreamExt};
use rust_decimal::Decimal;

use crate::models::Signal;

/// Valuation key for a signal: contract address when present (lowercased),
/// otherwise token symbol (uppercased). Keys are deduplicated per batch so
/// each distinct token costs at most one oracle call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceKey {
    Symbol(String),
    Address(String),
}

impl PriceKey {
    pub fn for_signal(signal: &Signal) -> Option<Self> {
        if let Some(addr) = signal.token_address.as_deref() {
            let addr = addr.trim();
            if !addr.is_empty() {
                return Some(PriceKey::Address(addr.to_lowercase()));
            }
        }
        let token = signal.token.as_deref()?.trim();
        if token.is_empty() {
            return None;
        }
        Some(PriceKey::Symbol(token.to_uppercase()))
    }
}

impl fmt::Display for PriceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceKey::Symbol(s) => write!(f, "symbol:{s}"),
            PriceKey::Address(a) => write!(f, "address:{a}"),
        }
    }
}

/// A source of current USD prices. May be slow or unreliable; callers must
/// tolerate `None` and errors on a per-key basis.
pub trait PriceSource: Sync {
    fn get_price(
        &self,
        key: &PriceKey,
    ) -> impl Future<Output = anyhow::Result<Option<Decimal>>> + Send;
}

/// Resolve a batch of price keys with bounded concurrency.
///
/// Individual failures are logged and counted, never fatal: a failed or
/// missing key simply has no entry in the returned map. The map lives for
/// one engine invocation only.
pub async fn fetch_price_map<P: PriceSource>(
    source: &P,
    keys: impl IntoIterator<Item = PriceKey>,
    max_concurrent: usize,
) -> (HashMap<PriceKey, Decimal>, u64) {
    let mut results = stream::iter(keys.into_iter().map(|key| async move {
        let res = source.get_price(&key).await;
        (key, res)
    }))
    .buffer_unordered(max_concurrent.max(1));

    let mut prices = HashMap::new();
    let mut failures = 0u64;

    while let Some((key, res)) = results.next().await {
        match res {
            Ok(Some(price)) if price > Decimal::ZERO => {
                prices.insert(key, price);
            }
            Ok(_) => {
                tracing::debug!(key = %key, "No price available for key");
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(error = %e, key = %key, "Price lookup failed");
            }
        }
    }

    (prices, failures)
}
