use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use signalboard::models::{Provider, Signal};

/// Build an open signal with sane defaults for engine tests.
#[allow(dead_code)]
pub fn make_signal(provider: &str, action: &str, token: &str, entry_price: &str) -> Signal {
    Signal {
        id: Uuid::new_v4(),
        provider: provider.into(),
        source: "api".into(),
        action: action.into(),
        token: Some(token.into()),
        token_address: None,
        entry_price: entry_price.parse().unwrap(),
        leverage: Decimal::ONE,
        collateral_usd: None,
        stop_loss_pct: None,
        take_profit_pct: None,
        tx_hash: Some("0xentryhash".into()),
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

/// Build a provider with an empty profile and no trust state.
#[allow(dead_code)]
pub fn make_provider(address: &str, name: &str) -> Provider {
    Provider {
        address: address.into(),
        name: name.into(),
        bio: None,
        description: None,
        avatar_url: None,
        twitter: None,
        farcaster: None,
        github: None,
        website: None,
        chain: Some("base".into()),
        agent_platform: None,
        verified: false,
        overall_score: Decimal::ZERO,
        tier: "unranked".into(),
        badges: vec![],
        checks: None,
        created_at: Utc::now(),
        trust_updated_at: None,
    }
}
