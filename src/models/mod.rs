pub mod provider;
pub mod signal;
pub mod verification;

pub use provider::Provider;
pub use signal::Signal;
pub use verification::{Badge, CheckKind, CheckStatus, Tier, Verification, VerificationCheck};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Trade direction claimed by a signal. LONG/BUY are equivalent for PnL
/// purposes, as are SHORT/SELL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Long,
    Short,
    Buy,
    Sell,
}

impl Action {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LONG" => Some(Action::Long),
            "SHORT" => Some(Action::Short),
            "BUY" => Some(Action::Buy),
            "SELL" => Some(Action::Sell),
            _ => None,
        }
    }

    /// +1 for long exposure, -1 for short exposure.
    pub fn direction(&self) -> Decimal {
        match self {
            Action::Long | Action::Buy => Decimal::ONE,
            Action::Short | Action::Sell => Decimal::NEGATIVE_ONE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Long => "LONG",
            Action::Short => "SHORT",
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SignalStatus
// ---------------------------------------------------------------------------

/// Lifecycle state. Transitions are monotone: open -> closed | stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Open,
    Closed,
    Stopped,
}

impl SignalStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(SignalStatus::Open),
            "closed" => Some(SignalStatus::Closed),
            "stopped" => Some(SignalStatus::Stopped),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Open => "open",
            SignalStatus::Closed => "closed",
            SignalStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CloseReason
// ---------------------------------------------------------------------------

/// Why the PnL engine closed a position. Reported to the driver for
/// observability; not persisted on the signal row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    TakeProfit,
    StopLoss,
    Expired,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::TakeProfit => "take_profit",
            CloseReason::StopLoss => "stop_loss",
            CloseReason::Expired => "expired",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TokenClass
// ---------------------------------------------------------------------------

/// Coarse token categories used for the trending lists. The mapping is a
/// total function over symbols; anything unrecognized lands in Other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Bitcoin,
    Ethereum,
    Layer1,
    Defi,
    Meme,
    Other,
}

impl TokenClass {
    pub fn classify(symbol: &str) -> Self {
        match symbol.to_uppercase().as_str() {
            "BTC" | "WBTC" | "TBTC" => TokenClass::Bitcoin,
            "ETH" | "WETH" | "STETH" | "RETH" => TokenClass::Ethereum,
            "SOL" | "AVAX" | "ADA" | "DOT" | "NEAR" | "SUI" | "APT" | "TON" | "ATOM" => {
                TokenClass::Layer1
            }
            "UNI" | "AAVE" | "LINK" | "MKR" | "CRV" | "LDO" | "COMP" | "SNX" | "PENDLE" => {
                TokenClass::Defi
            }
            "DOGE" | "SHIB" | "PEPE" | "WIF" | "BONK" | "FLOKI" => TokenClass::Meme,
            _ => TokenClass::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Bitcoin => "bitcoin",
            TokenClass::Ethereum => "ethereum",
            TokenClass::Layer1 => "layer1",
            TokenClass::Defi => "defi",
            TokenClass::Meme => "meme",
            TokenClass::Other => "other",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ScoreFactor
// ---------------------------------------------------------------------------

/// Keys of the composite-score breakdown produced by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreFactor {
    Pnl,
    Confidence,
    Reputation,
    Recency,
}

impl ScoreFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreFactor::Pnl => "pnl",
            ScoreFactor::Confidence => "confidence",
            ScoreFactor::Reputation => "reputation",
            ScoreFactor::Recency => "recency",
        }
    }
}

impl fmt::Display for ScoreFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
