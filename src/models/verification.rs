use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// CheckKind / CheckStatus
// ---------------------------------------------------------------------------

/// The fixed, ordered set of verification checks. The order here is the
/// order they run in and the order of the persisted audit list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    SocialPresence,
    OnchainActivity,
    TrackRecord,
    SignalQuality,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::SocialPresence,
        CheckKind::OnchainActivity,
        CheckKind::TrackRecord,
        CheckKind::SignalQuality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::SocialPresence => "social_presence",
            CheckKind::OnchainActivity => "onchain_activity",
            CheckKind::TrackRecord => "track_record",
            CheckKind::SignalQuality => "signal_quality",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluated check. The ordered list of these is the audit trail for
/// a provider's overall score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCheck {
    pub kind: CheckKind,
    pub status: CheckStatus,
    pub score: Decimal,
}

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Ordered trust classification. Thresholds are closed on the lower bound
/// and cover [0, 100] without gaps:
/// unranked [0,20), bronze [20,40), silver [40,60), gold [60,80),
/// diamond [80,100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Unranked,
    Bronze,
    Silver,
    Gold,
    Diamond,
}

impl Tier {
    pub fn from_score(score: Decimal) -> Self {
        if score >= Decimal::from(80) {
            Tier::Diamond
        } else if score >= Decimal::from(60) {
            Tier::Gold
        } else if score >= Decimal::from(40) {
            Tier::Silver
        } else if score >= Decimal::from(20) {
            Tier::Bronze
        } else {
            Tier::Unranked
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "unranked" => Some(Tier::Unranked),
            "bronze" => Some(Tier::Bronze),
            "silver" => Some(Tier::Silver),
            "gold" => Some(Tier::Gold),
            "diamond" => Some(Tier::Diamond),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Unranked => "unranked",
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Diamond => "diamond",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Badge
// ---------------------------------------------------------------------------

/// Achievement flags derived from specific check outcomes, never from the
/// overall score. New badges can be added without touching score math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    SocialVerified,
    Veteran,
    HighVolume,
    FullyBacked,
}

impl Badge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::SocialVerified => "social_verified",
            Badge::Veteran => "veteran",
            Badge::HighVolume => "high_volume",
            Badge::FullyBacked => "fully_backed",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Full output of one verification run for a provider. Persisted as a unit;
/// a partial write would leave an inconsistent trust snapshot visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub address: String,
    pub overall_score: Decimal,
    pub tier: Tier,
    pub verified: bool,
    pub badges: Vec<Badge>,
    pub checks: Vec<VerificationCheck>,
}
