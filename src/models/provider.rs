use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for the providers table.
///
/// The trust block (`verified`, `overall_score`, `tier`, `badges`, `checks`)
/// is a derived projection owned by the verification engine and is
/// overwritten as a whole on each run, never merged.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Provider {
    pub address: String,
    pub name: String,
    pub bio: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub twitter: Option<String>,
    pub farcaster: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub chain: Option<String>,
    pub agent_platform: Option<String>,

    pub verified: bool,
    pub overall_score: Decimal,
    pub tier: String,
    pub badges: Vec<String>,
    /// JSON-serialized audit list of verification checks from the last run.
    pub checks: Option<String>,

    pub created_at: DateTime<Utc>,
    pub trust_updated_at: Option<DateTime<Utc>>,
}

impl Provider {
    /// Socials that look like real handles (non-empty after trimming).
    pub fn linked_socials(&self) -> Vec<&str> {
        [
            self.twitter.as_deref(),
            self.farcaster.as_deref(),
            self.github.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
    }

    pub fn has_website(&self) -> bool {
        self.website
            .as_deref()
            .map(|w| w.starts_with("http://") || w.starts_with("https://"))
            .unwrap_or(false)
    }
}
