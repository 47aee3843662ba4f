use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Action, SignalStatus};

/// Database row for the signals table.
///
/// `action` and `status` are stored as text; use [`Signal::action`] and
/// [`Signal::status`] to get the parsed enums. Rows written by older
/// ingestion paths carry `source = "legacy"`, kept for audit only — there is
/// a single canonical representation and no branching on it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Signal {
    pub id: Uuid,
    pub provider: String,
    pub source: String,

    pub action: String,
    pub token: Option<String>,
    pub token_address: Option<String>,
    pub entry_price: Decimal,
    pub leverage: Decimal,
    pub collateral_usd: Option<Decimal>,
    pub stop_loss_pct: Option<Decimal>,
    pub take_profit_pct: Option<Decimal>,

    pub tx_hash: Option<String>,
    pub exit_tx_hash: Option<String>,
    pub confidence: Option<Decimal>,
    pub reasoning: Option<String>,

    pub status: String,
    pub created_at: DateTime<Utc>,
    pub exit_timestamp: Option<DateTime<Utc>>,

    // Maintained by the PnL engine while open.
    pub current_price: Option<Decimal>,
    pub unrealized_pnl_pct: Option<Decimal>,
    pub unrealized_pnl_usd: Option<Decimal>,

    // Set once, on close.
    pub exit_price: Option<Decimal>,
    pub pnl_pct: Option<Decimal>,
}

impl Signal {
    pub fn action(&self) -> Option<Action> {
        Action::from_db_str(&self.action)
    }

    pub fn status(&self) -> Option<SignalStatus> {
        SignalStatus::from_db_str(&self.status)
    }

    pub fn is_open(&self) -> bool {
        self.status() == Some(SignalStatus::Open)
    }

    /// Realized PnL for closed signals, last unrealized PnL otherwise.
    pub fn effective_pnl_pct(&self) -> Option<Decimal> {
        if self.is_open() {
            self.unrealized_pnl_pct
        } else {
            self.pnl_pct
        }
    }
}
