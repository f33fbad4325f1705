//! Account credits returned by `GET /credits`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Credit balance. All amounts are exact decimals, never floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceInfo {
    /// Remaining credits (`total_credits - usage`).
    pub balance: Decimal,
    /// Credits consumed so far.
    pub usage: Decimal,
    /// Credits purchased in total.
    pub total_credits: Decimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreditsEnvelope {
    pub data: CreditsData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreditsData {
    pub total_credits: Decimal,
    pub total_usage: Decimal,
}

impl From<CreditsData> for BalanceInfo {
    fn from(d: CreditsData) -> Self {
        Self {
            balance: d.total_credits - d.total_usage,
            usage: d.total_usage,
            total_credits: d.total_credits,
        }
    }
}
