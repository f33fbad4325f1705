//! Model catalogue entries returned by `GET /models`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u64>,
    /// Absent for some catalogue entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
}

impl ModelInfo {
    /// Free models have zero prompt and completion prices or carry the `:free` variant suffix.
    /// A model without pricing is only free by suffix.
    pub fn is_free(&self) -> bool {
        self.id.ends_with(":free")
            || self
                .pricing
                .as_ref()
                .map(|p| p.prompt.is_zero() && p.completion.is_zero())
                .unwrap_or(false)
    }
}

/// Per-token prices. The gateway sends them as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub prompt: Decimal,
    pub completion: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Decimal>,
}

/// Wire envelope of the model listing.
#[derive(Debug, Deserialize)]
pub(crate) struct ModelList {
    pub data: Vec<ModelInfo>,
}
