//! Catalogue and account endpoints.

use crate::client::core::Client;
use crate::client::types::CallStats;
use crate::protocol::validator::{parse_credits, parse_model_list};
use crate::transport::HttpRequest;
use crate::types::{BalanceInfo, ModelInfo};
use crate::Result;

impl Client {
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        self.list_models_with_stats().await.map(|(m, _)| m)
    }

    pub async fn list_models_with_stats(&self) -> Result<(Vec<ModelInfo>, CallStats)> {
        let http = HttpRequest::get(self.inner.protocol().models_path.clone());
        self.inner.unary(http, parse_model_list, &self.cancel).await
    }

    /// Account credits; `balance = total_credits - usage`.
    pub async fn get_balance(&self) -> Result<BalanceInfo> {
        self.get_balance_with_stats().await.map(|(b, _)| b)
    }

    pub async fn get_balance_with_stats(&self) -> Result<(BalanceInfo, CallStats)> {
        let http = HttpRequest::get(self.inner.protocol().credits_path.clone());
        self.inner.unary(http, parse_credits, &self.cancel).await
    }
}
