//! 协议模块：网关的线路常量与响应校验。
//!
//! # Protocol Module
//!
//! Wire-level constants of the gateway and the response schema validator.
//!
//! The exact sentinel literal, data-line prefix and rate-limit header names are
//! provider specific, so they live in [`ProtocolConfig`] instead of being
//! hard-coded in the decoder or classifier. The defaults match OpenRouter.

pub mod validator;

pub use validator::ResponseKind;

/// Default OpenRouter API base URL.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Gateway wire configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    pub chat_path: String,
    pub models_path: String,
    pub credits_path: String,
    /// SSE field marker introducing a JSON payload.
    pub data_prefix: String,
    /// Payload literal that marks the end of a stream.
    pub done_signal: String,
    /// Headers carrying a relative wait in seconds (first match wins).
    pub retry_after_headers: Vec<String>,
    /// Headers carrying an absolute reset time (epoch seconds or milliseconds) or a relative seconds value.
    pub rate_limit_reset_headers: Vec<String>,
    /// Headers carrying the upstream request id.
    pub request_id_headers: Vec<String>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            chat_path: "/chat/completions".to_string(),
            models_path: "/models".to_string(),
            credits_path: "/credits".to_string(),
            data_prefix: "data:".to_string(),
            done_signal: "[DONE]".to_string(),
            retry_after_headers: vec!["retry-after".to_string()],
            rate_limit_reset_headers: vec!["x-ratelimit-reset".to_string()],
            request_id_headers: vec![
                "x-request-id".to_string(),
                "request-id".to_string(),
                "cf-ray".to_string(),
            ],
        }
    }
}

impl ProtocolConfig {
    pub fn with_done_signal(mut self, signal: impl Into<String>) -> Self {
        self.done_signal = signal.into();
        self
    }

    pub fn with_data_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.data_prefix = prefix.into();
        self
    }

    pub fn with_retry_after_headers(mut self, headers: Vec<String>) -> Self {
        self.retry_after_headers = headers;
        self
    }

    pub fn with_rate_limit_reset_headers(mut self, headers: Vec<String>) -> Self {
        self.rate_limit_reset_headers = headers;
        self
    }
}
