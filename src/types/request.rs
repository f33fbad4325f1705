//! Chat completion request model.
//!
//! Requests are validated when they are built, so an invalid request can never
//! reach the dispatcher.

use super::message::ChatMessage;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};

const RESERVED_KEYS: &[&str] = &[
    "model",
    "messages",
    "stream",
    "max_tokens",
    "temperature",
    "top_p",
];

/// A validated chat completion request. Single-use input, never mutated after `build()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ChatCompletionRequest {
    pub fn builder(model: impl Into<String>) -> ChatCompletionRequestBuilder {
        ChatCompletionRequestBuilder::new(model)
    }

    /// Build directly from facade-level options.
    pub fn from_options(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        stream: bool,
    ) -> Result<Self> {
        let mut b = Self::builder(model).messages(messages).stream(stream);
        b.max_tokens = options.max_tokens;
        b.temperature = options.temperature;
        b.top_p = options.top_p;
        b.extra = options.extra;
        b.build()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    pub fn is_stream(&self) -> bool {
        self.stream
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Wire JSON body.
    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| {
            Error::invalid_field("request", format!("request is not serializable: {}", e))
        })
    }
}

/// Builder for [`ChatCompletionRequest`].
#[derive(Debug, Clone)]
pub struct ChatCompletionRequestBuilder {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    stream: bool,
    extra: Map<String, Value>,
}

impl ChatCompletionRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            stream: false,
            extra: Map::new(),
        }
    }

    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Provider-specific option passed through verbatim (e.g. "top_k", "provider", "transforms").
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<ChatCompletionRequest> {
        if self.model.trim().is_empty() {
            return Err(Error::invalid_field("request.model", "model must not be empty"));
        }
        if self.messages.is_empty() {
            return Err(Error::invalid_field(
                "request.messages",
                "messages must contain at least one message",
            ));
        }
        if let Some(t) = self.temperature {
            if !t.is_finite() || !(0.0..=2.0).contains(&t) {
                return Err(Error::invalid_field(
                    "request.temperature",
                    format!("temperature must be within 0.0..=2.0, got {}", t),
                ));
            }
        }
        if let Some(p) = self.top_p {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(Error::invalid_field(
                    "request.top_p",
                    format!("top_p must be within 0.0..=1.0, got {}", p),
                ));
            }
        }
        if self.max_tokens == Some(0) {
            return Err(Error::invalid_field(
                "request.max_tokens",
                "max_tokens must be a positive integer",
            ));
        }
        if let Some(key) = self.extra.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
            return Err(Error::invalid_field(
                format!("request.extra.{}", key),
                format!("'{}' must be set through its dedicated setter", key),
            ));
        }

        Ok(ChatCompletionRequest {
            model: self.model,
            messages: self.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            stream: self.stream,
            extra: self.extra,
        })
    }
}

/// Facade-level chat options (developer-friendly, small surface).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub extra: Map<String, Value>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}
