//! 响应校验器：把原始 JSON 负载解析为强类型对象或错误。
//!
//! Response schema validator.
//!
//! Strict typed deserialization at the boundary: unknown fields are ignored,
//! missing required fields fail closed with a `Validation` error naming the
//! field. A success body that actually carries an `error` object is routed to
//! the error classifier.

use crate::client::error_classification::classify_error_body;
use crate::types::balance::CreditsEnvelope;
use crate::types::message::MessageRole;
use crate::types::model::ModelList;
use crate::types::{BalanceInfo, ChatCompletionResponse, FinishReason, ModelInfo, StreamChunk, Usage};
use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// The payload shape a caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    ChatCompletion,
    ModelList,
    Credits,
    StreamEvent,
}

impl ResponseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::ChatCompletion => "chat_completion",
            ResponseKind::ModelList => "model_list",
            ResponseKind::Credits => "credits",
            ResponseKind::StreamEvent => "stream_event",
        }
    }
}

pub fn parse_chat_completion(bytes: &[u8]) -> Result<ChatCompletionResponse> {
    parse_typed(bytes, ResponseKind::ChatCompletion)
}

pub fn parse_model_list(bytes: &[u8]) -> Result<Vec<ModelInfo>> {
    parse_typed::<ModelList>(bytes, ResponseKind::ModelList).map(|l| l.data)
}

pub fn parse_credits(bytes: &[u8]) -> Result<BalanceInfo> {
    parse_typed::<CreditsEnvelope>(bytes, ResponseKind::Credits).map(|e| e.data.into())
}

/// Parse one streamed event payload into zero or more chunks (one per choice).
pub fn parse_stream_event(payload: &str) -> Result<Vec<StreamChunk>> {
    let event: StreamEvent = parse_typed(payload.as_bytes(), ResponseKind::StreamEvent)?;
    let usage = event.usage;
    let last = event.choices.len().saturating_sub(1);
    Ok(event
        .choices
        .into_iter()
        .enumerate()
        .map(|(pos, c)| StreamChunk {
            id: event.id.clone(),
            model: event.model.clone(),
            index: c.index,
            content: c.delta.content.unwrap_or_default(),
            role: c.delta.role,
            finish_reason: c.finish_reason,
            // Usage belongs to the event, report it once.
            usage: if pos == last { usage } else { None },
        })
        .collect())
}

/// Deserialize `bytes` as `T`, routing embedded error objects to the classifier.
pub fn parse_typed<T: DeserializeOwned>(bytes: &[u8], kind: ResponseKind) -> Result<T> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        Error::validation_with_context(
            format!("malformed {} payload: {}", kind.as_str(), e),
            ErrorContext::new()
                .with_source("response_validator")
                .with_details(excerpt(bytes)),
        )
    })?;

    if let Some(err) = value.get("error").filter(|e| e.is_object()) {
        return Err(classify_error_body(err, None));
    }

    serde_json::from_value(value).map_err(|e| {
        let message = e.to_string();
        let mut context = ErrorContext::new().with_source("response_validator");
        if let Some(field) = missing_field(&message) {
            context = context.with_field_path(format!("{}.{}", kind.as_str(), field));
        }
        Error::validation_with_context(format!("invalid {} payload: {}", kind.as_str(), message), context)
    })
}

// serde reports missing fields as "missing field `name`".
fn missing_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

fn excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.chars().take(200).collect()
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<FinishReason>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    role: Option<MessageRole>,
    #[serde(default)]
    content: Option<String>,
}
