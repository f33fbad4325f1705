//! Streamed completion chunks.

use super::message::{ChatMessage, MessageRole};
use super::response::{ChatCompletionResponse, Choice, Usage};
use serde::{Deserialize, Serialize};

/// Why a choice stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    /// Any reason this client does not know yet.
    #[serde(other)]
    Other,
}

/// One incremental fragment of a streamed completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub index: u32,
    /// Content fragment; empty for role-only or finish-only deltas.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamChunk {
    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// Folds chunks into the response an equivalent unary call would have returned.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<(u32, String, Option<FinishReason>)>,
    usage: Option<Usage>,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &StreamChunk) {
        if self.id.is_none() {
            self.id = chunk.id.clone();
        }
        if self.model.is_none() {
            self.model = chunk.model.clone();
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }
        match self.choices.iter_mut().find(|(i, _, _)| *i == chunk.index) {
            Some((_, text, finish)) => {
                text.push_str(&chunk.content);
                if chunk.finish_reason.is_some() {
                    *finish = chunk.finish_reason;
                }
            }
            None => self
                .choices
                .push((chunk.index, chunk.content.clone(), chunk.finish_reason)),
        }
    }

    pub fn finish(mut self, created: i64) -> ChatCompletionResponse {
        self.choices.sort_by_key(|(i, _, _)| *i);
        ChatCompletionResponse {
            id: self.id.unwrap_or_default(),
            object: Some("chat.completion".to_string()),
            model: self.model.unwrap_or_default(),
            created,
            choices: self
                .choices
                .into_iter()
                .map(|(index, text, finish_reason)| Choice {
                    index,
                    message: ChatMessage::assistant(text),
                    finish_reason,
                })
                .collect(),
            usage: self.usage,
        }
    }
}
