//! 类型系统模块：定义网关请求与响应的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of everything that crosses the wire.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatMessage`] | Chat message with role, content and optional author name |
//! | [`ChatCompletionRequest`] | Validated completion request |
//! | [`ChatOptions`] | Facade-level request options |
//! | [`ChatCompletionResponse`] | Unary completion response |
//! | [`StreamChunk`] | One streamed fragment |
//! | [`ModelInfo`] | Model catalogue entry |
//! | [`BalanceInfo`] | Account credits |
//!
//! ## Example
//!
//! ```rust
//! use openrouter_rust::types::{ChatCompletionRequest, ChatMessage};
//!
//! let request = ChatCompletionRequest::builder("openai/gpt-4o-mini")
//!     .message(ChatMessage::system("You are terse"))
//!     .message(ChatMessage::user("Name a prime"))
//!     .temperature(0.2)
//!     .build()?;
//! assert_eq!(request.messages().len(), 2);
//! # Ok::<(), openrouter_rust::Error>(())
//! ```

pub mod balance;
pub mod message;
pub mod model;
pub mod request;
pub mod response;
pub mod stream;

pub use balance::BalanceInfo;
pub use message::{ChatMessage, MessageRole};
pub use model::{ModelInfo, Pricing};
pub use request::{ChatCompletionRequest, ChatCompletionRequestBuilder, ChatOptions};
pub use response::{ChatCompletionResponse, Choice, Usage};
pub use stream::{ChunkAccumulator, FinishReason, StreamChunk};
