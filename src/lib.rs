//! # openrouter-rust
//!
//! OpenRouter 网关的强类型 Rust 客户端：对话补全、SSE 流式输出、模型列表与账户余额。
//!
//! Typed client for the OpenRouter gateway - an OpenAI-compatible HTTP API
//! that fronts many model providers.
//!
//! ## Overview
//!
//! Every operation goes through one dispatcher which owns the retry policy,
//! the per-attempt timeout, cancellation and error classification. Two facades
//! sit on top of it:
//!
//! - [`Client`]: async, each call a future; [`Client::spawn`] runs a call as
//!   an independent, cancellable task.
//! - [`blocking::Client`]: drives the same dispatcher on the caller's thread.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use openrouter_rust::{ChatMessage, Client};
//!
//! #[tokio::main]
//! async fn main() -> openrouter_rust::Result<()> {
//!     let client = Client::builder().api_key("sk-or-...").build()?;
//!
//!     let reply = client.simple_completion("Say hi", Some("openai/gpt-4o-mini")).await?;
//!     println!("{reply}");
//!
//!     let mut stream = client
//!         .stream_completion(vec![ChatMessage::user("Count to 3")], "openai/gpt-4o-mini", None)
//!         .await?;
//!     while let Some(chunk) = stream.next().await {
//!         print!("{}", chunk?.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Async facade, builder, dispatcher, retry policy |
//! | [`blocking`] | Blocking facade over the same dispatcher |
//! | [`types`] | Messages, requests, responses, chunks, models, credits |
//! | [`protocol`] | Wire constants and the response schema validator |
//! | [`pipeline`] | SSE stream decoder |
//! | [`transport`] | `Transport` seam and the `reqwest` implementation |
//! | [`error`] | Error taxonomy |

pub mod blocking;
pub mod client;
pub mod pipeline;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{
    CallHandle, CallStats, CancelHandle, ChatStream, Client, ClientBuilder, Decision, RetryPolicy,
};
pub use protocol::ProtocolConfig;
pub use transport::{HttpTransport, Transport};
pub use types::{
    BalanceInfo, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatOptions,
    FinishReason, MessageRole, ModelInfo, StreamChunk, Usage,
};

pub use tokio_util::sync::CancellationToken;

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};
