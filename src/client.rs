//! Async OpenRouter client.
//!
//! Developer-friendly goal: keep the public surface small and predictable.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
mod chat;
pub mod core;
mod endpoint;
pub(crate) mod error_classification;
pub(crate) mod execution;
pub mod policy;
pub mod types;

pub use builder::ClientBuilder;
pub use core::{Client, DEFAULT_MODEL};
pub use policy::{Decision, RetryPolicy};
pub use types::{CallHandle, CallStats, CancelHandle, ChatStream};
