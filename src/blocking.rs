//! 阻塞式客户端：在调用线程上同步驱动同一调度器。
//!
//! Blocking facade.
//!
//! Owns a current-thread tokio runtime and drives the async [`crate::Client`]
//! with `block_on`, so dispatch, retry and decoding are the exact same code
//! as the async facade. Do not use from inside an async runtime (same rule as
//! `reqwest::blocking`).

use crate::client::{CallStats, CancelHandle, ChatStream, ClientBuilder};
use crate::types::{
    BalanceInfo, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatOptions, ModelInfo,
    StreamChunk,
};
use crate::{Error, ErrorContext, Result};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

/// Synchronous OpenRouter client.
#[derive(Debug, Clone)]
pub struct Client {
    inner: crate::Client,
    runtime: Arc<Runtime>,
}

impl Client {
    /// Build from the environment (`OPENROUTER_API_KEY`, ...).
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build_blocking()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn from_async(inner: crate::Client) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::network(
                    format!("failed to start blocking runtime: {}", e),
                    ErrorContext::new().with_source("blocking_client"),
                )
            })?;
        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    /// A clone whose calls are cancelled when `token` fires (e.g. from another thread).
    pub fn with_cancel(&self, token: CancellationToken) -> Self {
        Self {
            inner: self.inner.with_cancel(token),
            runtime: Arc::clone(&self.runtime),
        }
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    pub fn simple_completion(&self, prompt: &str, model: Option<&str>) -> Result<String> {
        self.block_on(self.inner.simple_completion(prompt, model))
    }

    pub fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: Option<ChatOptions>,
    ) -> Result<ChatCompletionResponse> {
        self.block_on(self.inner.chat_completion(messages, model, options))
    }

    pub fn stream_completion(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: Option<ChatOptions>,
    ) -> Result<ChatStreamIter> {
        let stream = self.block_on(self.inner.stream_completion(messages, model, options))?;
        Ok(ChatStreamIter::new(stream, Arc::clone(&self.runtime)))
    }

    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        self.block_on(self.inner.list_models())
    }

    pub fn get_balance(&self) -> Result<BalanceInfo> {
        self.block_on(self.inner.get_balance())
    }

    pub fn send(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        self.block_on(self.inner.send(request))
    }

    pub fn send_stream(&self, request: &ChatCompletionRequest) -> Result<ChatStreamIter> {
        let stream = self.block_on(self.inner.send_stream(request))?;
        Ok(ChatStreamIter::new(stream, Arc::clone(&self.runtime)))
    }
}

/// Blocking iterator over a streamed completion; one `block_on` per chunk.
#[derive(Debug)]
pub struct ChatStreamIter {
    stream: ChatStream,
    runtime: Arc<Runtime>,
}

impl ChatStreamIter {
    fn new(stream: ChatStream, runtime: Arc<Runtime>) -> Self {
        Self { stream, runtime }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.stream.cancel_handle()
    }

    pub fn stats(&self) -> &CallStats {
        self.stream.stats()
    }

    /// Drain the remaining chunks into a response.
    pub fn collect_response(self) -> Result<ChatCompletionResponse> {
        let Self { stream, runtime } = self;
        runtime.block_on(stream.collect_response())
    }
}

impl Iterator for ChatStreamIter {
    type Item = Result<StreamChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}
