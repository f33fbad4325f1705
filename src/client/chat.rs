//! 对话接口：一元与流式补全。
//!
//! Chat completion entry points.

use crate::client::core::{Client, DEFAULT_MODEL};
use crate::client::types::{CallStats, ChatStream};
use crate::protocol::validator::parse_chat_completion;
use crate::transport::HttpRequest;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatOptions};
use crate::{BoxStream, Error, ErrorContext, Result};
use futures::{future, StreamExt};

impl Client {
    /// Single user prompt in, assistant text out.
    pub async fn simple_completion(&self, prompt: &str, model: Option<&str>) -> Result<String> {
        let response = self
            .chat_completion(
                vec![ChatMessage::user(prompt)],
                model.unwrap_or(DEFAULT_MODEL),
                None,
            )
            .await?;
        Ok(response.content().to_string())
    }

    /// Streamed variant of [`Client::simple_completion`] yielding text fragments.
    ///
    /// Empty fragments (role-only or finish-only chunks) are skipped.
    pub async fn simple_completion_stream(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<BoxStream<'static, String>> {
        let stream = self
            .stream_completion(
                vec![ChatMessage::user(prompt)],
                model.unwrap_or(DEFAULT_MODEL),
                None,
            )
            .await?;
        Ok(Box::pin(stream.filter_map(|item| {
            future::ready(match item {
                Ok(chunk) if chunk.content.is_empty() => None,
                Ok(chunk) => Some(Ok(chunk.content)),
                Err(e) => Some(Err(e)),
            })
        })))
    }

    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: Option<ChatOptions>,
    ) -> Result<ChatCompletionResponse> {
        self.chat_completion_with_stats(messages, model, options)
            .await
            .map(|(resp, _)| resp)
    }

    pub async fn chat_completion_with_stats(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: Option<ChatOptions>,
    ) -> Result<(ChatCompletionResponse, CallStats)> {
        let request =
            ChatCompletionRequest::from_options(model, messages, options.unwrap_or_default(), false)?;
        self.send_with_stats(&request).await
    }

    pub async fn stream_completion(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: Option<ChatOptions>,
    ) -> Result<ChatStream> {
        let request =
            ChatCompletionRequest::from_options(model, messages, options.unwrap_or_default(), true)?;
        self.send_stream(&request).await
    }

    /// Send a prebuilt unary request.
    pub async fn send(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        self.send_with_stats(request).await.map(|(resp, _)| resp)
    }

    pub async fn send_with_stats(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<(ChatCompletionResponse, CallStats)> {
        if request.is_stream() {
            return Err(stream_flag_mismatch("stream requests must use send_stream"));
        }
        let http = HttpRequest::post(self.inner.protocol().chat_path.clone(), request.to_json()?);
        self.inner.unary(http, parse_chat_completion, &self.cancel).await
    }

    /// Send a prebuilt streaming request.
    pub async fn send_stream(&self, request: &ChatCompletionRequest) -> Result<ChatStream> {
        if !request.is_stream() {
            return Err(stream_flag_mismatch("unary requests must use send"));
        }
        let http = HttpRequest::post(self.inner.protocol().chat_path.clone(), request.to_json()?);
        self.inner.stream(http, &self.cancel).await
    }
}

fn stream_flag_mismatch(msg: &str) -> Error {
    Error::validation_with_context(
        msg,
        ErrorContext::new()
            .with_field_path("request.stream")
            .with_source("dispatcher"),
    )
}
