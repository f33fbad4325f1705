//! 请求执行逻辑：带重试、超时与取消的统一调度器。
//!
//! Request execution logic.
//!
//! One logical call = a loop of attempts. Every attempt runs under the
//! per-attempt timeout and every suspension point (send, body read, backoff
//! sleep) is raced against the call's cancellation token.

use crate::client::error_classification::{classify_status, header_first};
use crate::client::policy::{Decision, RetryPolicy};
use crate::client::types::{CallStats, ChatStream};
use crate::pipeline::decode::SseDecoder;
use crate::protocol::ProtocolConfig;
use crate::transport::{HttpRequest, Transport};
use crate::types::StreamChunk;
use crate::{BoxStream, Error, ErrorContext, ErrorKind, Result};
use futures::{stream, StreamExt};
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Parser applied to a successful unary body.
pub(crate) type BodyParser<T> = fn(&[u8]) -> Result<T>;

/// Outcome of one successful attempt.
struct Attempted<T> {
    value: T,
    http_status: u16,
    upstream_request_id: Option<String>,
}

pub(crate) struct Dispatcher {
    transport: Arc<dyn Transport>,
    protocol: ProtocolConfig,
    policy: RetryPolicy,
    attempt_timeout: Duration,
    api_key: SecretString,
    /// Static headers added to every request (attribution).
    extra_headers: Vec<(String, String)>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("protocol", &self.protocol)
            .field("policy", &self.policy)
            .field("attempt_timeout", &self.attempt_timeout)
            .field("api_key", &self.api_key)
            .field("extra_headers", &self.extra_headers)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        protocol: ProtocolConfig,
        policy: RetryPolicy,
        attempt_timeout: Duration,
        api_key: SecretString,
        extra_headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            transport,
            protocol,
            policy,
            attempt_timeout,
            api_key,
            extra_headers,
        }
    }

    pub(crate) fn protocol(&self) -> &ProtocolConfig {
        &self.protocol
    }

    pub(crate) fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub(crate) fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Run a unary call: send, read the whole body, parse.
    pub(crate) async fn unary<T>(
        &self,
        request: HttpRequest,
        parse: BodyParser<T>,
        cancel: &CancellationToken,
    ) -> Result<(T, CallStats)> {
        self.run(&request, cancel, |req, id| self.unary_attempt(req, id, parse))
            .await
    }

    /// Open a stream; retries cover everything up to the first decoded item.
    pub(crate) async fn stream(&self, request: HttpRequest, cancel: &CancellationToken) -> Result<ChatStream> {
        let request = request.header("accept", "text/event-stream");
        let (inner, stats) = self
            .run(&request, cancel, |req, id| self.stream_attempt(req, id))
            .await?;
        Ok(ChatStream::new(inner, cancel.child_token(), stats))
    }

    async fn run<'a, T, F, Fut>(
        &'a self,
        request: &'a HttpRequest,
        cancel: &CancellationToken,
        attempt_fn: F,
    ) -> Result<(T, CallStats)>
    where
        F: Fn(&'a HttpRequest, String) -> Fut,
        Fut: Future<Output = Result<Attempted<T>>>,
    {
        let start = Instant::now();
        let endpoint = request.path.as_str();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let client_request_id = Uuid::new_v4().to_string();
            debug!(
                attempt,
                endpoint,
                client_request_id = client_request_id.as_str(),
                "openrouter attempt"
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::cancelled("dispatcher")),
                r = tokio::time::timeout(self.attempt_timeout, attempt_fn(request, client_request_id.clone())) => {
                    match r {
                        Ok(inner) => inner,
                        Err(_) => Err(Error::network(
                            format!("attempt timed out after {} ms", self.attempt_timeout.as_millis()),
                            ErrorContext::new().with_source("attempt_timeout"),
                        )),
                    }
                }
            };

            let err = match outcome {
                Ok(done) => {
                    let stats = CallStats {
                        attempts: attempt,
                        retry_count: attempt - 1,
                        http_status: done.http_status,
                        duration_ms: start.elapsed().as_millis(),
                        client_request_id,
                        upstream_request_id: done.upstream_request_id,
                        endpoint: endpoint.to_string(),
                    };
                    return Ok((done.value, stats));
                }
                Err(e) => e.with_request_id(&client_request_id).with_attempts(attempt),
            };

            let delay = match self.policy.decide(&err, attempt) {
                Decision::Retry { delay } => delay,
                Decision::Fail => {
                    info!(
                        http_status = err.http_status().unwrap_or(0),
                        error_kind = err.kind().as_str(),
                        attempts = attempt,
                        endpoint,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "openrouter request failed"
                    );
                    return Err(err);
                }
            };

            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error_kind = err.kind().as_str(),
                endpoint,
                "openrouter attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(Error::cancelled("backoff").with_attempts(attempt));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Attach credentials, correlation id and static headers.
    fn prepare(&self, request: &HttpRequest, client_request_id: &str) -> HttpRequest {
        let mut req = request
            .clone()
            .sensitive_header(AUTHORIZATION, &format!("Bearer {}", self.api_key.expose_secret()))
            .header("x-request-id", client_request_id);
        if req.body.is_some() {
            req = req.header("content-type", "application/json");
        }
        for (name, value) in &self.extra_headers {
            req = req.header(name, value);
        }
        req
    }

    async fn unary_attempt<T>(
        &self,
        request: &HttpRequest,
        client_request_id: String,
        parse: BodyParser<T>,
    ) -> Result<Attempted<T>> {
        let resp = self.transport.send(self.prepare(request, &client_request_id)).await?;
        let status = resp.status;
        let headers = resp.headers.clone();
        let body = resp.bytes().await?;

        if !(200..300).contains(&status) {
            return Err(classify_status(status, &headers, &body, &self.protocol));
        }

        Ok(Attempted {
            value: parse(&body)?,
            http_status: status,
            upstream_request_id: header_first(&headers, &self.protocol.request_id_headers),
        })
    }

    async fn stream_attempt(
        &self,
        request: &HttpRequest,
        client_request_id: String,
    ) -> Result<Attempted<BoxStream<'static, StreamChunk>>> {
        let resp = self.transport.send(self.prepare(request, &client_request_id)).await?;
        let status = resp.status;
        let headers = resp.headers.clone();

        if !resp.is_success() {
            let body = resp.bytes().await?;
            return Err(classify_status(status, &headers, &body, &self.protocol));
        }

        let mut decoded = SseDecoder::from_config(&self.protocol).decode(resp.body);
        // Peek: failures up to the first item still belong to this attempt.
        // A malformed event is an item-level error and is handed out as such.
        let first = match decoded.next().await {
            Some(Err(e)) if e.kind() != ErrorKind::Validation => return Err(e),
            other => other,
        };

        Ok(Attempted {
            value: Box::pin(stream::iter(first).chain(decoded)),
            http_status: status,
            upstream_request_id: header_first(&headers, &self.protocol.request_id_headers),
        })
    }
}
