//! 调用元数据与取消控制：CallStats、CancelHandle、ChatStream、CallHandle。
//!
//! Call metadata and cancellation primitives shared by the facades.

use crate::types::{ChatCompletionResponse, ChunkAccumulator, StreamChunk};
use crate::{BoxStream, Error, Result};
use futures::{Future, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Per-call metadata for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStats {
    /// Transport attempts made, including the successful one.
    pub attempts: u32,
    pub retry_count: u32,
    pub http_status: u16,
    pub duration_ms: u128,
    /// `x-request-id` sent on the successful attempt.
    pub client_request_id: String,
    pub upstream_request_id: Option<String>,
    pub endpoint: String,
}

/// Cancels one call or one stream.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A streamed completion.
///
/// Chunks arrive in server order. Once cancelled the next poll yields `None`;
/// dropping the stream releases the connection.
pub struct ChatStream {
    inner: BoxStream<'static, StreamChunk>,
    token: CancellationToken,
    cancelled: Pin<Box<dyn Future<Output = ()> + Send>>,
    stats: CallStats,
    done: bool,
}

impl ChatStream {
    pub(crate) fn new(inner: BoxStream<'static, StreamChunk>, token: CancellationToken, stats: CallStats) -> Self {
        let waiter = token.clone();
        Self {
            inner,
            token,
            cancelled: Box::pin(async move { waiter.cancelled().await }),
            stats,
            done: false,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(self.token.clone())
    }

    /// Metadata of the attempt that opened the stream.
    pub fn stats(&self) -> &CallStats {
        &self.stats
    }

    /// Drain the stream into the response an equivalent unary call returns.
    ///
    /// The first error item ends collection.
    pub async fn collect_response(mut self) -> Result<ChatCompletionResponse> {
        let mut acc = ChunkAccumulator::new();
        while let Some(item) = self.next().await {
            acc.push(&item?);
        }
        if self.token.is_cancelled() {
            return Err(Error::cancelled("chat_stream"));
        }
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Ok(acc.finish(created))
    }
}

impl Stream for ChatStream {
    type Item = Result<StreamChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        if self.cancelled.as_mut().poll(cx).is_ready() {
            self.done = true;
            return Poll::Ready(None);
        }
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(None) => {
                self.done = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("stats", &self.stats)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

/// An operation running as its own tokio task.
///
/// Awaiting the handle yields the operation's result. `cancel()` fires the
/// call's token; the operation then ends with a cancelled `NetworkError`.
/// Dropping the handle detaches the task without cancelling it.
pub struct CallHandle<T> {
    join: JoinHandle<Result<T>>,
    token: CancellationToken,
}

impl<T> CallHandle<T> {
    pub(crate) fn new(join: JoinHandle<Result<T>>, token: CancellationToken) -> Self {
        Self { join, token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(self.token.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl<T> Future for CallHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.join).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::cancelled("call_handle"))),
        }
    }
}
