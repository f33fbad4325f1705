use crate::client::builder::ClientBuilder;
use crate::client::execution::Dispatcher;
use crate::client::policy::RetryPolicy;
use crate::client::types::CallHandle;
use crate::protocol::ProtocolConfig;
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default model for [`Client::simple_completion`] when none is given.
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Async OpenRouter client.
///
/// Cheap to clone; clones share the connection pool. Each clone carries a
/// cancellation token that every call made through it races against.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) inner: Arc<Dispatcher>,
    pub(crate) cancel: CancellationToken,
}

impl Client {
    /// Build a client from the environment (`OPENROUTER_API_KEY`, ...).
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(dispatcher),
            cancel: CancellationToken::new(),
        }
    }

    /// A clone whose calls are cancelled when `token` fires.
    pub fn with_cancel(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: token,
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `op` as an independent tokio task.
    ///
    /// The task receives a client bound to a fresh child token; cancelling the
    /// returned handle (or this client's token) aborts the operation at its
    /// next suspension point. Must be called from within a tokio runtime.
    ///
    /// ```rust,no_run
    /// # async fn demo(client: openrouter_rust::Client) -> openrouter_rust::Result<()> {
    /// let handle = client.spawn(|c| async move { c.simple_completion("Hi", None).await });
    /// let text = handle.await?;
    /// # Ok(()) }
    /// ```
    pub fn spawn<F, Fut, T>(&self, op: F) -> CallHandle<T>
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let token = self.cancel.child_token();
        let join = tokio::spawn(op(self.with_cancel(token.clone())));
        CallHandle::new(join, token)
    }

    pub fn protocol(&self) -> &ProtocolConfig {
        self.inner.protocol()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.inner.policy()
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.inner.attempt_timeout()
    }
}
