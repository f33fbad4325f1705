use crate::client::core::Client;
use crate::client::execution::Dispatcher;
use crate::client::policy::RetryPolicy;
use crate::protocol::{ProtocolConfig, DEFAULT_BASE_URL};
use crate::transport::{HttpTransport, Transport};
use crate::{Error, ErrorContext, Result};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_BASE_URL: &str = "OPENROUTER_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "OPENROUTER_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "OPENROUTER_MAX_RETRIES";

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment values captured once, at build time.
#[derive(Debug, Default, Clone)]
pub(crate) struct EnvSnapshot {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<String>,
    pub max_retries: Option<String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: var(ENV_API_KEY),
            base_url: var(ENV_BASE_URL),
            timeout_secs: var(ENV_TIMEOUT_SECS),
            max_retries: var(ENV_MAX_RETRIES),
        }
    }
}

/// Builder for [`Client`] and [`crate::blocking::Client`].
///
/// Explicit setters win over environment variables:
/// - `OPENROUTER_API_KEY`
/// - `OPENROUTER_BASE_URL` (default `https://openrouter.ai/api/v1`)
/// - `OPENROUTER_TIMEOUT_SECS` (per-attempt timeout, default 30)
/// - `OPENROUTER_MAX_RETRIES` (default 3)
#[derive(Default)]
pub struct ClientBuilder {
    api_key: Option<SecretString>,
    base_url: Option<String>,
    proxy_url: Option<String>,
    attempt_timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_policy: Option<RetryPolicy>,
    protocol: Option<ProtocolConfig>,
    transport: Option<Arc<dyn Transport>>,
    http_referer: Option<String>,
    app_title: Option<String>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Override base URL (primarily for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Timeout applied to each attempt (send + body read, or send + first chunk).
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Inject a transport; the base URL and proxy settings are then unused.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// OpenRouter app attribution (`HTTP-Referer`).
    pub fn http_referer(mut self, referer: impl Into<String>) -> Self {
        self.http_referer = Some(referer.into());
        self
    }

    /// OpenRouter app attribution (`X-Title`).
    pub fn app_title(mut self, title: impl Into<String>) -> Self {
        self.app_title = Some(title.into());
        self
    }

    pub fn build(self) -> Result<Client> {
        self.build_with_env(EnvSnapshot::capture())
    }

    pub fn build_blocking(self) -> Result<crate::blocking::Client> {
        crate::blocking::Client::from_async(self.build()?)
    }

    pub(crate) fn build_with_env(self, env: EnvSnapshot) -> Result<Client> {
        let api_key = match self.api_key {
            Some(k) => k,
            None => SecretString::from(env.api_key.unwrap_or_default()),
        };
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::auth(
                format!("missing API key: set {} or call ClientBuilder::api_key", ENV_API_KEY),
                ErrorContext::new().with_source("client_builder"),
            ));
        }

        let attempt_timeout = match (self.attempt_timeout, env.timeout_secs) {
            (Some(t), _) => t,
            (None, Some(raw)) => {
                let secs = parse_env::<f64>(ENV_TIMEOUT_SECS, &raw)?;
                Duration::try_from_secs_f64(secs)
                    .map_err(|_| env_error(ENV_TIMEOUT_SECS, &raw))?
            }
            (None, None) => DEFAULT_ATTEMPT_TIMEOUT,
        };
        if attempt_timeout.is_zero() {
            return Err(Error::invalid_field("config.attempt_timeout", "attempt timeout must be positive"));
        }

        let explicit_policy = self.retry_policy.is_some();
        let mut policy = self.retry_policy.unwrap_or_default();
        match (self.max_retries, env.max_retries) {
            (Some(n), _) => policy.max_retries = n,
            (None, Some(raw)) if !explicit_policy => policy.max_retries = parse_env(ENV_MAX_RETRIES, &raw)?,
            _ => {}
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => {
                let base_url = self
                    .base_url
                    .or(env.base_url)
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
                Arc::new(HttpTransport::with_proxy(&base_url, self.proxy_url.as_deref())?)
            }
        };

        let mut extra_headers = Vec::new();
        if let Some(r) = self.http_referer {
            extra_headers.push(("HTTP-Referer".to_string(), r));
        }
        if let Some(t) = self.app_title {
            extra_headers.push(("X-Title".to_string(), t));
        }

        debug!(
            max_retries = policy.max_retries,
            attempt_timeout_ms = attempt_timeout.as_millis() as u64,
            "openrouter client configured"
        );

        Ok(Client::from_dispatcher(Dispatcher::new(
            transport,
            self.protocol.unwrap_or_default(),
            policy,
            attempt_timeout,
            api_key,
            extra_headers,
        )))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| env_error(name, raw))
}

fn env_error(name: &str, raw: &str) -> Error {
    Error::validation_with_context(
        format!("invalid value '{}' for {}", raw, name),
        ErrorContext::new()
            .with_field_path(format!("env.{}", name))
            .with_source("client_builder"),
    )
}
