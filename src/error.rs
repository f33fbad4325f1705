use crate::transport::TransportError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path that caused the error (e.g., "request.temperature", "choices[0].message")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., upstream ids, raw body excerpts)
    pub details: Option<String>,
    /// Source of the error (e.g., "request_validator", "stream_decoder")
    pub source: Option<String>,
    /// HTTP status of the response that produced the error, if any
    pub status_code: Option<u16>,
    /// Client correlation id of the failing attempt
    pub request_id: Option<String>,
    /// Number of transport attempts made for the call
    pub attempts: u32,
    /// Set when the call was aborted through a cancellation token
    pub cancelled: bool,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

/// Closed classification of every failure the client can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Auth,
    RateLimit,
    Server,
    Network,
    Api,
}

impl ErrorKind {
    /// The single retryability predicate used by the retry policy.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::RateLimit | ErrorKind::Server
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Auth => "auth_error",
            ErrorKind::RateLimit => "rate_limit_error",
            ErrorKind::Server => "server_error",
            ErrorKind::Network => "network_error",
            ErrorKind::Api => "api_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the client.
///
/// Every failure path of the library ends in exactly one of these variants.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Authentication error: {message}{}", format_context(.context))]
    Auth {
        message: String,
        context: ErrorContext,
    },

    #[error("Rate limit exceeded: {message}{}", format_context(.context))]
    RateLimit {
        message: String,
        retry_after: Option<Duration>,
        context: ErrorContext,
    },

    #[error("Server error: {message}{}", format_context(.context))]
    Server {
        message: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}{}", format_context(.context))]
    Network {
        message: String,
        context: ErrorContext,
    },

    #[error("API error: {message}{}", format_context(.context))]
    Api {
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(status) = ctx.status_code {
        parts.push(format!("http_status: {}", status));
    }
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if ctx.attempts > 0 {
        parts.push(format!("attempts: {}", ctx.attempts));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::validation_with_context(msg, ErrorContext::new())
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Validation error pointing at a request or payload field.
    pub fn invalid_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::validation_with_context(
            msg,
            ErrorContext::new()
                .with_field_path(field)
                .with_source("request_validator"),
        )
    }

    pub fn auth(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Auth {
            message: msg.into(),
            context,
        }
    }

    pub fn rate_limit(
        msg: impl Into<String>,
        retry_after: Option<Duration>,
        context: ErrorContext,
    ) -> Self {
        Error::RateLimit {
            message: msg.into(),
            retry_after,
            context,
        }
    }

    pub fn server(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Server {
            message: msg.into(),
            context,
        }
    }

    pub fn network(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Network {
            message: msg.into(),
            context,
        }
    }

    pub fn api(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Api {
            message: msg.into(),
            context,
        }
    }

    /// Error surfaced when a call is aborted through its cancellation token.
    pub fn cancelled(source: &str) -> Self {
        let mut context = ErrorContext::new().with_source(source);
        context.cancelled = true;
        Error::Network {
            message: "call cancelled".to_string(),
            context,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Auth { .. } => ErrorKind::Auth,
            Error::RateLimit { .. } => ErrorKind::RateLimit,
            Error::Server { .. } => ErrorKind::Server,
            Error::Network { .. } => ErrorKind::Network,
            Error::Api { .. } => ErrorKind::Api,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Validation { message, .. }
            | Error::Auth { message, .. }
            | Error::RateLimit { message, .. }
            | Error::Server { message, .. }
            | Error::Network { message, .. }
            | Error::Api { message, .. } => message,
        }
    }

    /// Extract error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Error::Validation { context, .. }
            | Error::Auth { context, .. }
            | Error::RateLimit { context, .. }
            | Error::Server { context, .. }
            | Error::Network { context, .. }
            | Error::Api { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Error::Validation { context, .. }
            | Error::Auth { context, .. }
            | Error::RateLimit { context, .. }
            | Error::Server { context, .. }
            | Error::Network { context, .. }
            | Error::Api { context, .. } => context,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        self.context().status_code
    }

    /// Server-supplied wait hint, only ever present on rate limit errors.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Total attempts made before this error was surfaced (0 when no attempt was made).
    pub fn attempts(&self) -> u32 {
        self.context().attempts
    }

    pub fn is_cancelled(&self) -> bool {
        self.context().cancelled
    }

    pub fn is_retryable(&self) -> bool {
        !self.is_cancelled() && self.kind().is_retryable()
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.context_mut().attempts = attempts;
        self
    }

    pub(crate) fn with_request_id(mut self, id: &str) -> Self {
        let ctx = self.context_mut();
        if ctx.request_id.is_none() {
            ctx.request_id = Some(id.to_string());
        }
        self
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        crate::client::error_classification::classify_transport(&err)
    }
}
