//! Graph integration error handling
//!
//! Every failure surfaced by this integration is a [`GraphError`] with a
//! stable [`GraphErrorKind`], a human-readable message, and optional
//! operation context. Callers outside the integration receive the domain
//! error produced by [`GraphError::into_domain_error`]; the kind decides
//! both the domain variant and whether the operation is retried.

use std::fmt;

use syncline_domain::SynclineError;

/// Stable classification of a Graph integration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphErrorKind {
    /// Input rejected before or by the provider (400/422).
    Validation,
    /// Provider throttling (429). Retryable.
    RateLimited,
    /// Transient upstream failure: 5xx or a transport error. Retryable.
    ServerError,
    /// Access denied by the provider (401/403).
    PermissionDenied,
    /// Optimistic concurrency token no longer matches (412).
    ConcurrencyConflict,
    /// Target resource does not exist (404).
    NotFound,
    /// Anything else. Not retryable.
    Other,
}

impl GraphErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::PermissionDenied => "permission_denied",
            Self::ConcurrencyConflict => "concurrency_conflict",
            Self::NotFound => "not_found",
            Self::Other => "other",
        }
    }
}

/// Error raised by the Graph integration.
#[derive(Debug, Clone)]
pub struct GraphError {
    kind: GraphErrorKind,
    message: String,
    context: Option<String>,
    /// Attempts consumed before the error was surfaced, when known.
    attempts: Option<u32>,
}

impl GraphError {
    pub fn new(kind: GraphErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), context: None, attempts: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(GraphErrorKind::Validation, message)
    }

    /// Classify an HTTP status returned by the provider.
    pub fn from_status(status: u16, operation: &str) -> Self {
        let (kind, message) = match status {
            400 | 422 => (
                GraphErrorKind::Validation,
                format!("provider rejected the {operation} request as invalid"),
            ),
            401 | 403 => (
                GraphErrorKind::PermissionDenied,
                format!("access denied for {operation}"),
            ),
            404 => (GraphErrorKind::NotFound, format!("resource not found during {operation}")),
            412 => (
                GraphErrorKind::ConcurrencyConflict,
                format!("concurrency token mismatch during {operation}"),
            ),
            429 => (GraphErrorKind::RateLimited, format!("rate limited during {operation}")),
            500..=599 => (
                GraphErrorKind::ServerError,
                format!("provider error {status} during {operation}"),
            ),
            _ => (GraphErrorKind::Other, format!("unexpected status {status} during {operation}")),
        };
        Self::new(kind, message)
    }

    /// Classify a transport failure from the HTTP client.
    pub fn from_transport(err: &reqwest::Error, operation: &str) -> Self {
        let detail = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "connection failed"
        } else {
            "transport error"
        };
        Self::new(GraphErrorKind::ServerError, format!("{detail} during {operation}"))
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn kind(&self) -> GraphErrorKind {
        self.kind
    }

    pub fn attempts(&self) -> Option<u32> {
        self.attempts
    }

    /// Whether the retry runner should try this operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, GraphErrorKind::RateLimited | GraphErrorKind::ServerError)
    }

    /// Convert to the domain error handed to callers.
    pub fn into_domain_error(self) -> SynclineError {
        let message = self.to_string();
        match self.kind {
            GraphErrorKind::Validation => SynclineError::InvalidInput(message),
            GraphErrorKind::RateLimited => SynclineError::RateLimited(message),
            GraphErrorKind::ServerError => SynclineError::Provider(message),
            GraphErrorKind::PermissionDenied => SynclineError::PermissionDenied(message),
            GraphErrorKind::ConcurrencyConflict => SynclineError::Conflict(message),
            GraphErrorKind::NotFound => SynclineError::NotFound(message),
            GraphErrorKind::Other => SynclineError::Provider(message),
        }
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        if let Some(attempts) = self.attempts {
            write!(f, " after {attempts} attempt(s)")?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for SynclineError {
    fn from(err: GraphError) -> Self {
        err.into_domain_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_expected_kinds() {
        assert_eq!(GraphError::from_status(400, "op").kind(), GraphErrorKind::Validation);
        assert_eq!(GraphError::from_status(403, "op").kind(), GraphErrorKind::PermissionDenied);
        assert_eq!(GraphError::from_status(404, "op").kind(), GraphErrorKind::NotFound);
        assert_eq!(GraphError::from_status(412, "op").kind(), GraphErrorKind::ConcurrencyConflict);
        assert_eq!(GraphError::from_status(429, "op").kind(), GraphErrorKind::RateLimited);
        assert_eq!(GraphError::from_status(503, "op").kind(), GraphErrorKind::ServerError);
        assert_eq!(GraphError::from_status(418, "op").kind(), GraphErrorKind::Other);
    }

    #[test]
    fn only_rate_limits_and_server_errors_are_retryable() {
        assert!(GraphError::from_status(429, "op").is_retryable());
        assert!(GraphError::from_status(502, "op").is_retryable());
        assert!(!GraphError::from_status(400, "op").is_retryable());
        assert!(!GraphError::from_status(403, "op").is_retryable());
        assert!(!GraphError::from_status(412, "op").is_retryable());
    }

    #[test]
    fn display_includes_context_and_attempts() {
        let err = GraphError::from_status(503, "createEvent")
            .with_context("batch index 1")
            .with_attempts(3);
        let text = err.to_string();
        assert!(text.contains("createEvent"));
        assert!(text.contains("batch index 1"));
        assert!(text.contains("3 attempt(s)"));
    }

    #[test]
    fn domain_conversion_preserves_classification() {
        let err = GraphError::from_status(412, "updateEvent").into_domain_error();
        assert!(matches!(err, SynclineError::Conflict(_)));

        let err = GraphError::validation("interval out of range").into_domain_error();
        assert!(matches!(err, SynclineError::InvalidInput(_)));
    }
}
