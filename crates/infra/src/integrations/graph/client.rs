//! HTTP transport for the Graph provider
//!
//! [`GraphClient`] owns the reqwest client, the API base URL, and token
//! acquisition. Feature modules build requests through it and classify
//! non-success responses with [`GraphClient::check_status`]; all transport
//! failures come back as [`GraphError`] so callers never see raw reqwest
//! errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::errors::{GraphError, GraphErrorKind};

/// Production Graph API base.
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const ERROR_BODY_SNIPPET_LEN: usize = 200;

/// Supplies a bearer token for each outgoing request.
///
/// Implementations are expected to refresh expired tokens internally;
/// the client calls this once per attempt.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, GraphError>;
}

/// Token provider returning a fixed string. Intended for tests and
/// short-lived tools that already hold a token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, GraphError> {
        Ok(self.token.clone())
    }
}

/// Shared HTTP client for the Graph integration.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl GraphClient {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Result<Self, GraphError> {
        Self::with_base_url(GRAPH_API_BASE, tokens)
    }

    /// Construct against a non-default base URL (test servers, sovereign
    /// cloud endpoints).
    pub fn with_base_url(
        base_url: impl Into<String>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, GraphError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                GraphError::new(GraphErrorKind::Other, format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { http, base_url: base_url.into().trim_end_matches('/').to_string(), tokens })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request against `path` (leading slash expected) with the
    /// bearer token attached.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GraphError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Send a built request, mapping transport failures to [`GraphError`].
    pub async fn execute(
        &self,
        builder: RequestBuilder,
        operation: &str,
    ) -> Result<Response, GraphError> {
        builder.send().await.map_err(|e| GraphError::from_transport(&e, operation))
    }

    /// Classify a non-success response into a [`GraphError`], attaching a
    /// truncated body snippet as context. Success responses pass through.
    pub async fn check_status(
        &self,
        response: Response,
        operation: &str,
    ) -> Result<Response, GraphError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(ERROR_BODY_SNIPPET_LEN).collect();
        let mut err = GraphError::from_status(status.as_u16(), operation);
        if !snippet.is_empty() {
            err = err.with_context(snippet);
        }
        Err(err)
    }
}

/// Deserialize a response body, classifying malformed payloads.
pub async fn parse_json<T: DeserializeOwned>(
    response: Response,
    operation: &str,
) -> Result<T, GraphError> {
    response.json::<T>().await.map_err(|e| {
        GraphError::new(
            GraphErrorKind::Other,
            format!("malformed response body during {operation}: {e}"),
        )
    })
}
