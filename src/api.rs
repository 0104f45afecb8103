//! REST client for the bookkeeping backend.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns a typed [`ApiError`]. The session layer collapses all
//! of them into "not authenticated"; the distinction only survives in logs.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::identity::Role;

pub const VERIFY_PATH: &str = "/api/auth/verify";

/// Errors produced by backend API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned status {status}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// HTTP status when the backend answered, `None` for transport failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Body of `GET /api/auth/verify`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VerifyResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<VerifiedUser>,
}

impl VerifyResponse {
    /// Role the backend vouches for, only when it reports success.
    #[must_use]
    pub fn confirmed_role(&self) -> Option<&Role> {
        if !self.success {
            return None;
        }
        self.user.as_ref().and_then(|u| u.role.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VerifiedUser {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

// =============================================================================
// AUTH API TRAIT
// =============================================================================

/// Token verification seam. Enables mocking the backend in tests.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Verify `token` against the backend.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-success status, or
    /// an undecodable body.
    async fn verify(&self, token: &str) -> Result<VerifyResponse, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// `reqwest`-backed client for the backend REST API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build a client from config.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the TLS backend cannot be set up.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_timeouts(&config.api_base_url, config.timeouts.request(), config.timeouts.connect())
    }

    /// Build a client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the TLS backend cannot be set up.
    pub fn with_timeouts(base_url: &str, request: Duration, connect: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(request)
            .connect_timeout(connect)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Issue an authenticated GET and decode the JSON body.
    pub(crate) async fn get_json<T, Q>(&self, path: &str, token: Option<&str>, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let mut req = self
            .http
            .get(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .query(query);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| ApiError::Request(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| ApiError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), body: text });
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpApi {
    async fn verify(&self, token: &str) -> Result<VerifyResponse, ApiError> {
        self.get_json(VERIFY_PATH, Some(token), &[] as &[(&str, &str)]).await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
