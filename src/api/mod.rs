//! HTTP gateway to the Student Employment REST service.
//!
//! DESIGN
//! ======
//! `ApiClient` is a thin reqwest wrapper: one request in, one typed result or
//! [`ApiError`] out. It never retries and never touches the token store; the
//! session manager decides what a failure means.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures map to `ApiError::Network`. Non-success statuses go
//! through [`crate::error::decode_error_body`]. A success status whose body is
//! not the expected JSON maps to `ApiError::UnexpectedResponse`.

pub mod auth;
pub mod students;

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use auth::AuthApi;
pub use students::StudentsApi;

use crate::config::{ClientConfig, Timeouts};
use crate::error::{ApiError, decode_error_body};

// =============================================================================
// CLIENT
// =============================================================================

/// Shared HTTP client bound to one base URL. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// Raw non-error response: status plus body bytes.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiClient {
    /// Build a client for `base_url` with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: crate::config::normalize_url(base_url) })
    }

    /// Build a client from parsed config, routing through the gateway when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.effective_base_url(), config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Issue a request and decode a JSON success body into `T`.
    ///
    /// Attaches `Authorization: Bearer <token>` when `bearer` is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-success status, or an
    /// undecodable success body.
    pub async fn request<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let raw = self.execute(method, endpoint, body, bearer).await?;
        decode_success(&raw)
    }

    /// Issue a request whose success body is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-success status.
    pub async fn request_no_content<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.execute(method, endpoint, body, bearer).await.map(|_| ())
    }

    pub(crate) async fn execute<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<RawResponse, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut request = self
            .http
            .request(method.clone(), self.url(endpoint))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(json) = body {
            request = request.json(json);
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, endpoint, error = %e, "request failed before response");
            ApiError::from(e)
        })?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        tracing::debug!(%method, endpoint, status = status.as_u16(), "api response");

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown Status");
            return Err(decode_error_body(status.as_u16(), reason, &body));
        }

        Ok(RawResponse { status: status.as_u16(), body })
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn decode_success<T: DeserializeOwned>(raw: &RawResponse) -> Result<T, ApiError> {
    serde_json::from_slice(&raw.body)
        .map_err(|e| ApiError::UnexpectedResponse { status: raw.status, detail: e.to_string() })
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
