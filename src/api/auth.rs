//! Auth endpoints: login, register, current user, refresh, revoke.

use reqwest::Method;

use super::ApiClient;
use crate::error::ApiError;
use crate::types::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenPair, User};

pub const LOGIN_ENDPOINT: &str = "/api/auth/login";
pub const REGISTER_ENDPOINT: &str = "/api/auth/register";
pub const ME_ENDPOINT: &str = "/api/auth/me";
pub const REFRESH_ENDPOINT: &str = "/api/auth/refresh";
pub const LOGOUT_ENDPOINT: &str = "/api/auth/logout";

/// The auth service as seen by the session manager.
///
/// Implemented by [`ApiClient`]; tests substitute a scripted mock.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /api/auth/login`.
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;

    /// `POST /api/auth/register`.
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;

    /// `GET /api/auth/me` with the access token as bearer.
    async fn get_profile(&self, access_token: &str) -> Result<User, ApiError>;

    /// `POST /api/auth/refresh`, exchanging the refresh token for a new pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError>;

    /// `POST /api/auth/logout`, revoking the access token server-side.
    async fn revoke(&self, access_token: &str) -> Result<(), ApiError>;
}

#[async_trait::async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.request(Method::POST, LOGIN_ENDPOINT, Some(request), None).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.request(Method::POST, REGISTER_ENDPOINT, Some(request), None).await
    }

    async fn get_profile(&self, access_token: &str) -> Result<User, ApiError> {
        self.request::<(), _>(Method::GET, ME_ENDPOINT, None, Some(access_token))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let body = RefreshRequest { refresh_token: refresh_token.to_owned() };
        self.request(Method::POST, REFRESH_ENDPOINT, Some(&body), None).await
    }

    async fn revoke(&self, access_token: &str) -> Result<(), ApiError> {
        self.request_no_content::<()>(Method::POST, LOGOUT_ENDPOINT, None, Some(access_token))
            .await
    }
}
