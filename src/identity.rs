//! Hosted identity provider integration.
//!
//! Credentials never touch this service: signup and password login are
//! proxied straight to the provider, and bearer tokens presented by clients
//! are resolved back to a user identity with one provider call per request.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A user as the identity provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: Option<String>,
}

/// Result of a successful password login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: UserIdentity,
}

/// Seam over the hosted identity service, injectable so tests can substitute
/// a fake that resolves canned tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new user. The provider owns credential storage.
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity>;

    /// Password grant. Returns the access token clients use from then on.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Resolve a bearer token to the user it belongs to, or None when the
    /// token is invalid or expired.
    async fn resolve_token(&self, token: &str) -> Result<Option<UserIdentity>>;
}

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(alias = "msg", alias = "error_description")]
    message: Option<String>,
}

/// REST client for the hosted identity service.
#[derive(Debug, Clone)]
pub struct HostedIdentityClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl HostedIdentityClient {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Best-effort extraction of the provider's error message for 4xx
    /// responses; falls back to a generic message so nothing internal leaks.
    async fn error_message(response: reqwest::Response, fallback: &str) -> String {
        response
            .json::<ProviderError>()
            .await
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let response = self
            .client
            .post(self.url("/auth/v1/signup"))
            .header("apikey", &self.service_key)
            .json(&CredentialsRequest { email, password })
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Identity provider error: {}", e)))?;

        match response.status() {
            s if s.is_success() => response
                .json()
                .await
                .map_err(|e| AppError::Internal(format!("Identity provider response: {}", e))),
            s if s.is_client_error() => Err(AppError::BadRequest(
                Self::error_message(response, "Signup failed").await,
            )),
            s => Err(AppError::Internal(format!("Identity provider status: {}", s))),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .client
            .post(self.url("/auth/v1/token?grant_type=password"))
            .header("apikey", &self.service_key)
            .json(&CredentialsRequest { email, password })
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Identity provider error: {}", e)))?;

        match response.status() {
            s if s.is_success() => response
                .json()
                .await
                .map_err(|e| AppError::Internal(format!("Identity provider response: {}", e))),
            s if s.is_client_error() => Err(AppError::Unauthorized),
            s => Err(AppError::Internal(format!("Identity provider status: {}", s))),
        }
    }

    async fn resolve_token(&self, token: &str) -> Result<Option<UserIdentity>> {
        let response = self
            .client
            .get(self.url("/auth/v1/user"))
            .header("apikey", &self.service_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Identity provider error: {}", e)))?;

        match response.status() {
            s if s.is_success() => {
                let user = response.json().await.map_err(|e| {
                    AppError::Internal(format!("Identity provider response: {}", e))
                })?;
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            s => Err(AppError::Internal(format!("Identity provider status: {}", s))),
        }
    }
}
