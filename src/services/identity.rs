//! Identity provider client — password sign-in, session validation, sign-out.
//!
//! DESIGN
//! ======
//! The hosted identity service is reached over its REST surface. Everything
//! sits behind the [`IdentityProvider`] trait so routes and services can be
//! tested against in-memory fakes. Credential failures collapse into one
//! opaque variant: callers must not be able to tell which factor was wrong.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// TYPES
// =============================================================================

/// Identity attested by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Server-attested proof of a successful sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Wrong email or password. Deliberately carries no detail.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("identity request failed: {0}")]
    Request(String),
    #[error("identity api error: status {status}")]
    Api { status: u16 },
    #[error("identity response parse failed: {0}")]
    Parse(String),
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
}

/// Narrow contract over the hosted identity service.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Any denial surfaces as [`IdentityError::InvalidCredentials`];
    /// transport and server faults keep their own variants.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Validate an access token. `Ok(None)` means expired or invalid.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport or server faults.
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, IdentityError>;

    /// Terminate the session behind the token.
    ///
    /// # Errors
    ///
    /// Returns an error for transport faults; an already-dead token is fine.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl HttpIdentityProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &crate::config::Config) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| IdentityError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.provider_url.clone(),
            anon_key: config.provider_anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{path}", self.base_url)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("/token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        // 4xx denials all mean "no": anything finer would leak which factor failed.
        if matches!(status, 400 | 401 | 403 | 422) {
            return Err(IdentityError::InvalidCredentials);
        }
        if status != 200 {
            return Err(IdentityError::Api { status });
        }
        parse_token_response(&text)
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, IdentityError> {
        let response = self
            .http
            .get(self.endpoint("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if matches!(status, 400 | 401 | 403) {
            return Ok(None);
        }
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        if status != 200 {
            return Err(IdentityError::Api { status });
        }
        parse_user(&text).map(Some)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.endpoint("/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        // An invalid token is already signed out as far as we care.
        if status >= 500 {
            return Err(IdentityError::Api { status });
        }
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: User,
}

fn parse_token_response(json: &str) -> Result<Session, IdentityError> {
    let resp: TokenResponse = serde_json::from_str(json).map_err(|e| IdentityError::Parse(e.to_string()))?;
    Ok(Session { access_token: resp.access_token, user: resp.user })
}

fn parse_user(json: &str) -> Result<User, IdentityError> {
    serde_json::from_str(json).map_err(|e| IdentityError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
