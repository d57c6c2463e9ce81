//! Token acquisition via OAuth2 client-credentials exchange

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Safety margin subtracted from the token lifetime before a refresh
pub const REFRESH_SKEW: Duration = Duration::from_secs(60);

/// A bearer token obtained from the authorization server
///
/// Holds the access token behind [`SecretString`] so it never shows up in
/// Debug output, together with its expiry instant.
#[derive(Debug, Clone)]
pub struct BearerToken {
    secret: SecretString,
    expires_at: Instant,
}

impl BearerToken {
    /// Wrap a freshly issued token with its lifetime
    #[must_use]
    pub fn new(access_token: String, expires_in_secs: u64) -> Self {
        Self {
            secret: SecretString::from(access_token),
            expires_at: Instant::now() + Duration::from_secs(expires_in_secs),
        }
    }

    /// The raw token value, for use in an Authorization header
    #[must_use]
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    /// Whether the token expires within the given safety margin
    #[must_use]
    pub fn is_expired(&self, skew: Duration) -> bool {
        Instant::now() + skew >= self.expires_at
    }

    /// Remaining lifetime of the token
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Wire format of the token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

const fn default_expires_in() -> u64 {
    3_600
}

/// Client for the OAuth2 token endpoint
pub struct AuthClient {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    /// Create an auth client sharing the gateway's HTTP client
    #[must_use]
    pub fn new(config: &GatewayConfig, http: Client) -> Self {
        Self {
            http,
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Exchange client credentials for a bearer token
    ///
    /// 401/403 from the authorization server means the credentials are
    /// wrong and is reported as [`GatewayError::AuthFailed`]; any other
    /// non-success status is a transient gateway condition.
    #[instrument(skip(self), fields(token_url = %self.token_url))]
    pub async fn fetch_token(&self) -> Result<BearerToken, GatewayError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::AuthFailed(format!("status {status}: {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if token.access_token.is_empty() {
            return Err(GatewayError::InvalidResponse(
                "token endpoint returned an empty access token".to_string(),
            ));
        }

        debug!(expires_in = token.expires_in, "Obtained bearer token");

        Ok(BearerToken::new(token.access_token, token.expires_in))
    }
}
