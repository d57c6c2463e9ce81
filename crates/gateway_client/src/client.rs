//! Gateway client implementation
//!
//! Owns the HTTP connection, the token cache, and the retry policy. Every
//! API call acquires (or reuses) a bearer token, attaches the resource
//! group header, and runs under the configured retry budget.

use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::auth::{AuthClient, BearerToken, REFRESH_SKEW};
use crate::config::GatewayConfig;
use crate::deployments::{self, Deployment, DeploymentList};
use crate::error::GatewayError;
use crate::retry::retry;

/// Path of the deployment collection under the API base URL
const DEPLOYMENTS_PATH: &str = "/v2/lm/deployments";

/// Header naming the resource group a request operates on
const RESOURCE_GROUP_HEADER: &str = "AI-Resource-Group";

/// Client for the model gateway
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
    auth: AuthClient,
    token: RwLock<Option<BearerToken>>,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("api_base_url", &self.config.api_base_url)
            .field("resource_group", &self.config.resource_group)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Create a new gateway client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("modelgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let auth = AuthClient::new(&config, http.clone());

        info!(
            api_base_url = %config.api_base_url,
            resource_group = %config.resource_group,
            "Initialized gateway client"
        );

        Ok(Self {
            http,
            config,
            auth,
            token: RwLock::new(None),
        })
    }

    /// The configuration this client was built from
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Model used when the caller does not name one
    #[must_use]
    pub fn default_model(&self) -> Option<&str> {
        self.config.default_model.as_deref()
    }

    /// Return a cached token if it is still comfortably valid
    fn cached_token(&self) -> Option<BearerToken> {
        self.token
            .read()
            .as_ref()
            .filter(|t| !t.is_expired(REFRESH_SKEW))
            .cloned()
    }

    /// Return the cached bearer token, refreshing it when close to expiry
    async fn ensure_token(&self) -> Result<BearerToken, GatewayError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        debug!("Refreshing bearer token");
        let token = self.auth.fetch_token().await?;
        *self.token.write() = Some(token.clone());
        Ok(token)
    }

    /// Map a gateway response to a typed value or an error
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(GatewayError::RateLimited { retry_after_secs });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::AuthFailed(format!("status {status}: {body}")));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Gateway request failed");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    /// Authenticated GET returning a typed body
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        let token = self.ensure_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token.expose())
            .header(RESOURCE_GROUP_HEADER, &self.config.resource_group)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Authenticated POST of a JSON payload returning a typed body
    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<T, GatewayError> {
        let token = self.ensure_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token.expose())
            .header(RESOURCE_GROUP_HEADER, &self.config.resource_group)
            .json(payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// List all deployments in the configured resource group
    #[instrument(skip(self))]
    pub async fn list_deployments(&self) -> Result<DeploymentList, GatewayError> {
        let url = self.config.api_url(DEPLOYMENTS_PATH);
        retry(&self.config.retry, || self.get_json(&url)).await
    }

    /// Fetch a single deployment by id
    #[instrument(skip(self))]
    pub async fn get_deployment(&self, id: &str) -> Result<Deployment, GatewayError> {
        let url = self.config.api_url(&format!("{DEPLOYMENTS_PATH}/{id}"));
        retry(&self.config.retry, || self.get_json(&url)).await
    }

    /// Resolve a logical model name to its running deployment
    ///
    /// Polls within the retry budget while a matching deployment is still
    /// starting up, so a freshly provisioned model becomes usable without
    /// caller-side waiting.
    #[instrument(skip(self))]
    pub async fn resolve_deployment(&self, model: &str) -> Result<Deployment, GatewayError> {
        let url = self.config.api_url(DEPLOYMENTS_PATH);
        let resolved = retry(&self.config.retry, || async {
            let list: DeploymentList = self.get_json(&url).await?;
            deployments::resolve(&list.resources, model).cloned()
        })
        .await?;

        debug!(
            deployment_id = %resolved.id,
            "Resolved model to deployment"
        );
        Ok(resolved)
    }

    /// Send an inference payload to a resolved deployment
    #[instrument(skip(self, payload), fields(deployment_id = %deployment.id))]
    pub async fn invoke(
        &self,
        deployment: &Deployment,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        let url = deployment.deployment_url.as_deref().ok_or_else(|| {
            GatewayError::DeploymentNotReady {
                id: deployment.id.clone(),
                status: deployment.status.to_string(),
            }
        })?;

        retry(&self.config.retry, || self.post_json(url, payload)).await
    }

    /// Resolve a model and send an inference payload to it
    #[instrument(skip(self, payload))]
    pub async fn invoke_model(
        &self,
        model: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        let deployment = self.resolve_deployment(model).await?;
        self.invoke(&deployment, payload).await
    }

    /// Check whether the gateway is reachable and answering
    ///
    /// Unreachable or unhappy gateways report `false`; credential problems
    /// surface as errors because retrying will not fix them.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool, GatewayError> {
        let url = self.config.api_url(DEPLOYMENTS_PATH);
        let result: Result<DeploymentList, GatewayError> = self.get_json(&url).await;

        match result {
            Ok(_) => Ok(true),
            Err(
                GatewayError::Transport(_)
                | GatewayError::Status { .. }
                | GatewayError::RateLimited { .. },
            ) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_config() {
        let config = GatewayConfig::for_testing("not a url", "https://api.example.com");
        assert!(matches!(
            GatewayClient::new(config),
            Err(GatewayError::Configuration(_))
        ));
    }

    #[test]
    fn default_model_comes_from_config() {
        let mut config =
            GatewayConfig::for_testing("https://auth.example.com", "https://api.example.com");
        config.default_model = Some("mistral-large".to_string());

        let client = GatewayClient::new(config).unwrap();
        assert_eq!(client.default_model(), Some("mistral-large"));
    }

    #[test]
    fn debug_output_omits_credentials() {
        let config =
            GatewayConfig::for_testing("https://auth.example.com", "https://api.example.com");
        let client = GatewayClient::new(config).unwrap();

        let debug = format!("{client:?}");
        assert!(debug.contains("api.example.com"));
        assert!(!debug.contains("test-secret"));
    }

    #[test]
    fn fresh_client_has_no_cached_token() {
        let config =
            GatewayConfig::for_testing("https://auth.example.com", "https://api.example.com");
        let client = GatewayClient::new(config).unwrap();
        assert!(client.cached_token().is_none());
    }
}
