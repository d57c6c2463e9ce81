//! Port definitions for gateway access
//!
//! Application code depends on this trait rather than on the concrete
//! HTTP client, so tests can substitute an in-memory gateway.

use async_trait::async_trait;

use crate::client::GatewayClient;
use crate::deployments::{Deployment, DeploymentList};
use crate::error::GatewayError;

/// Port for model gateway implementations
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// List all deployments in the configured resource group
    async fn list_deployments(&self) -> Result<DeploymentList, GatewayError>;

    /// Resolve a logical model name to its running deployment
    async fn resolve_deployment(&self, model: &str) -> Result<Deployment, GatewayError>;

    /// Resolve a model and send an inference payload to it
    async fn invoke_model(
        &self,
        model: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError>;

    /// Check whether the gateway is reachable and answering
    async fn health_check(&self) -> Result<bool, GatewayError>;

    /// Model used when the caller does not name one
    fn default_model(&self) -> Option<&str>;
}

#[async_trait]
impl ModelGateway for GatewayClient {
    async fn list_deployments(&self) -> Result<DeploymentList, GatewayError> {
        Self::list_deployments(self).await
    }

    async fn resolve_deployment(&self, model: &str) -> Result<Deployment, GatewayError> {
        Self::resolve_deployment(self, model).await
    }

    async fn invoke_model(
        &self,
        model: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        Self::invoke_model(self, model, payload).await
    }

    async fn health_check(&self) -> Result<bool, GatewayError> {
        Self::health_check(self).await
    }

    fn default_model(&self) -> Option<&str> {
        Self::default_model(self)
    }
}
