//! Deployment listing and model resolution
//!
//! A deployment is a provisioned model instance. The gateway reports its
//! lifecycle status and, once it is running, the endpoint URL requests
//! should be sent to. Resolution is a linear scan over the deployment list
//! for a running instance serving the requested model.

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Lifecycle status of a deployment as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    /// Provisioning in progress, no endpoint yet
    Pending,
    /// Serving traffic
    Running,
    /// Stopped by an operator
    Stopped,
    /// Provisioning failed
    Dead,
    /// Any status this client does not know about
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Dead => write!(f, "DEAD"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A provisioned model instance
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Deployment identifier
    pub id: String,

    /// Lifecycle status
    #[serde(default)]
    pub status: DeploymentStatus,

    /// Endpoint URL, present once the deployment is running
    #[serde(default)]
    pub deployment_url: Option<String>,

    /// Model served by this deployment
    #[serde(default)]
    pub model_name: Option<String>,

    /// Scenario the deployment belongs to
    #[serde(default)]
    pub scenario_id: Option<String>,

    /// Configuration the deployment was created from
    #[serde(default)]
    pub configuration_name: Option<String>,

    /// Creation timestamp as reported by the gateway (RFC 3339)
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Deployment {
    /// Whether the deployment is serving traffic
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == DeploymentStatus::Running
    }

    /// Whether this deployment serves the given model (case-insensitive)
    #[must_use]
    pub fn serves_model(&self, model: &str) -> bool {
        self.model_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(model))
    }
}

/// Wire format of the deployment-listing endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentList {
    /// Total number of deployments in the resource group
    pub count: u32,

    /// The deployments themselves
    #[serde(default)]
    pub resources: Vec<Deployment>,
}

/// Find the deployment serving the given model
///
/// Prefers a running deployment with an endpoint URL. A matching
/// deployment that is not running yet yields
/// [`GatewayError::DeploymentNotReady`] (retryable, callers poll until it
/// comes up); no match at all yields [`GatewayError::DeploymentNotFound`].
pub fn resolve<'a>(
    deployments: &'a [Deployment],
    model: &str,
) -> Result<&'a Deployment, GatewayError> {
    if let Some(found) = deployments
        .iter()
        .find(|d| d.serves_model(model) && d.is_running() && d.deployment_url.is_some())
    {
        return Ok(found);
    }

    if let Some(pending) = deployments.iter().find(|d| d.serves_model(model)) {
        return Err(GatewayError::DeploymentNotReady {
            id: pending.id.clone(),
            status: pending.status.to_string(),
        });
    }

    Err(GatewayError::DeploymentNotFound {
        model: model.to_string(),
    })
}
