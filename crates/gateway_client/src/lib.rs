//! Gateway client - access to a managed AI-model gateway
//!
//! Exchanges service-key credentials for a bearer token, resolves logical
//! model names to provisioned deployments, and sends inference payloads to
//! the resolved deployment endpoint.

pub mod auth;
pub mod client;
pub mod config;
pub mod deployments;
pub mod error;
pub mod ports;
pub mod retry;

pub use auth::{AuthClient, BearerToken};
pub use client::GatewayClient;
pub use config::{GatewayConfig, ServiceKey};
pub use deployments::{Deployment, DeploymentList, DeploymentStatus};
pub use error::GatewayError;
pub use ports::ModelGateway;
pub use retry::RetryConfig;
