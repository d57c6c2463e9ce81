//! Gateway configuration
//!
//! Credentials come from a vendor-issued service key (a JSON file) and can
//! be layered with a local config file and `MODELGATE_*` environment
//! variables.

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::GatewayError;
use crate::retry::RetryConfig;

/// Environment variable pointing at the service key file
pub const SERVICE_KEY_ENV: &str = "MODELGATE_SERVICE_KEY";

/// Vendor-issued credentials for the gateway
///
/// Matches the JSON document handed out when a service instance is
/// provisioned.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceKey {
    /// OAuth2 authorization server base URL
    pub auth_url: String,

    /// Client identifier for the client-credentials exchange
    pub client_id: String,

    /// Client secret, never logged
    pub client_secret: SecretString,

    /// Base URL of the gateway API
    pub api_base_url: String,
}

/// Configuration for the gateway client
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// OAuth2 authorization server base URL
    pub auth_url: String,

    /// Client identifier for the client-credentials exchange
    pub client_id: String,

    /// Client secret, never logged
    pub client_secret: SecretString,

    /// Base URL of the gateway API
    pub api_base_url: String,

    /// Resource group the deployments live in
    #[serde(default = "default_resource_group")]
    pub resource_group: String,

    /// Model to use when the caller does not name one
    #[serde(default)]
    pub default_model: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry behavior for gateway calls
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_resource_group() -> String {
    "default".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl GatewayConfig {
    /// Build a configuration from a parsed service key, using defaults for
    /// everything the key does not carry
    #[must_use]
    pub fn from_service_key(key: ServiceKey) -> Self {
        Self {
            auth_url: key.auth_url,
            client_id: key.client_id,
            client_secret: key.client_secret,
            api_base_url: key.api_base_url,
            resource_group: default_resource_group(),
            default_model: None,
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }

    /// Read a service key JSON file and build a configuration from it
    pub fn from_service_key_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!(
                "failed to read service key {}: {e}",
                path.display()
            ))
        })?;
        let key: ServiceKey = serde_json::from_str(&raw).map_err(|e| {
            GatewayError::Configuration(format!(
                "failed to parse service key {}: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_service_key(key);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from layered sources
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `modelgate.{json,toml,yaml}` in the working directory (optional)
    /// 2. the service key file named by `MODELGATE_SERVICE_KEY` (optional)
    /// 3. `MODELGATE_*` environment variables (`MODELGATE_CLIENT_ID`,
    ///    `MODELGATE_RETRY__INTERVAL_MS`, ...)
    pub fn load() -> Result<Self, GatewayError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("modelgate").required(false));

        if let Ok(path) = std::env::var(SERVICE_KEY_ENV) {
            builder = builder.add_source(config::File::new(&path, config::FileFormat::Json));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("MODELGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration suitable for testing against a mock server
    #[must_use]
    pub fn for_testing(auth_url: &str, api_base_url: &str) -> Self {
        Self {
            auth_url: auth_url.to_string(),
            client_id: "test-client".to_string(),
            client_secret: SecretString::from("test-secret".to_string()),
            api_base_url: api_base_url.to_string(),
            resource_group: default_resource_group(),
            default_model: None,
            timeout_secs: 5,
            retry: RetryConfig::fast().without_jitter(),
        }
    }

    /// The OAuth2 token endpoint derived from the auth URL
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.auth_url.trim_end_matches('/'))
    }

    /// Build a full API URL for the given path
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.client_id.is_empty() {
            return Err(GatewayError::Configuration(
                "client_id must not be empty".to_string(),
            ));
        }

        for (name, value) in [
            ("auth_url", &self.auth_url),
            ("api_base_url", &self.api_base_url),
        ] {
            if value.is_empty() {
                return Err(GatewayError::Configuration(format!(
                    "{name} must not be empty"
                )));
            }
            url::Url::parse(value).map_err(|e| {
                GatewayError::Configuration(format!("{name} is not a valid URL: {e}"))
            })?;
        }

        if self.resource_group.is_empty() {
            return Err(GatewayError::Configuration(
                "resource_group must not be empty".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(GatewayError::Configuration(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.interval_ms == 0 {
            return Err(GatewayError::Configuration(
                "retry.interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_wait_ms < self.retry.interval_ms {
            return Err(GatewayError::Configuration(
                "retry.max_wait_ms must not be smaller than retry.interval_ms".to_string(),
            ));
        }

        Ok(())
    }
}
