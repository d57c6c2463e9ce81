//! modelgate CLI
//!
//! Command-line interface for exercising the model gateway: token
//! exchange, deployment listing, model resolution, and invocation.

#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gateway_client::{AuthClient, GatewayClient, GatewayConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// modelgate CLI
#[derive(Parser)]
#[command(name = "modelgate-cli")]
#[command(version, about = "Model gateway CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the vendor service key JSON file
    #[arg(short, long, env = "MODELGATE_SERVICE_KEY")]
    service_key: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange the service key for a bearer token
    Token,

    /// List deployments in the configured resource group
    Deployments,

    /// Resolve a model name to its running deployment
    Resolve {
        /// Logical model name
        model: String,
    },

    /// Send an inference payload to a model
    ///
    /// The payload is inline JSON, or @path/to/file to read it from disk.
    /// Example: modelgate-cli invoke mistral-large '{"messages": [...]}'
    Invoke {
        /// Logical model name (falls back to the configured default)
        model: Option<String>,

        /// Inline JSON payload or @file reference
        #[arg(short, long)]
        payload: String,
    },

    /// Check whether the gateway is reachable
    Health,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Load configuration from the service key file or layered sources
fn load_config(service_key: Option<&PathBuf>) -> anyhow::Result<GatewayConfig> {
    match service_key {
        Some(path) => GatewayConfig::from_service_key_file(path)
            .with_context(|| format!("failed to load service key {}", path.display())),
        None => GatewayConfig::load().context("failed to load gateway configuration"),
    }
}

/// Parse an inline JSON payload, or read it from a file via @path
fn read_payload(raw: &str) -> anyhow::Result<serde_json::Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload file {path}"))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("payload is not valid JSON")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(cli.service_key.as_ref())?;

    match cli.command {
        Commands::Token => {
            let http = reqwest_client(&config)?;
            let auth = AuthClient::new(&config, http);
            let token = auth.fetch_token().await?;

            println!("🔑 Token acquired");
            println!("   Expires in: {}s", token.ttl().as_secs());
        },

        Commands::Deployments => {
            let client = GatewayClient::new(config)?;
            let list = client.list_deployments().await?;

            println!("📦 Deployments ({}):", list.count);
            for deployment in &list.resources {
                let model = deployment.model_name.as_deref().unwrap_or("-");
                let url = deployment.deployment_url.as_deref().unwrap_or("-");
                println!(
                    "   {} [{}] model={} url={}",
                    deployment.id, deployment.status, model, url
                );
            }
        },

        Commands::Resolve { model } => {
            let client = GatewayClient::new(config)?;
            let deployment = client.resolve_deployment(&model).await?;

            println!("✅ {model} is served by deployment {}", deployment.id);
            if let Some(url) = &deployment.deployment_url {
                println!("   Endpoint: {url}");
            }
        },

        Commands::Invoke { model, payload } => {
            let payload = read_payload(&payload)?;
            let client = GatewayClient::new(config)?;

            let model = match model.or_else(|| client.default_model().map(ToString::to_string)) {
                Some(model) => model,
                None => {
                    println!("❌ No model given and no default_model configured");
                    std::process::exit(1);
                },
            };

            println!("⚡ Invoking {model}");
            let response = client.invoke_model(&model, &payload).await?;

            // Surface the assistant text when the response is chat-shaped
            if let Some(content) = response
                .pointer("/choices/0/message/content")
                .and_then(serde_json::Value::as_str)
            {
                println!("\n🤖 Response:\n{content}");
            } else {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        },

        Commands::Health => {
            let client = GatewayClient::new(config)?;
            match client.health_check().await {
                Ok(true) => {
                    println!("✅ Healthy");
                },
                Ok(false) => {
                    println!("❌ Unhealthy");
                    std::process::exit(1);
                },
                Err(e) => {
                    println!("❌ Health check failed: {e}");
                    std::process::exit(1);
                },
            }
        },
    }

    Ok(())
}

/// HTTP client with the configured timeout, for bare token requests
fn reqwest_client(config: &GatewayConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_levels() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(9), "trace");
    }

    #[test]
    fn read_payload_inline_json() {
        let value = read_payload(r#"{"prompt": "hello"}"#).unwrap();
        assert_eq!(value["prompt"], "hello");
    }

    #[test]
    fn read_payload_rejects_invalid_json() {
        assert!(read_payload("not json").is_err());
    }

    #[test]
    fn read_payload_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"max_tokens": 64}"#).unwrap();

        let reference = format!("@{}", file.path().display());
        let value = read_payload(&reference).unwrap();
        assert_eq!(value["max_tokens"], 64);
    }

    #[test]
    fn read_payload_missing_file() {
        assert!(read_payload("@/definitely/not/here.json").is_err());
    }
}
