//! Integration tests for CLI
//!
//! These tests verify CLI functionality without running actual commands,
//! but instead test the command parsing and structure.

#![allow(clippy::panic)] // Allow panic! in tests for clear failure messages

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

// Mock CLI structure for testing (mirrors main.rs)
#[derive(Parser)]
#[command(name = "modelgate-cli")]
#[command(version, about = "Model gateway CLI", long_about = None)]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, env = "MODELGATE_SERVICE_KEY")]
    service_key: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    Token,
    Deployments,
    Resolve {
        model: String,
    },
    Invoke {
        model: Option<String>,
        #[arg(short, long)]
        payload: String,
    },
    Health,
}

fn parse_args(args: &[&str]) -> Result<Cli, clap::Error> {
    let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
    Cli::try_parse_from(os_args)
}

#[test]
fn cli_parses_token_command() {
    let cli = parse_args(&["modelgate-cli", "token"]).unwrap();
    assert!(matches!(cli.command, Commands::Token));
}

#[test]
fn cli_parses_deployments_command() {
    let cli = parse_args(&["modelgate-cli", "deployments"]).unwrap();
    assert!(matches!(cli.command, Commands::Deployments));
}

#[test]
fn cli_parses_resolve_with_model() {
    let cli = parse_args(&["modelgate-cli", "resolve", "mistral-large"]).unwrap();
    if let Commands::Resolve { model } = cli.command {
        assert_eq!(model, "mistral-large");
    } else {
        panic!("Expected Resolve command");
    }
}

#[test]
fn cli_resolve_requires_model() {
    assert!(parse_args(&["modelgate-cli", "resolve"]).is_err());
}

#[test]
fn cli_parses_invoke_with_model_and_payload() {
    let cli = parse_args(&[
        "modelgate-cli",
        "invoke",
        "mistral-large",
        "--payload",
        r#"{"prompt": "hi"}"#,
    ])
    .unwrap();
    if let Commands::Invoke { model, payload } = cli.command {
        assert_eq!(model.as_deref(), Some("mistral-large"));
        assert!(payload.contains("prompt"));
    } else {
        panic!("Expected Invoke command");
    }
}

#[test]
fn cli_parses_invoke_without_model() {
    let cli = parse_args(&["modelgate-cli", "invoke", "--payload", "{}"]).unwrap();
    if let Commands::Invoke { model, payload } = cli.command {
        assert!(model.is_none());
        assert_eq!(payload, "{}");
    } else {
        panic!("Expected Invoke command");
    }
}

#[test]
fn cli_parses_invoke_with_file_payload() {
    let cli = parse_args(&["modelgate-cli", "invoke", "llama-3", "-p", "@payload.json"]).unwrap();
    if let Commands::Invoke { model, payload } = cli.command {
        assert_eq!(model.as_deref(), Some("llama-3"));
        assert_eq!(payload, "@payload.json");
    } else {
        panic!("Expected Invoke command");
    }
}

#[test]
fn cli_parses_health_command() {
    let cli = parse_args(&["modelgate-cli", "health"]).unwrap();
    assert!(matches!(cli.command, Commands::Health));
}

#[test]
fn cli_parses_service_key_flag() {
    let cli = parse_args(&[
        "modelgate-cli",
        "--service-key",
        "/tmp/key.json",
        "deployments",
    ])
    .unwrap();
    assert_eq!(cli.service_key, Some(PathBuf::from("/tmp/key.json")));
}

#[test]
fn cli_counts_verbosity_flags() {
    let cli = parse_args(&["modelgate-cli", "-vvv", "health"]).unwrap();
    assert_eq!(cli.verbose, 3);
}

#[test]
fn cli_rejects_unknown_command() {
    assert!(parse_args(&["modelgate-cli", "frobnicate"]).is_err());
}
