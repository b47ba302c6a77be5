//! ssm-admin - SSM client service registry and lifecycle tool

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ssm_admin::cli::Cli;
use ssm_admin::domain::{ConfigurationError, ConnectivityError, PartialFailureError, ServiceError};
use ssm_admin::output::json::format_error;

/// Environment variable holding the log filter; falls back to `RUST_LOG`.
const LOG_ENV: &str = "SSM_LOG";

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Stable code for the JSON error document, from the first typed error in the chain.
fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ServiceError>() {
            return match e {
                ServiceError::NoService => "no_service",
                ServiceError::BadServiceType(_) => "bad_service_type",
                _ => "duplicate_service",
            };
        }
        if cause.is::<ConfigurationError>() {
            return "configuration";
        }
        if cause.is::<ConnectivityError>() {
            return "connectivity";
        }
        if cause.is::<PartialFailureError>() {
            return "partial_failure";
        }
    }
    "error"
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;
    init_tracing(cli.verbose);

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            if json && let Ok(doc) = format_error(&format!("{e:#}"), error_code(&e)) {
                println!("{doc}");
            }
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
