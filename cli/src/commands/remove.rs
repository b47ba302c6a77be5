//! `ssm-admin remove`: stop monitoring one or all service types.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use ssm_common::ServiceType;

use crate::app::AppContext;
use crate::application::services::monitoring::Monitoring;

/// Arguments for the remove command.
#[derive(Args)]
pub struct RemoveArgs {
    /// Service type, e.g. `mysql:metrics`
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub service_type: Option<ServiceType>,

    /// Remove the service published under this name
    #[arg(long)]
    pub alias: Option<String>,

    /// Remove every service this node publishes
    #[arg(long)]
    pub all: bool,
}

/// Run `ssm-admin remove`.
///
/// # Errors
///
/// Returns `ServiceError::NoService` when nothing matches, or an aggregated
/// error when `--all` partially fails.
pub async fn run(app: &AppContext, args: &RemoveArgs) -> Result<ExitCode> {
    let (_, remote) = super::connect(app).await?;
    let registry = super::registry(&remote);
    let monitoring = Monitoring {
        fs: &app.fs,
        manager: &app.manager,
        runner: &app.runner,
        registry: &registry,
        analytics: &remote.qan,
        config: &app.config_store,
        layout: &app.layout,
    };

    match args.service_type {
        Some(service_type) if !args.all => {
            let record = monitoring
                .remove(service_type, args.alias.as_deref())
                .await?;
            app.renderer().render_removed(&record)?;
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            let outcome = monitoring.remove_all().await?;
            super::finish_bulk(app, "removed", outcome)
        }
    }
}
