//! `ssm-admin add`: start monitoring a service type.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use ssm_common::ServiceType;

use crate::app::AppContext;
use crate::application::services::monitoring::{AddOptions, Monitoring};
use crate::infra::exporter::ConfigFileExporter;

/// Arguments for the add command.
#[derive(Args)]
pub struct AddArgs {
    /// Service type, e.g. `mysql:metrics`
    pub service_type: ServiceType,

    /// Name of the service on the server (defaults to the client name)
    #[arg(long)]
    pub alias: Option<String>,

    /// Cluster the service belongs to
    #[arg(long)]
    pub cluster: Option<String>,

    /// Serve exporter metrics over plain HTTP
    #[arg(long)]
    pub disable_ssl: bool,
}

/// Run `ssm-admin add`.
///
/// # Errors
///
/// Returns an error if the server is unreachable, the service is already
/// monitored, or the exporter cannot be configured or started.
pub async fn run(app: &AppContext, args: &AddArgs) -> Result<ExitCode> {
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

    let mut plugin = ConfigFileExporter::new(&app.fs, &app.layout, args.service_type);
    let opts = AddOptions {
        alias: args.alias.clone(),
        cluster: args.cluster.clone(),
        disable_ssl: args.disable_ssl,
    };
    let added = monitoring.add(args.service_type, &mut plugin, &opts).await?;
    app.renderer().render_added(&added)?;
    Ok(ExitCode::SUCCESS)
}
