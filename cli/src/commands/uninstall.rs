//! `ssm-admin uninstall`: remove everything this client set up.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use tracing::warn;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::monitoring::Monitoring;
use crate::application::services::uninstall::Uninstaller;

/// Arguments for the uninstall command.
#[derive(Args)]
pub struct UninstallArgs {
    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Run `ssm-admin uninstall`.
///
/// Registry cleanup is skipped when the server cannot be reached; local
/// cleanup always runs.
///
/// # Errors
///
/// Returns an error if the prompt fails or the client configuration could
/// not be removed.
pub async fn run(app: &AppContext, args: &UninstallArgs) -> Result<ExitCode> {
    if !args.yes
        && !app.confirm("Remove all monitored services and the client configuration?", false)?
    {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let remote = if app.config_store.exists() {
        match super::connect(app).await {
            Ok((_, remote)) => Some(remote),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "server unavailable, skipping registry cleanup");
                None
            }
        }
    } else {
        None
    };
    let registry = remote.as_ref().map(super::registry);
    let monitoring = remote
        .as_ref()
        .zip(registry.as_ref())
        .map(|(remote, registry)| Monitoring {
            fs: &app.fs,
            manager: &app.manager,
            runner: &app.runner,
            registry,
            analytics: &remote.qan,
            config: &app.config_store,
            layout: &app.layout,
        });

    let uninstaller = Uninstaller {
        fs: &app.fs,
        manager: &app.manager,
        runner: &app.runner,
        config: &app.config_store,
        layout: &app.layout,
    };
    let outcome = uninstaller.run(monitoring.as_ref()).await;
    app.renderer().render_uninstall(outcome.count)?;
    match outcome.client_error {
        Some(e) => Err(e),
        None => Ok(ExitCode::SUCCESS),
    }
}
