//! `ssm-admin upgrade`: convert legacy units and configs in place.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::upgrade::UpgradeMigrator;

/// Run `ssm-admin upgrade`. Safe to re-run; current units are left alone.
///
/// # Errors
///
/// Returns the first failure. Units converted before it stay converted.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let reporter = app.reporter();
    let migrator = UpgradeMigrator {
        fs: &app.fs,
        manager: &app.manager,
        runner: &app.runner,
        layout: &app.layout,
        poll: app.poll,
        reporter: &reporter,
    };
    let report = migrator.run().await?;
    app.renderer().render_upgrade(&report)?;
    Ok(ExitCode::SUCCESS)
}
