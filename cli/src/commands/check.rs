//! `ssm-admin check` and `ssm-admin repair`.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::reconcile::ReconciliationEngine;

/// Run `ssm-admin check`.
///
/// A report with findings still exits successfully; only failures to
/// gather the report are errors.
///
/// # Errors
///
/// Returns an error if the server cannot be reached or read.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let (_, remote) = super::connect(app).await?;
    let registry = super::registry(&remote);
    let reporter = app.reporter();
    let engine = ReconciliationEngine {
        fs: &app.fs,
        manager: &app.manager,
        runner: &app.runner,
        registry: &registry,
        analytics: &remote.qan,
        layout: &app.layout,
        poll: app.poll,
        reporter: &reporter,
    };
    let report = engine.check_installation().await?;
    app.renderer().render_installation(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Run `ssm-admin repair`.
///
/// # Errors
///
/// Returns the first failure; steps already completed stay done.
pub async fn repair(app: &AppContext) -> Result<ExitCode> {
    let (_, remote) = super::connect(app).await?;
    let registry = super::registry(&remote);
    let reporter = app.reporter();
    let engine = ReconciliationEngine {
        fs: &app.fs,
        manager: &app.manager,
        runner: &app.runner,
        registry: &registry,
        analytics: &remote.qan,
        layout: &app.layout,
        poll: app.poll,
        reporter: &reporter,
    };
    let report = engine.repair().await?;
    app.renderer().render_repair(&report)?;
    Ok(ExitCode::SUCCESS)
}
