//! `ssm-admin list`: local services with their registration, if known.

use std::process::ExitCode;

use anyhow::Result;
use tracing::debug;

use crate::app::AppContext;
use crate::application::services::local_index::LocalServiceIndex;
use crate::application::services::monitoring::list_services;

/// Run `ssm-admin list`.
///
/// Works offline: without a reachable server the alias and port columns
/// stay empty.
///
/// # Errors
///
/// Returns an error only if rendering fails.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let remote = match super::connect(app).await {
        Ok((_, remote)) => Some(remote),
        Err(e) => {
            debug!(error = %format!("{e:#}"), "listing without server data");
            None
        }
    };
    let registry = remote.as_ref().map(super::registry);
    let index = LocalServiceIndex::new(&app.fs, &app.manager, &app.layout);
    let rows = list_services(&index, &app.manager, registry.as_ref()).await;
    app.renderer().render_listing(&rows)?;
    Ok(ExitCode::SUCCESS)
}
