//! Command implementations
//!
//! Handlers take `&AppContext`, call application services, and hand results
//! to `app.renderer()`. They never branch on the output mode themselves.

pub mod add;
pub mod check;
pub mod config;
pub mod lifecycle;
pub mod list;
pub mod remove;
pub mod uninstall;
pub mod upgrade;

use std::process::ExitCode;

use anyhow::Result;

use crate::app::{AppContext, Remote};
use crate::application::services::registry::ServiceRegistry;
use crate::domain::{BulkOutcome, SsmConfig};
use crate::infra::consul::ConsulClient;

/// Load the client configuration and connect to the server it names.
async fn connect(app: &AppContext) -> Result<(SsmConfig, Remote)> {
    let config = app.load_config()?;
    let remote = app.connect(&config).await?;
    Ok((config, remote))
}

fn registry(remote: &Remote) -> ServiceRegistry<'_, ConsulClient, ConsulClient> {
    ServiceRegistry::new(&remote.consul, &remote.consul, remote.node.clone())
}

/// Render a bulk summary, then surface the aggregated failure, if any.
fn finish_bulk(app: &AppContext, action: &str, outcome: BulkOutcome) -> Result<ExitCode> {
    app.renderer().render_bulk(action, &outcome.summary())?;
    match outcome.error {
        Some(e) => Err(e.into()),
        None => Ok(ExitCode::SUCCESS),
    }
}
