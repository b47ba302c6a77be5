//! `ssm-admin start|stop|restart|enable|disable`.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use ssm_common::ServiceType;
use tracing::debug;

use crate::app::AppContext;
use crate::application::services::bulk::{BulkLifecycle, LifecycleAction};
use crate::application::services::local_index::LocalServiceIndex;
use crate::application::services::registry::ServiceRegistry;
use crate::infra::consul::ConsulClient;

/// Arguments shared by the lifecycle commands.
#[derive(Args)]
pub struct LifecycleArgs {
    /// Service type, e.g. `linux:metrics`
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub service_type: Option<ServiceType>,

    /// Apply to every service on this node
    #[arg(long)]
    pub all: bool,
}

/// Run a lifecycle command.
///
/// Online actions (`start`, `restart`, `enable`) confirm the service is
/// registered for this node first; `stop` and `disable` work offline.
///
/// # Errors
///
/// Returns `ServiceError::NoService` for an unregistered type, or an
/// aggregated error when `--all` partially fails.
pub async fn run(
    app: &AppContext,
    action: LifecycleAction,
    args: &LifecycleArgs,
) -> Result<ExitCode> {
    let remote = if action.is_online() {
        Some(super::connect(app).await?.1)
    } else {
        None
    };
    let registry: Option<ServiceRegistry<'_, ConsulClient, ConsulClient>> =
        remote.as_ref().map(super::registry);
    let bulk = BulkLifecycle {
        fs: &app.fs,
        manager: &app.manager,
        runner: &app.runner,
        registry: registry.as_ref(),
        layout: &app.layout,
    };

    match args.service_type {
        Some(service_type) if !args.all => {
            let affected = bulk.run_one(action, service_type).await?;
            let unit = LocalServiceIndex::new(&app.fs, &app.manager, &app.layout)
                .find(service_type)
                .map_or_else(|| service_type.unit_name(), |s| s.service_name);
            debug!(%action, unit, affected, "single lifecycle action");
            app.renderer().render_lifecycle(action, &unit, affected)?;
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            let outcome = bulk.run_all(action).await?;
            super::finish_bulk(app, action.done(), outcome)
        }
    }
}
