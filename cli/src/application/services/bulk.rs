//! Application service: single and bulk lifecycle actions.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::fmt;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use ssm_common::ServiceType;

use crate::application::ports::{Catalog, CommandRunner, KvStore, LocalFs, ServiceManager};
use crate::application::services::lifecycle::LifecycleController;
use crate::application::services::local_index::LocalServiceIndex;
use crate::application::services::registry::ServiceRegistry;
use crate::domain::{BulkOutcome, ConfigurationError, ErrorList, Layout, ServiceError};

/// Lifecycle verb applied to one or all services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
    Enable,
    Disable,
}

impl LifecycleAction {
    /// Online actions need the service registered for this node.
    #[must_use]
    pub fn is_online(self) -> bool {
        matches!(self, Self::Start | Self::Restart | Self::Enable)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    /// Past tense, for summaries.
    #[must_use]
    pub fn done(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
            Self::Enable => "enabled",
            Self::Disable => "disabled",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependencies of the lifecycle use-cases.
///
/// `registry` may be absent; offline actions never consult it.
pub struct BulkLifecycle<'a, F, M, R, C, K> {
    pub fs: &'a F,
    pub manager: &'a M,
    pub runner: &'a R,
    pub registry: Option<&'a ServiceRegistry<'a, C, K>>,
    pub layout: &'a Layout,
}

impl<F, M, R, C, K> BulkLifecycle<'_, F, M, R, C, K>
where
    F: LocalFs,
    M: ServiceManager,
    R: CommandRunner,
    C: Catalog,
    K: KvStore,
{
    fn registry(&self) -> Result<&ServiceRegistry<'_, C, K>> {
        self.registry
            .ok_or_else(|| ConfigurationError::MissingSetting("server address").into())
    }

    /// Apply `action` to the service of `service_type`.
    ///
    /// Returns whether the unit changed state; `start` on an active unit and
    /// `stop` on an inactive one return `false`.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NoService` for an online action on an unregistered type.
    /// - Any registry or service-manager failure.
    pub async fn run_one(
        &self,
        action: LifecycleAction,
        service_type: ServiceType,
    ) -> Result<bool> {
        if action.is_online() {
            self.registry()?
                .lookup(service_type, None)
                .await?
                .ok_or(ServiceError::NoService)?;
        }
        let unit = LocalServiceIndex::new(self.fs, self.manager, self.layout)
            .find(service_type)
            .map_or_else(|| service_type.unit_name(), |s| s.service_name);
        let affected = self.apply(action, &unit).await?;
        if affected {
            info!(%action, unit, "lifecycle action applied");
        }
        Ok(affected)
    }

    /// Apply `action` to every local service, continuing past failures.
    ///
    /// Online actions skip services this node has not registered.
    /// `total` counts every discovered service.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::MissingSetting` when an online action has no
    /// registry; per-service failures are collected in the outcome instead.
    pub async fn run_all(&self, action: LifecycleAction) -> Result<BulkOutcome> {
        let registry = if action.is_online() {
            Some(self.registry()?)
        } else {
            None
        };
        let services = LocalServiceIndex::new(self.fs, self.manager, self.layout).discover(&[]);
        let mut errors = ErrorList::new();
        let mut affected = 0;

        for svc in &services {
            if let Some(registry) = registry {
                match registry.lookup(svc.service_type, None).await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        debug!(unit = %svc.service_name, "not registered, skipping");
                        continue;
                    }
                    Err(e) => {
                        errors.push(e);
                        continue;
                    }
                }
            }
            if errors
                .record(self.apply(action, &svc.service_name).await)
                .unwrap_or(false)
            {
                affected += 1;
            }
        }

        Ok(BulkOutcome {
            affected,
            total: services.len(),
            error: errors.into_error(),
        })
    }

    async fn apply(&self, action: LifecycleAction, unit: &str) -> Result<bool> {
        let lifecycle = LifecycleController::new(self.manager, self.runner);
        match action {
            LifecycleAction::Start => lifecycle.start(unit).await,
            LifecycleAction::Stop => lifecycle.stop(unit).await,
            LifecycleAction::Restart => lifecycle.restart(unit).await.map(|()| true),
            LifecycleAction::Enable => lifecycle.enable(unit).await.map(|()| true),
            LifecycleAction::Disable => lifecycle.disable(unit).await.map(|()| true),
        }
    }
}
