//! Application service: installation check and repair.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::application::ports::{
    AnalyticsApi, Catalog, CommandRunner, KvStore, LocalFs, ProgressReporter, ServiceManager,
};
use crate::application::services::lifecycle::LifecycleController;
use crate::application::services::local_index::LocalServiceIndex;
use crate::application::services::registry::ServiceRegistry;
use crate::application::services::upgrade::{UpgradeMigrator, UpgradeReport};
use crate::domain::reconcile::diff_installation;
use crate::domain::{InstallationReport, Layout, PollPolicy};

/// What `repair` did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Present when an upgrade ran first.
    pub upgrade: Option<UpgradeReport>,
    /// Orphaned units that were stopped.
    pub stopped: Vec<String>,
    /// Missing service ids that were deregistered.
    pub deregistered: Vec<String>,
    /// Analytics instances deleted upstream.
    pub analytics_purged: usize,
}

/// Dependencies of the reconciliation use-cases.
pub struct ReconciliationEngine<'a, F, M, R, C, K, A, P> {
    pub fs: &'a F,
    pub manager: &'a M,
    pub runner: &'a R,
    pub registry: &'a ServiceRegistry<'a, C, K>,
    pub analytics: &'a A,
    pub layout: &'a Layout,
    pub poll: PollPolicy,
    pub reporter: &'a P,
}

impl<F, M, R, C, K, A, P> ReconciliationEngine<'_, F, M, R, C, K, A, P>
where
    F: LocalFs,
    M: ServiceManager,
    R: CommandRunner,
    C: Catalog,
    K: KvStore,
    A: AnalyticsApi,
    P: ProgressReporter,
{
    /// Diff local units against this node's registry entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read. A transport failure
    /// is never mistaken for an empty node.
    pub async fn check_installation(&self) -> Result<InstallationReport> {
        let index = LocalServiceIndex::new(self.fs, self.manager, self.layout);
        let local = index.discover(&[]);
        let active = index.discover_active().await;
        let registered = self.registry.node_services().await?;
        Ok(diff_installation(
            &local,
            &active,
            &registered,
            index.legacy_configs_present(),
        ))
    }

    /// Upgrade if needed, stop orphans, drop missing entries.
    ///
    /// # Errors
    ///
    /// Aborts on the first failure. Completed steps are not rolled back.
    pub async fn repair(&self) -> Result<RepairReport> {
        let mut report = RepairReport::default();
        let mut diff = self.check_installation().await?;

        if diff.upgrade_required {
            self.reporter.step("upgrading legacy installation");
            let migrator = UpgradeMigrator {
                fs: self.fs,
                manager: self.manager,
                runner: self.runner,
                layout: self.layout,
                poll: self.poll,
                reporter: self.reporter,
            };
            report.upgrade = Some(migrator.run().await?);
            diff = self.check_installation().await?;
        }

        let lifecycle = LifecycleController::new(self.manager, self.runner);
        for unit in diff.orphaned {
            self.reporter.step(&format!("stopping orphaned {unit}"));
            lifecycle.stop(&unit).await?;
            info!(unit, "orphaned unit stopped");
            report.stopped.push(unit);
        }

        for id in diff.missing {
            self.reporter.step(&format!("removing missing {id}"));
            self.registry.deregister_id(&id).await?;
            report.analytics_purged += self.registry.purge_analytics(&id, self.analytics).await;
            self.registry.delete_kv(&id).await?;
            report.deregistered.push(id);
        }
        Ok(report)
    }
}
