//! Application service: best-effort removal of everything this client set up.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use tracing::{debug, warn};

use crate::application::ports::{
    AnalyticsApi, Catalog, CommandRunner, ConfigStore, KvStore, LocalFs, ServiceManager,
};
use crate::application::services::lifecycle::LifecycleController;
use crate::application::services::local_index::LocalServiceIndex;
use crate::application::services::monitoring::Monitoring;
use crate::domain::paths::PACKAGE_LEFTOVER_SUFFIXES;
use crate::domain::{InitSystem, Layout};

/// Result of an uninstall: how many services were removed or stopped, and
/// why the client configuration could not be deleted, if it could not.
#[derive(Debug, Default)]
pub struct UninstallOutcome {
    pub count: usize,
    pub client_error: Option<anyhow::Error>,
}

pub struct Uninstaller<'a, F, M, R, S> {
    pub fs: &'a F,
    pub manager: &'a M,
    pub runner: &'a R,
    pub config: &'a S,
    pub layout: &'a Layout,
}

impl<F, M, R, S> Uninstaller<'_, F, M, R, S>
where
    F: LocalFs,
    M: ServiceManager,
    R: CommandRunner,
    S: ConfigStore,
{
    /// Remove registrations (when `remote` is given), stop local units, and
    /// delete leftovers, agent state and the client configuration.
    ///
    /// Nothing here aborts early; only the config removal failure is reported.
    pub async fn run<C, K, A>(
        &self,
        remote: Option<&Monitoring<'_, F, M, R, C, K, A, S>>,
    ) -> UninstallOutcome
    where
        C: Catalog,
        K: KvStore,
        A: AnalyticsApi,
    {
        let mut outcome = UninstallOutcome::default();
        let had_config = self.config.exists();

        if had_config && let Some(monitoring) = remote {
            match monitoring.remove_all().await {
                Ok(bulk) => {
                    if let Some(e) = &bulk.error {
                        debug!(error = %e, "ignored registry removal failures");
                    }
                    outcome.count += bulk.affected;
                }
                Err(e) => debug!(error = %e, "registry cleanup skipped"),
            }
        }

        let lifecycle = LifecycleController::new(self.manager, self.runner);
        let active = LocalServiceIndex::new(self.fs, self.manager, self.layout)
            .discover_active()
            .await;
        for svc in active {
            match lifecycle.stop(&svc.service_name).await {
                Ok(_) => outcome.count += 1,
                Err(e) => warn!(unit = %svc.service_name, error = %e, "cannot stop unit"),
            }
        }

        self.remove_package_leftovers();

        if !had_config {
            return outcome;
        }

        for dir in self.layout.agent_state_dirs() {
            if self.fs.exists(&dir)
                && let Err(e) = self.fs.remove_dir_all(&dir)
            {
                warn!(dir = %dir.display(), error = %e, "cannot remove agent state");
            }
        }

        if let Err(e) = self.config.remove() {
            outcome.client_error = Some(e.context(format!(
                "remove config file {} failed",
                self.config.path().display()
            )));
        }
        outcome
    }

    /// Delete `ssm-*` unit copies the package manager kept aside on upgrade.
    fn remove_package_leftovers(&self) {
        let dir = self.layout.primary_unit_dir(InitSystem::Systemd);
        let Ok(entries) = self.fs.list_dir(&dir) else {
            return;
        };
        let ext = InitSystem::Systemd.extension();
        for entry in entries.into_iter().filter(|e| !e.is_dir) {
            let leftover = PACKAGE_LEFTOVER_SUFFIXES.iter().any(|suffix| {
                entry
                    .name
                    .strip_suffix(suffix)
                    .and_then(|n| n.strip_suffix(ext))
                    .is_some_and(|n| n.starts_with("ssm-"))
            });
            if leftover && let Err(e) = self.fs.remove_file(&entry.path) {
                debug!(file = %entry.path.display(), error = %e, "leftover not removed");
            }
        }
    }
}
