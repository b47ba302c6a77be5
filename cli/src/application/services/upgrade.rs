//! Application service: online migration of legacy units and configs.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! Any failing step aborts the whole upgrade. Units already converted stay
//! converted, and re-running is safe because current-format units are only
//! restarted.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use ssm_common::plugin::exporters;

use crate::application::ports::{CommandRunner, LocalFs, ProgressReporter, ServiceManager};
use crate::application::services::lifecycle::LifecycleController;
use crate::application::services::local_index::LocalServiceIndex;
use crate::domain::ini::IniDocument;
use crate::domain::{
    Layout, LocalService, MigrationEvent, PollPolicy, ShadowPatch, UnitMigration,
};

/// Suffix appended to a legacy unit's name to form its shadow.
pub const SHADOW_SUFFIX: &str = "-upgrade";

/// Mode enforced on exporter config files.
pub const CONFIG_FILE_MODE: u32 = 0o600;

/// What happened to one exporter's config during migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ConfigMigration {
    /// Only the legacy file existed and was moved into place.
    Moved { exporter: String },
    /// Both existed; absent keys were copied into the current file.
    Merged { exporter: String, keys_added: usize },
}

/// Outcome of an upgrade run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    pub configs: Vec<ConfigMigration>,
    pub units: Vec<UnitMigration>,
    /// Canonical units restarted because their predecessor was active.
    pub restarted: Vec<String>,
}

/// Dependencies of the upgrade use-case.
pub struct UpgradeMigrator<'a, F, M, R, P> {
    pub fs: &'a F,
    pub manager: &'a M,
    pub runner: &'a R,
    pub layout: &'a Layout,
    pub poll: PollPolicy,
    pub reporter: &'a P,
}

impl<F, M, R, P> UpgradeMigrator<'_, F, M, R, P>
where
    F: LocalFs,
    M: ServiceManager,
    R: CommandRunner,
    P: ProgressReporter,
{
    fn lifecycle(&self) -> LifecycleController<'_, M, R> {
        LifecycleController::new(self.manager, self.runner)
    }

    /// Migrate configs, convert every legacy unit, restart what was running.
    ///
    /// # Errors
    ///
    /// Returns the first failure; nothing already done is rolled back.
    pub async fn run(&self) -> Result<UpgradeReport> {
        let mut report = UpgradeReport {
            configs: migrate_exporter_configs(self.fs, self.layout)?,
            ..UpgradeReport::default()
        };
        for c in &report.configs {
            debug!(?c, "exporter config migrated");
        }

        let lifecycle = self.lifecycle();
        lifecycle.reload().await?;

        let services = LocalServiceIndex::new(self.fs, self.manager, self.layout).discover(&[]);
        for svc in services {
            let was_active = lifecycle.is_active(&svc.service_name).await;
            if svc.is_legacy() {
                self.reporter
                    .step(&format!("migrating {}", svc.service_name));
                let migration = self.migrate_unit(&svc, was_active).await?;
                report.units.push(migration);
            }
            if was_active {
                let canonical = svc.canonical_name();
                lifecycle.restart(&canonical).await?;
                info!(unit = %canonical, "restarted");
                report.restarted.push(canonical);
            }
        }
        Ok(report)
    }

    async fn migrate_unit(&self, svc: &LocalService, was_active: bool) -> Result<UnitMigration> {
        let mut migration = UnitMigration::new(&svc.service_name, svc.service_type, was_active);
        // Queries agents have no exporter config to rewrite; only the unit moves.
        if svc.is_queries() {
            migration.apply(MigrationEvent::ReconfigureSkipped);
        } else {
            self.reconfigure_via_shadow(svc, &mut migration).await?;
        }
        self.lifecycle().uninstall(&svc.service_name).await?;
        info!(unit = %svc.service_name, state = ?migration.state, "legacy unit retired");
        Ok(migration)
    }

    /// Run a patched copy of the legacy unit once so the exporter rewrites
    /// its own configuration, then remove the copy.
    async fn reconfigure_via_shadow(
        &self,
        svc: &LocalService,
        migration: &mut UnitMigration,
    ) -> Result<()> {
        let lifecycle = self.lifecycle();
        let init = lifecycle.platform();
        let shadow = shadow_unit_name(&svc.service_name);
        let dir = svc
            .file_path
            .parent()
            .map_or_else(|| self.layout.primary_unit_dir(init), ToOwned::to_owned);
        let shadow_path = dir.join(init.unit_file_name(&shadow));

        self.fs
            .copy(&svc.file_path, &shadow_path)
            .with_context(|| format!("copying {} to {}", svc.service_name, shadow))?;
        let original = self.fs.read_to_string(&shadow_path)?;
        self.fs
            .write(&shadow_path, &ShadowPatch::from(init).apply(&original, &shadow))?;
        lifecycle.reload().await?;

        lifecycle.start(&shadow).await?;
        migration.apply(MigrationEvent::ShadowStarted);

        for attempt in 1..=self.poll.max_attempts {
            tokio::time::sleep(self.poll.interval).await;
            migration.poll_attempts = attempt;
            if !lifecycle.is_active(&shadow).await {
                migration.apply(MigrationEvent::ShadowExited);
                break;
            }
        }
        if !migration.shadow_exited {
            warn!(
                unit = %shadow,
                attempts = migration.poll_attempts,
                "shadow unit still active, removing it"
            );
            self.reporter
                .warn(&format!("{shadow} did not exit in time; removing it anyway"));
        }

        lifecycle.uninstall(&shadow).await?;
        migration.apply(MigrationEvent::ShadowRemoved);
        Ok(())
    }
}

/// Name of the temporary copy of `unit` run during its migration.
#[must_use]
pub fn shadow_unit_name(unit: &str) -> String {
    format!("{unit}{SHADOW_SUFFIX}")
}

/// Move or merge exporter configs out of the legacy config directory.
///
/// A legacy file alone is moved into place. When both exist, keys missing
/// from the current file are copied over and the legacy file is removed.
/// Current files are forced to mode `0600`. Finally the legacy directory is
/// removed if possible.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn migrate_exporter_configs(
    fs: &impl LocalFs,
    layout: &Layout,
) -> Result<Vec<ConfigMigration>> {
    let mut done = Vec::new();
    for exporter in exporters::ALL {
        let legacy = layout.legacy_exporter_config(exporter);
        let current = layout.exporter_config(exporter);
        let has_legacy = fs.exists(&legacy);
        let has_current = fs.exists(&current);

        if has_legacy && !has_current {
            fs.rename(&legacy, &current)
                .with_context(|| format!("moving {}", legacy.display()))?;
            fs.set_permissions(&current, CONFIG_FILE_MODE)?;
            done.push(ConfigMigration::Moved {
                exporter: exporter.to_string(),
            });
            continue;
        }
        if !has_current {
            continue;
        }
        fs.set_permissions(&current, CONFIG_FILE_MODE)?;
        if !has_legacy {
            continue;
        }

        let old = IniDocument::parse(&fs.read_to_string(&legacy)?);
        let mut merged = IniDocument::parse(&fs.read_to_string(&current)?);
        let keys_added = merged.merge_missing_from(&old);
        fs.write(&current, &merged.render())?;
        fs.remove_file(&legacy)
            .with_context(|| format!("removing {}", legacy.display()))?;
        done.push(ConfigMigration::Merged {
            exporter: exporter.to_string(),
            keys_added,
        });
    }

    let dir = layout.legacy_config_dir();
    if fs.exists(&dir)
        && let Err(e) = fs.remove_dir(&dir)
    {
        debug!(dir = %dir.display(), error = %e, "legacy config dir left in place");
    }
    Ok(done)
}
