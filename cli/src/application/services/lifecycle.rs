//! Application service: lifecycle primitives over the platform service manager.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::{CommandRunner, ServiceManager, ServiceStatus};
use crate::domain::{InitSystem, UnitDefinition};

/// Start/stop/restart/enable/disable over an injected service manager.
///
/// `start` and `stop` report whether anything changed; `restart` always acts.
pub struct LifecycleController<'a, M, R> {
    manager: &'a M,
    runner: &'a R,
}

impl<'a, M: ServiceManager, R: CommandRunner> LifecycleController<'a, M, R> {
    #[must_use]
    pub fn new(manager: &'a M, runner: &'a R) -> Self {
        Self { manager, runner }
    }

    #[must_use]
    pub fn platform(&self) -> InitSystem {
        self.manager.platform()
    }

    pub async fn status(&self, name: &str) -> ServiceStatus {
        self.manager.status(name).await
    }

    pub async fn is_active(&self, name: &str) -> bool {
        self.status(name).await.is_active()
    }

    /// # Errors
    ///
    /// Returns an error if the unit cannot be written or the manager reload fails.
    pub async fn install(&self, unit: &UnitDefinition) -> Result<()> {
        debug!(unit = %unit.name, "installing unit");
        self.manager
            .install(unit)
            .await
            .with_context(|| format!("installing {}", unit.name))
    }

    /// # Errors
    ///
    /// Returns an error if the manager fails to remove the unit.
    pub async fn uninstall(&self, name: &str) -> Result<()> {
        debug!(unit = name, "uninstalling unit");
        self.manager
            .uninstall(name)
            .await
            .with_context(|| format!("uninstalling {name}"))
    }

    /// Start `name`. Returns `false` when it was already active.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager fails to start the unit.
    pub async fn start(&self, name: &str) -> Result<bool> {
        if self.is_active(name).await {
            debug!(unit = name, "already active");
            return Ok(false);
        }
        self.manager
            .start(name)
            .await
            .with_context(|| format!("starting {name}"))?;
        Ok(true)
    }

    /// Stop `name`. Returns `false` when it was already inactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager fails to stop the unit.
    pub async fn stop(&self, name: &str) -> Result<bool> {
        if !self.is_active(name).await {
            debug!(unit = name, "already inactive");
            return Ok(false);
        }
        self.manager
            .stop(name)
            .await
            .with_context(|| format!("stopping {name}"))?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns an error if the manager fails to restart the unit.
    pub async fn restart(&self, name: &str) -> Result<()> {
        self.manager
            .restart(name)
            .await
            .with_context(|| format!("restarting {name}"))
    }

    /// Register `name` to start at boot. No-op on upstart and launchd.
    ///
    /// # Errors
    ///
    /// Returns an error if the boot-registration tool fails.
    pub async fn enable(&self, name: &str) -> Result<()> {
        self.boot_registration(name, true).await
    }

    /// # Errors
    ///
    /// Returns an error if the boot-registration tool fails.
    pub async fn disable(&self, name: &str) -> Result<()> {
        self.boot_registration(name, false).await
    }

    /// Reload unit definitions where the platform needs it.
    ///
    /// # Errors
    ///
    /// Returns an error if the reload command fails.
    pub async fn reload(&self) -> Result<()> {
        if !self.platform().needs_reload() {
            return Ok(());
        }
        self.manager
            .reload()
            .await
            .context("reloading service manager")
    }

    async fn boot_registration(&self, name: &str, enable: bool) -> Result<()> {
        let Some((program, args)) = self.platform().boot_registration(name, enable) else {
            return Ok(());
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        debug!(program, ?args, "boot registration");
        let output = self.runner.run(program, &args).await?;
        if !output.status.success() {
            anyhow::bail!(
                "{program} {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
