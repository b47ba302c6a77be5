//! Infrastructure implementation of the `ServiceManager` port.
//!
//! Drives systemd, upstart, sysv or launchd through their command-line tools.

use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::debug;

use crate::application::ports::{CommandRunner, LocalFs, ServiceManager, ServiceStatus};
use crate::domain::{InitSystem, Layout, UnitDefinition};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::OsFs;

/// Mode of sysv init scripts.
const SCRIPT_MODE: u32 = 0o755;
const UNIT_MODE: u32 = 0o644;

/// Production `ServiceManager` for the detected init system.
pub struct PlatformServiceManager<R = TokioCommandRunner, F = OsFs> {
    init: InitSystem,
    layout: Layout,
    runner: R,
    fs: F,
}

impl<R: CommandRunner, F: LocalFs> PlatformServiceManager<R, F> {
    #[must_use]
    pub fn new(init: InitSystem, layout: Layout, runner: R, fs: F) -> Self {
        Self {
            init,
            layout,
            runner,
            fs,
        }
    }

    /// Installed unit file for `name`, searching every scanned directory.
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let file = self.init.unit_file_name(name);
        self.layout
            .unit_dirs(self.init)
            .into_iter()
            .map(|d| d.join(&file))
            .find(|p| self.fs.exists(p))
    }

    /// Where the unit file lives, or where a new one would go.
    fn unit_path(&self, name: &str) -> PathBuf {
        self.locate(name).unwrap_or_else(|| {
            self.layout
                .primary_unit_dir(self.init)
                .join(self.init.unit_file_name(name))
        })
    }

    async fn exec(&self, program: &str, args: &[&str]) -> Result<()> {
        let output = self.runner.run(program, args).await?;
        if !output.status.success() {
            bail!(
                "{program} {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    async fn verb(&self, verb: &str, name: &str) -> Result<()> {
        match self.init {
            InitSystem::Systemd => {
                let unit = self.init.unit_file_name(name);
                self.exec("systemctl", &[verb, &unit]).await
            }
            InitSystem::Upstart => self.exec("initctl", &[verb, name]).await,
            InitSystem::Sysv => {
                let script = self.unit_path(name);
                self.exec(&script.to_string_lossy(), &[verb]).await
            }
            InitSystem::Launchd => {
                let plist = self.unit_path(name);
                let plist = plist.to_string_lossy();
                match verb {
                    "start" => self.exec("launchctl", &["load", "-w", &plist]).await,
                    "stop" => self.exec("launchctl", &["unload", &plist]).await,
                    other => bail!("launchctl does not support {other}"),
                }
            }
        }
    }
}

impl<R: CommandRunner, F: LocalFs> ServiceManager for PlatformServiceManager<R, F> {
    fn platform(&self) -> InitSystem {
        self.init
    }

    async fn install(&self, unit: &UnitDefinition) -> Result<()> {
        let path = self
            .layout
            .primary_unit_dir(self.init)
            .join(self.init.unit_file_name(&unit.name));
        debug!(path = %path.display(), "writing unit");
        self.fs.write(&path, &unit.render(self.init))?;
        let mode = if self.init == InitSystem::Sysv {
            SCRIPT_MODE
        } else {
            UNIT_MODE
        };
        self.fs.set_permissions(&path, mode)?;
        self.reload().await
    }

    async fn uninstall(&self, name: &str) -> Result<()> {
        let Some(path) = self.locate(name) else {
            bail!("{name} is not installed");
        };
        if self.status(name).await.is_active() {
            self.stop(name).await?;
        }
        self.fs.remove_file(&path)?;
        self.reload().await
    }

    async fn start(&self, name: &str) -> Result<()> {
        self.verb("start", name).await
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.verb("stop", name).await
    }

    async fn restart(&self, name: &str) -> Result<()> {
        if self.init == InitSystem::Systemd {
            return self.verb("restart", name).await;
        }
        if self.status(name).await.is_active() {
            self.stop(name).await?;
        }
        self.start(name).await
    }

    async fn status(&self, name: &str) -> ServiceStatus {
        let active = match self.init {
            InitSystem::Systemd => {
                let unit = self.init.unit_file_name(name);
                self.runner
                    .run("systemctl", &["is-active", &unit])
                    .await
                    .is_ok_and(|o| String::from_utf8_lossy(&o.stdout).trim() == "active")
            }
            InitSystem::Upstart => self
                .runner
                .run("initctl", &["status", name])
                .await
                .is_ok_and(|o| String::from_utf8_lossy(&o.stdout).contains("start/running")),
            InitSystem::Sysv => match self.locate(name) {
                Some(script) => self
                    .runner
                    .run(&script.to_string_lossy(), &["status"])
                    .await
                    .is_ok_and(|o| o.status.success()),
                None => false,
            },
            InitSystem::Launchd => self
                .runner
                .run("launchctl", &["list", name])
                .await
                .is_ok_and(|o| o.status.success()),
        };
        if active {
            ServiceStatus::Active
        } else {
            ServiceStatus::Inactive
        }
    }

    async fn reload(&self) -> Result<()> {
        if !self.init.needs_reload() {
            return Ok(());
        }
        self.exec("systemctl", &["daemon-reload"]).await
    }
}
