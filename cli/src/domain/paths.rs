//! Filesystem layout, resolved under a configurable root.

use std::path::{Path, PathBuf};

use crate::domain::init_system::InitSystem;

pub const SSM_BASE_DIR: &str = "/opt/ss/ssm-client";
pub const AGENT_BASE_DIR: &str = "/opt/ss/qan-agent";
/// Install root of the predecessor package.
pub const PMM_BASE_DIR: &str = "/usr/local/percona/pmm-client";

pub const CONFIG_FILE_NAME: &str = "ssm.yml";

/// Agent directories removed on full uninstall.
pub const AGENT_STATE_DIRS: [&str; 4] = ["config", "data", "instance", "trash"];

/// Leftover suffixes package managers leave next to unit files.
pub const PACKAGE_LEFTOVER_SUFFIXES: [&str; 2] = [".rpmsave", ".dpkg-old"];

/// Every path the client touches, prefixed by `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Layout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-anchor an absolute system path under the root.
    #[must_use]
    pub fn resolve(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.resolve(SSM_BASE_DIR)
    }

    #[must_use]
    pub fn agent_dir(&self) -> PathBuf {
        self.resolve(AGENT_BASE_DIR)
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.base_dir().join(CONFIG_FILE_NAME)
    }

    /// Directory that held exporter configs before they moved up a level.
    #[must_use]
    pub fn legacy_config_dir(&self) -> PathBuf {
        self.base_dir().join("config")
    }

    #[must_use]
    pub fn exporter_config(&self, exporter: &str) -> PathBuf {
        self.base_dir().join(format!("{exporter}.conf"))
    }

    #[must_use]
    pub fn legacy_exporter_config(&self, exporter: &str) -> PathBuf {
        self.legacy_config_dir().join(format!("{exporter}.conf"))
    }

    #[must_use]
    pub fn exporter_binary(&self, exporter: &str) -> PathBuf {
        self.base_dir().join(exporter)
    }

    #[must_use]
    pub fn qan_agent_binary(&self) -> PathBuf {
        self.agent_dir().join("bin").join("ssm-qan-agent")
    }

    #[must_use]
    pub fn ssl_cert_file(&self) -> PathBuf {
        self.base_dir().join("server.crt")
    }

    #[must_use]
    pub fn ssl_key_file(&self) -> PathBuf {
        self.base_dir().join("server.key")
    }

    #[must_use]
    pub fn unit_dirs(&self, init: InitSystem) -> Vec<PathBuf> {
        init.unit_dirs().iter().map(|d| self.resolve(d)).collect()
    }

    #[must_use]
    pub fn primary_unit_dir(&self, init: InitSystem) -> PathBuf {
        self.resolve(init.primary_unit_dir())
    }

    #[must_use]
    pub fn agent_state_dirs(&self) -> Vec<PathBuf> {
        let agent = self.agent_dir();
        AGENT_STATE_DIRS.iter().map(|d| agent.join(d)).collect()
    }
}
