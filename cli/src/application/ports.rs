//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;
use serde::Serialize;
use ssm_common::{Domain, ExporterInfo};

use crate::domain::{
    CatalogNode, CatalogServiceEntry, InitSystem, Registration, SsmConfig, UnitDefinition,
};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Binary service status. Absent units report `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Inactive,
}

impl ServiceStatus {
    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// One directory entry, one level deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Arguments handed to an exporter adapter's `init`.
pub struct ExporterInit<'a> {
    /// Database credential the adapter may use or rotate.
    pub credentials: &'a str,
    pub bind_address: &'a str,
    /// Client config file the adapter may read server credentials from.
    pub auth_file: &'a Path,
    pub tls_key_file: Option<&'a Path>,
    pub tls_cert_file: Option<&'a Path>,
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program to completion and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
}

// ── Service Manager Port ──────────────────────────────────────────────────────

/// The platform service manager.
///
/// Calls block until the underlying tool returns; there is no timeout here.
#[allow(async_fn_in_trait)]
pub trait ServiceManager {
    /// Init system this manager drives.
    fn platform(&self) -> InitSystem;
    /// Write a unit definition and make the manager aware of it.
    async fn install(&self, unit: &UnitDefinition) -> Result<()>;
    /// Stop (if running) and delete a unit definition.
    async fn uninstall(&self, name: &str) -> Result<()>;
    async fn start(&self, name: &str) -> Result<()>;
    async fn stop(&self, name: &str) -> Result<()>;
    async fn restart(&self, name: &str) -> Result<()>;
    async fn status(&self, name: &str) -> ServiceStatus;
    /// Re-read unit definitions from disk. No-op where not needed.
    async fn reload(&self) -> Result<()>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts local filesystem access.
pub trait LocalFs {
    /// Entries of `dir`, not recursing.
    fn list_dir(&self, dir: &Path) -> Result<Vec<DirEntry>>;
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, content: &str) -> Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
}

// ── Registry Ports ────────────────────────────────────────────────────────────

/// Remote service catalog.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// A node and its services, `None` when the node is unknown.
    async fn node(&self, name: &str) -> Result<Option<CatalogNode>>;
    /// Every node's entry for `service`, optionally filtered by tag.
    async fn service(&self, service: &str, tag: Option<&str>) -> Result<Vec<CatalogServiceEntry>>;
    async fn register(&self, registration: &Registration) -> Result<()>;
    async fn deregister(&self, node: &str, service_id: &str) -> Result<()>;
}

/// Registry key-value side store.
#[allow(async_fn_in_trait)]
pub trait KvStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Every key under `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
    /// Delete `prefix` and everything below it.
    async fn delete_tree(&self, prefix: &str) -> Result<()>;
}

/// Upstream query-analytics API.
#[allow(async_fn_in_trait)]
pub trait AnalyticsApi {
    async fn delete_instance(&self, uuid: &str) -> Result<()>;
}

// ── Exporter Port ─────────────────────────────────────────────────────────────

/// Per-exporter configuration adapter.
#[allow(async_fn_in_trait)]
pub trait ExporterPlugin {
    /// Configure the exporter and describe its target.
    async fn init(&mut self, params: &ExporterInit<'_>) -> Result<ExporterInfo>;
    fn name(&self) -> Domain;
    /// Port the exporter listens on. Valid after `init`.
    fn listen_port(&self) -> u16;
    /// Executable under the SSM base directory.
    fn executable_name(&self) -> &str;
    /// Extra registry KV pairs to store with the service.
    fn extra_key_values(&self) -> Vec<(String, Vec<u8>)>;
    fn cluster_name(&self) -> Option<String>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts persistence of the client configuration.
pub trait ConfigStore {
    /// Load the configuration, defaulting when the file is absent.
    fn load(&self) -> Result<SsmConfig>;
    fn save(&self, config: &SsmConfig) -> Result<()>;
    fn exists(&self) -> bool;
    fn remove(&self) -> Result<()>;
    fn path(&self) -> PathBuf;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
