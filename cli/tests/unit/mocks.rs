//! Shared fakes for unit tests.
//!
//! Every port has an in-memory stand-in here so service tests run without
//! spawning processes, touching the disk, or opening sockets.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, bail};
use ssm_admin::application::ports::{
    AnalyticsApi, Catalog, CommandRunner, ConfigStore, DirEntry, ExporterInit, ExporterPlugin,
    KvStore, LocalFs, ProgressReporter, ServiceManager, ServiceStatus,
};
use ssm_admin::domain::{
    CatalogNode, CatalogServiceEntry, InitSystem, Layout, Node, Registration, RemoteServiceRecord,
    SsmConfig, UnitDefinition,
};
use ssm_common::{Domain, ExporterInfo};

use crate::helpers::ok_output;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ── Filesystem ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct FsState {
    files: BTreeMap<PathBuf, String>,
    modes: BTreeMap<PathBuf, u32>,
    dirs: BTreeSet<PathBuf>,
}

/// In-memory filesystem. Clones share state.
#[derive(Clone, Default)]
pub struct MemFs {
    state: Arc<Mutex<FsState>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, content: &str) {
        lock(&self.state).files.insert(path.into(), content.into());
    }

    /// Register an (empty) directory.
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        lock(&self.state).dirs.insert(path.into());
    }

    pub fn file(&self, path: &Path) -> Option<String> {
        lock(&self.state).files.get(path).cloned()
    }

    pub fn mode(&self, path: &Path) -> Option<u32> {
        lock(&self.state).modes.get(path).copied()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        lock(&self.state).files.keys().cloned().collect()
    }
}

impl LocalFs for MemFs {
    fn list_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let state = lock(&self.state);
        let entries: Vec<DirEntry> = state
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| {
                Some(DirEntry {
                    name: p.file_name()?.to_string_lossy().into_owned(),
                    path: p.clone(),
                    is_dir: false,
                })
            })
            .collect();
        if entries.is_empty() && !state.dirs.contains(dir) {
            bail!("{} does not exist", dir.display());
        }
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        let state = lock(&self.state);
        state.files.contains_key(path)
            || state.dirs.contains(path)
            || state.files.keys().any(|p| p.starts_with(path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        match lock(&self.state).files.get(path) {
            Some(c) => Ok(c.clone()),
            None => bail!("{} not found", path.display()),
        }
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        lock(&self.state)
            .files
            .insert(path.to_path_buf(), content.into());
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self.read_to_string(from)?;
        self.write(to, &content)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = lock(&self.state);
        let Some(content) = state.files.remove(from) else {
            bail!("{} not found", from.display());
        };
        state.files.insert(to.to_path_buf(), content);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        match lock(&self.state).files.remove(path) {
            Some(_) => Ok(()),
            None => bail!("{} not found", path.display()),
        }
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let mut state = lock(&self.state);
        if state.files.keys().any(|p| p.starts_with(path)) {
            bail!("{} is not empty", path.display());
        }
        state.dirs.remove(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = lock(&self.state);
        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        lock(&self.state).modes.insert(path.to_path_buf(), mode);
        Ok(())
    }
}

// ── Service manager ──────────────────────────────────────────────────────────

/// Service manager over a `MemFs`, recording every mutating call.
///
/// Shadow (`*-upgrade`) units exit after `shadow_polls` status checks while
/// active; `None` keeps them running forever. The definition each unit had
/// when it was started is kept for inspection.
pub struct FakeManager {
    pub init: InitSystem,
    pub layout: Layout,
    pub fs: MemFs,
    active: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<BTreeSet<String>>,
    shadow_polls: Option<u32>,
    countdown: Mutex<BTreeMap<String, u32>>,
    started: Mutex<BTreeMap<String, String>>,
}

impl FakeManager {
    pub fn new(init: InitSystem, layout: Layout, fs: MemFs) -> Self {
        Self {
            init,
            layout,
            fs,
            active: Mutex::default(),
            calls: Mutex::default(),
            failing: Mutex::default(),
            shadow_polls: Some(0),
            countdown: Mutex::default(),
            started: Mutex::default(),
        }
    }

    #[must_use]
    pub fn with_shadow_polls(mut self, polls: Option<u32>) -> Self {
        self.shadow_polls = polls;
        self
    }

    /// Write a unit file into the primary unit directory.
    pub fn add_unit(&self, name: &str) -> PathBuf {
        let path = self
            .layout
            .primary_unit_dir(self.init)
            .join(self.init.unit_file_name(name));
        self.fs.add_file(&path, &format!("[Service]\nExecStart=/opt/{name}\n"));
        path
    }

    pub fn set_active(&self, name: &str) {
        lock(&self.active).insert(name.into());
    }

    pub fn is_active(&self, name: &str) -> bool {
        lock(&self.active).contains(name)
    }

    /// Make `"<verb> <unit>"` fail.
    pub fn fail_on(&self, call: &str) {
        lock(&self.failing).insert(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Unit file body found under `name` when it was last started.
    pub fn started_definition(&self, name: &str) -> Option<String> {
        lock(&self.started).get(name).cloned()
    }

    pub fn count(&self, call: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: String) -> Result<()> {
        let fail = lock(&self.failing).contains(&call);
        lock(&self.calls).push(call.clone());
        if fail {
            bail!("{call}: exit status 1");
        }
        Ok(())
    }

    fn unit_path(&self, name: &str) -> Option<PathBuf> {
        self.layout
            .unit_dirs(self.init)
            .into_iter()
            .map(|d| d.join(self.init.unit_file_name(name)))
            .find(|p| self.fs.file(p).is_some())
    }
}

impl ServiceManager for FakeManager {
    fn platform(&self) -> InitSystem {
        self.init
    }

    async fn install(&self, unit: &UnitDefinition) -> Result<()> {
        self.record(format!("install {}", unit.name))?;
        let path = self
            .layout
            .primary_unit_dir(self.init)
            .join(self.init.unit_file_name(&unit.name));
        self.fs.add_file(path, &format!("ExecStart={}\n", unit.executable));
        Ok(())
    }

    async fn uninstall(&self, name: &str) -> Result<()> {
        self.record(format!("uninstall {name}"))?;
        let Some(path) = self.unit_path(name) else {
            bail!("{name} is not installed");
        };
        lock(&self.active).remove(name);
        self.fs.remove_file(&path)
    }

    async fn start(&self, name: &str) -> Result<()> {
        self.record(format!("start {name}"))?;
        if let Some(body) = self.unit_path(name).and_then(|p| self.fs.file(&p)) {
            lock(&self.started).insert(name.into(), body);
        }
        lock(&self.active).insert(name.into());
        if name.ends_with("-upgrade")
            && let Some(polls) = self.shadow_polls
        {
            lock(&self.countdown).insert(name.into(), polls);
        }
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.record(format!("stop {name}"))?;
        lock(&self.active).remove(name);
        Ok(())
    }

    async fn restart(&self, name: &str) -> Result<()> {
        self.record(format!("restart {name}"))?;
        if self.unit_path(name).is_none() {
            bail!("{name} is not installed");
        }
        lock(&self.active).insert(name.into());
        Ok(())
    }

    async fn status(&self, name: &str) -> ServiceStatus {
        let mut active = lock(&self.active);
        if active.contains(name) {
            let mut countdown = lock(&self.countdown);
            if let Some(left) = countdown.get_mut(name) {
                if *left == 0 {
                    countdown.remove(name);
                    active.remove(name);
                } else {
                    *left -= 1;
                }
            }
        }
        if active.contains(name) {
            ServiceStatus::Active
        } else {
            ServiceStatus::Inactive
        }
    }

    async fn reload(&self) -> Result<()> {
        self.record("reload".into())
    }
}

// ── Command runner ───────────────────────────────────────────────────────────

/// Records command lines; answers with canned outputs matched by prefix.
/// Clones share state.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<Vec<(String, Output)>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer command lines starting with `prefix` with `output`.
    pub fn respond(&self, prefix: &str, output: Output) {
        lock(&self.responses).push((prefix.into(), output));
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        lock(&self.calls).push(line.clone());
        let canned = lock(&self.responses)
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone());
        Ok(canned.unwrap_or_else(|| ok_output(b"")))
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RegistryState {
    nodes: BTreeMap<String, CatalogNode>,
    kv: BTreeMap<String, Vec<u8>>,
    calls: Vec<String>,
    offline: bool,
}

/// In-memory catalog and KV store.
#[derive(Default)]
pub struct FakeRegistry {
    state: Mutex<RegistryState>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a node with services.
    pub fn add_node(&self, node: &Node, services: Vec<RemoteServiceRecord>) {
        lock(&self.state).nodes.insert(
            node.name.clone(),
            CatalogNode {
                node: node.clone(),
                services,
            },
        );
    }

    pub fn put_kv(&self, key: &str, value: &str) {
        lock(&self.state)
            .kv
            .insert(key.into(), value.as_bytes().to_vec());
    }

    pub fn kv_keys(&self) -> Vec<String> {
        lock(&self.state).kv.keys().cloned().collect()
    }

    /// Every call fails with a transport error.
    pub fn go_offline(&self) {
        lock(&self.state).offline = true;
    }

    pub fn services_of(&self, node: &str) -> Vec<RemoteServiceRecord> {
        lock(&self.state)
            .nodes
            .get(node)
            .map(|n| n.services.clone())
            .unwrap_or_default()
    }

    /// Mutating calls, e.g. `register mysql:metrics`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    fn guard(&self) -> Result<MutexGuard<'_, RegistryState>> {
        let state = lock(&self.state);
        if state.offline {
            bail!("dial tcp 10.0.0.100:443: connect: connection refused");
        }
        Ok(state)
    }
}

impl Catalog for FakeRegistry {
    async fn node(&self, name: &str) -> Result<Option<CatalogNode>> {
        Ok(self.guard()?.nodes.get(name).cloned())
    }

    async fn service(&self, service: &str, tag: Option<&str>) -> Result<Vec<CatalogServiceEntry>> {
        let state = self.guard()?;
        Ok(state
            .nodes
            .values()
            .flat_map(|n| n.services.iter().map(move |s| (n, s)))
            .filter(|(_, s)| s.service == service)
            .filter(|(_, s)| tag.is_none_or(|t| s.tags.iter().any(|x| x == t)))
            .map(|(n, s)| CatalogServiceEntry {
                node: n.node.name.clone(),
                address: n.node.address.clone(),
                service_id: s.service_id.clone(),
                tags: s.tags.clone(),
            })
            .collect())
    }

    async fn register(&self, registration: &Registration) -> Result<()> {
        let mut state = self.guard()?;
        state
            .calls
            .push(format!("register {}", registration.service_id));
        let entry = state
            .nodes
            .entry(registration.node.name.clone())
            .or_insert_with(|| CatalogNode {
                node: registration.node.clone(),
                services: Vec::new(),
            });
        entry
            .services
            .retain(|s| s.service_id != registration.service_id);
        entry.services.push(RemoteServiceRecord {
            service_id: registration.service_id.clone(),
            service: registration.service.clone(),
            node: registration.node.name.clone(),
            address: registration.node.address.clone(),
            port: registration.port,
            tags: registration.tags.clone(),
        });
        Ok(())
    }

    async fn deregister(&self, node: &str, service_id: &str) -> Result<()> {
        let mut state = self.guard()?;
        state.calls.push(format!("deregister {service_id}"));
        if let Some(n) = state.nodes.get_mut(node) {
            n.services.retain(|s| s.service_id != service_id);
        }
        Ok(())
    }
}

impl KvStore for FakeRegistry {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut state = self.guard()?;
        state.calls.push(format!("put {key}"));
        state.kv.insert(key.into(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.guard()?.kv.get(key).cloned())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .guard()?
            .kv
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_tree(&self, prefix: &str) -> Result<()> {
        let mut state = self.guard()?;
        state.calls.push(format!("delete {prefix}"));
        state.kv.retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }
}

// ── Analytics ────────────────────────────────────────────────────────────────

/// Records deleted analytics instances; optionally fails every delete.
#[derive(Default)]
pub struct AnalyticsSpy {
    pub deleted: Mutex<Vec<String>>,
    pub fail: bool,
}

impl AnalyticsSpy {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }
}

impl AnalyticsApi for AnalyticsSpy {
    async fn delete_instance(&self, uuid: &str) -> Result<()> {
        if self.fail {
            bail!("qan-api unavailable");
        }
        lock(&self.deleted).push(uuid.into());
        Ok(())
    }
}

// ── Exporter plugin ──────────────────────────────────────────────────────────

/// Exporter adapter returning canned facts.
pub struct FakePlugin {
    pub domain: Domain,
    pub executable: String,
    pub port: u16,
    pub info: ExporterInfo,
    pub kv: Vec<(String, Vec<u8>)>,
    pub cluster: Option<String>,
    pub ssl_seen: Option<bool>,
}

impl FakePlugin {
    pub fn new(domain: Domain, executable: &str, port: u16) -> Self {
        Self {
            domain,
            executable: executable.into(),
            port,
            info: ExporterInfo {
                distro: "Linux".into(),
                version: "6.1".into(),
                ..ExporterInfo::default()
            },
            kv: Vec::new(),
            cluster: None,
            ssl_seen: None,
        }
    }
}

impl ExporterPlugin for FakePlugin {
    async fn init(&mut self, params: &ExporterInit<'_>) -> Result<ExporterInfo> {
        self.ssl_seen = Some(params.tls_key_file.is_some());
        Ok(self.info.clone())
    }

    fn name(&self) -> Domain {
        self.domain
    }

    fn listen_port(&self) -> u16 {
        self.port
    }

    fn executable_name(&self) -> &str {
        &self.executable
    }

    fn extra_key_values(&self) -> Vec<(String, Vec<u8>)> {
        self.kv.clone()
    }

    fn cluster_name(&self) -> Option<String> {
        self.cluster.clone()
    }
}

// ── Config store ─────────────────────────────────────────────────────────────

/// In-memory configuration store.
pub struct MemConfigStore {
    config: Mutex<Option<SsmConfig>>,
    pub fail_remove: bool,
    path: PathBuf,
}

impl MemConfigStore {
    pub fn new(config: Option<SsmConfig>) -> Self {
        Self {
            config: Mutex::new(config),
            fail_remove: false,
            path: PathBuf::from("/opt/ss/ssm-client/ssm.yml"),
        }
    }

    pub fn current(&self) -> Option<SsmConfig> {
        lock(&self.config).clone()
    }
}

impl ConfigStore for MemConfigStore {
    fn load(&self) -> Result<SsmConfig> {
        Ok(lock(&self.config).clone().unwrap_or_default())
    }

    fn save(&self, config: &SsmConfig) -> Result<()> {
        *lock(&self.config) = Some(config.clone());
        Ok(())
    }

    fn exists(&self) -> bool {
        lock(&self.config).is_some()
    }

    fn remove(&self) -> Result<()> {
        if self.fail_remove {
            bail!("permission denied");
        }
        *lock(&self.config) = None;
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}

// ── Progress reporter ────────────────────────────────────────────────────────

/// Collects warnings; ignores the rest.
#[derive(Default)]
pub struct NoopReporter {
    pub warnings: Mutex<Vec<String>>,
}

impl NoopReporter {
    pub fn warnings(&self) -> Vec<String> {
        lock(&self.warnings).clone()
    }
}

impl ProgressReporter for NoopReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, message: &str) {
        lock(&self.warnings).push(message.into());
    }
}
