//! Tests for `Uninstaller`.

use std::path::Path;

use ssm_admin::application::services::monitoring::Monitoring;
use ssm_admin::application::services::registry::ServiceRegistry;
use ssm_admin::application::services::uninstall::Uninstaller;
use ssm_admin::domain::{InitSystem, Layout, Node, SsmConfig};

use crate::helpers::{node, record};
use crate::mocks::{
    AnalyticsSpy, FakeManager, FakeRegistry, MemConfigStore, MemFs, RecordingRunner,
};

const RPMSAVE: &str = "/r/etc/systemd/system/ssm-linux-metrics.service.rpmsave";
const FOREIGN_LEFTOVER: &str = "/r/etc/systemd/system/nginx.service.dpkg-old";
const AGENT_DATA: &str = "/r/opt/ss/qan-agent/data/instance.json";
const AGENT_BINARY: &str = "/r/opt/ss/qan-agent/bin/ssm-qan-agent";

struct World {
    fs: MemFs,
    manager: FakeManager,
    runner: RecordingRunner,
    reg: FakeRegistry,
    analytics: AnalyticsSpy,
    config: MemConfigStore,
    layout: Layout,
    me: Node,
}

fn world(config: Option<SsmConfig>) -> World {
    let fs = MemFs::new();
    let layout = Layout::new("/r");
    let manager = FakeManager::new(InitSystem::Systemd, layout.clone(), fs.clone());
    manager.add_unit("ssm-mongodb-metrics");
    manager.add_unit("ssm-linux-metrics");
    manager.set_active("ssm-mongodb-metrics");
    fs.add_file(RPMSAVE, "[Service]\n");
    fs.add_file(FOREIGN_LEFTOVER, "[Service]\n");
    fs.add_file(AGENT_DATA, "{}");
    fs.add_file(AGENT_BINARY, "");
    World {
        fs,
        manager,
        runner: RecordingRunner::new(),
        reg: FakeRegistry::new(),
        analytics: AnalyticsSpy::default(),
        config: MemConfigStore::new(config),
        layout,
        me: node("db1", "10.0.0.1"),
    }
}

fn configured() -> Option<SsmConfig> {
    Some(SsmConfig {
        server_address: "10.0.0.100".into(),
        client_name: "db1".into(),
        client_address: "10.0.0.1".into(),
        bind_address: "10.0.0.1".into(),
        ..SsmConfig::default()
    })
}

macro_rules! uninstaller {
    ($w:expr) => {
        Uninstaller {
            fs: &$w.fs,
            manager: &$w.manager,
            runner: &$w.runner,
            config: &$w.config,
            layout: &$w.layout,
        }
    };
}

macro_rules! monitoring {
    ($w:expr, $registry:expr) => {
        Monitoring {
            fs: &$w.fs,
            manager: &$w.manager,
            runner: &$w.runner,
            registry: $registry,
            analytics: &$w.analytics,
            config: &$w.config,
            layout: &$w.layout,
        }
    };
}

#[tokio::test]
async fn full_uninstall_counts_removed_and_stopped_services() {
    let w = world(configured());
    w.reg
        .add_node(&w.me, vec![record(&w.me, "postgresql:metrics", "db1")]);
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());
    let monitoring = monitoring!(w, &registry);

    let outcome = uninstaller!(w).run(Some(&monitoring)).await;

    assert_eq!(outcome.count, 2);
    assert!(outcome.client_error.is_none());
    assert!(w.reg.services_of("db1").is_empty());
    assert!(!w.manager.is_active("ssm-mongodb-metrics"));
    assert_eq!(w.manager.count("stop ssm-linux-metrics"), 0);

    assert!(w.fs.file(Path::new(RPMSAVE)).is_none());
    assert!(w.fs.file(Path::new(FOREIGN_LEFTOVER)).is_some());
    assert!(w.fs.file(Path::new(AGENT_DATA)).is_none());
    assert!(w.fs.file(Path::new(AGENT_BINARY)).is_some());
    assert!(w.config.current().is_none());
}

#[tokio::test]
async fn unreachable_server_still_cleans_up_locally() {
    let w = world(configured());
    w.reg.go_offline();
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());
    let monitoring = monitoring!(w, &registry);

    let outcome = uninstaller!(w).run(Some(&monitoring)).await;

    assert_eq!(outcome.count, 1);
    assert!(w.fs.file(Path::new(AGENT_DATA)).is_none());
    assert!(w.config.current().is_none());
}

#[tokio::test]
async fn config_removal_failure_is_reported() {
    let mut w = world(configured());
    w.config.fail_remove = true;

    let outcome = uninstaller!(w)
        .run::<FakeRegistry, FakeRegistry, AnalyticsSpy>(None)
        .await;

    assert_eq!(outcome.count, 1);
    let err = outcome
        .client_error
        .unwrap_or_else(|| panic!("config removal failed"));
    assert_eq!(
        format!("{err:#}"),
        "remove config file /opt/ss/ssm-client/ssm.yml failed: permission denied"
    );
}

#[tokio::test]
async fn without_config_only_units_and_leftovers_are_touched() {
    let w = world(None);
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());
    let monitoring = monitoring!(w, &registry);

    let outcome = uninstaller!(w).run(Some(&monitoring)).await;

    assert_eq!(outcome.count, 1);
    assert!(outcome.client_error.is_none());
    assert!(w.reg.calls().is_empty());
    assert!(w.fs.file(Path::new(RPMSAVE)).is_none());
    assert!(w.fs.file(Path::new(AGENT_DATA)).is_some());
}
