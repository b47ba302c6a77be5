//! Tests for `ReconciliationEngine`: installation diff and repair.

use ssm_admin::application::services::reconcile::ReconciliationEngine;
use ssm_admin::application::services::registry::ServiceRegistry;
use ssm_admin::domain::{InitSystem, Layout, Node};

use crate::helpers::{instant_poll, node, record};
use crate::mocks::{AnalyticsSpy, FakeManager, FakeRegistry, MemFs, NoopReporter, RecordingRunner};

struct World {
    fs: MemFs,
    manager: FakeManager,
    runner: RecordingRunner,
    reg: FakeRegistry,
    analytics: AnalyticsSpy,
    reporter: NoopReporter,
    layout: Layout,
    me: Node,
}

fn world() -> World {
    let fs = MemFs::new();
    let layout = Layout::new("/r");
    World {
        manager: FakeManager::new(InitSystem::Systemd, layout.clone(), fs.clone()),
        fs,
        runner: RecordingRunner::new(),
        reg: FakeRegistry::new(),
        analytics: AnalyticsSpy::default(),
        reporter: NoopReporter::default(),
        layout,
        me: node("db1", "10.0.0.1"),
    }
}

macro_rules! engine {
    ($w:expr, $registry:expr) => {
        ReconciliationEngine {
            fs: &$w.fs,
            manager: &$w.manager,
            runner: &$w.runner,
            registry: $registry,
            analytics: &$w.analytics,
            layout: &$w.layout,
            poll: instant_poll(3),
            reporter: &$w.reporter,
        }
    };
}

#[tokio::test]
async fn legacy_unit_with_registration_only_needs_upgrade() {
    let w = world();
    w.manager.add_unit("ssm-mysql-metrics-12000");
    w.manager.set_active("ssm-mysql-metrics-12000");
    w.reg
        .add_node(&w.me, vec![record(&w.me, "mysql:metrics", "db1")]);
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());

    let report = engine!(w, &registry)
        .check_installation()
        .await
        .unwrap_or_else(|e| panic!("{e:#}"));

    assert!(report.upgrade_required);
    assert!(report.orphaned.is_empty());
    assert!(report.missing.is_empty());
}

#[tokio::test]
async fn empty_registry_marks_active_units_orphaned_and_nothing_missing() {
    let w = world();
    w.manager.add_unit("ssm-linux-metrics");
    w.manager.add_unit("ssm-mysql-metrics");
    w.manager.set_active("ssm-linux-metrics");
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());

    let report = engine!(w, &registry)
        .check_installation()
        .await
        .unwrap_or_else(|e| panic!("{e:#}"));

    assert!(!report.upgrade_required);
    assert_eq!(report.orphaned, ["ssm-linux-metrics"]);
    assert!(report.missing.is_empty());
}

#[tokio::test]
async fn diff_reports_orphans_and_missing_entries() {
    let w = world();
    w.manager.add_unit("ssm-linux-metrics");
    w.manager.add_unit("ssm-mysql-metrics");
    w.manager.set_active("ssm-linux-metrics");
    w.manager.set_active("ssm-mysql-metrics");
    w.reg.add_node(
        &w.me,
        vec![
            record(&w.me, "mysql:metrics", "db1"),
            record(&w.me, "mongodb:metrics", "db1"),
        ],
    );
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());

    let report = engine!(w, &registry)
        .check_installation()
        .await
        .unwrap_or_else(|e| panic!("{e:#}"));

    assert_eq!(report.orphaned, ["ssm-linux-metrics"]);
    assert_eq!(report.missing, ["mongodb:metrics"]);
}

#[tokio::test]
async fn registry_outage_is_not_mistaken_for_first_run() {
    let w = world();
    w.manager.add_unit("ssm-linux-metrics");
    w.manager.set_active("ssm-linux-metrics");
    w.reg.go_offline();
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());

    assert!(engine!(w, &registry).repair().await.is_err());
    assert!(w.manager.is_active("ssm-linux-metrics"), "nothing stopped");
}

#[tokio::test]
async fn repair_stops_orphans_and_drops_missing_entries() {
    let w = world();
    w.manager.add_unit("ssm-linux-metrics");
    w.manager.set_active("ssm-linux-metrics");
    w.reg
        .add_node(&w.me, vec![record(&w.me, "mysql:queries", "db1")]);
    w.reg.put_kv("db1/mysql:queries/qan_mysql_uuid", "uuid-7");
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());

    let report = engine!(w, &registry)
        .repair()
        .await
        .unwrap_or_else(|e| panic!("{e:#}"));

    assert!(report.upgrade.is_none());
    assert_eq!(report.stopped, ["ssm-linux-metrics"]);
    assert_eq!(report.deregistered, ["mysql:queries"]);
    assert_eq!(report.analytics_purged, 1);
    assert_eq!(w.analytics.deleted(), ["uuid-7"]);
    assert!(w.reg.kv_keys().is_empty());
    assert!(!w.manager.is_active("ssm-linux-metrics"));
}

#[tokio::test]
async fn repair_survives_analytics_failure() {
    let mut w = world();
    w.analytics = AnalyticsSpy::failing();
    w.reg
        .add_node(&w.me, vec![record(&w.me, "mongodb:queries", "db1")]);
    w.reg.put_kv("db1/mongodb:queries/qan_mongodb_uuid", "uuid-9");
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());

    let report = engine!(w, &registry)
        .repair()
        .await
        .unwrap_or_else(|e| panic!("{e:#}"));

    assert_eq!(report.analytics_purged, 0);
    assert_eq!(report.deregistered, ["mongodb:queries"]);
    assert!(w.reg.kv_keys().is_empty());
}

#[tokio::test]
async fn repair_upgrades_first_and_rechecks() {
    let w = world();
    w.manager.add_unit("ssm-mysql-metrics");
    w.manager.add_unit("ssm-mysql-metrics-42002");
    w.manager.set_active("ssm-mysql-metrics-42002");
    w.reg
        .add_node(&w.me, vec![record(&w.me, "mysql:metrics", "db1")]);
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());

    let report = engine!(w, &registry)
        .repair()
        .await
        .unwrap_or_else(|e| panic!("{e:#}"));

    let upgrade = report.upgrade.unwrap_or_else(|| panic!("upgrade ran"));
    assert_eq!(upgrade.units.len(), 1);
    assert_eq!(upgrade.restarted, ["ssm-mysql-metrics"]);
    assert!(report.stopped.is_empty());
    assert!(report.deregistered.is_empty());
}

#[tokio::test]
async fn repair_aborts_on_first_failure() {
    let w = world();
    w.manager.add_unit("ssm-linux-metrics");
    w.manager.add_unit("ssm-mysql-metrics");
    w.manager.set_active("ssm-linux-metrics");
    w.manager.set_active("ssm-mysql-metrics");
    w.manager.fail_on("stop ssm-linux-metrics");
    w.reg
        .add_node(&w.me, vec![record(&w.me, "postgresql:metrics", "db1")]);
    let registry = ServiceRegistry::new(&w.reg, &w.reg, w.me.clone());

    let err = engine!(w, &registry)
        .repair()
        .await
        .err()
        .unwrap_or_else(|| panic!("repair must fail"));

    assert!(format!("{err:#}").contains("stopping ssm-linux-metrics"));
    assert!(w.manager.is_active("ssm-mysql-metrics"), "later orphan untouched");
    assert!(w.reg.calls().is_empty(), "missing entries untouched");
}
