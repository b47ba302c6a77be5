//! Tests for `LifecycleController`: idempotent start/stop and boot registration.

use ssm_admin::application::services::lifecycle::LifecycleController;
use ssm_admin::domain::{InitSystem, Layout};

use crate::helpers::err_output;
use crate::mocks::{FakeManager, MemFs, RecordingRunner};

fn manager(init: InitSystem) -> FakeManager {
    FakeManager::new(init, Layout::new("/r"), MemFs::new())
}

#[tokio::test]
async fn start_and_stop_report_whether_anything_changed() {
    let m = manager(InitSystem::Systemd);
    let runner = RecordingRunner::new();
    let lc = LifecycleController::new(&m, &runner);

    assert!(lc.start("ssm-linux-metrics").await.unwrap_or_else(|e| panic!("{e}")));
    assert!(!lc.start("ssm-linux-metrics").await.unwrap_or_else(|e| panic!("{e}")));
    assert!(lc.stop("ssm-linux-metrics").await.unwrap_or_else(|e| panic!("{e}")));
    assert!(!lc.stop("ssm-linux-metrics").await.unwrap_or_else(|e| panic!("{e}")));

    assert_eq!(m.count("start ssm-linux-metrics"), 1);
    assert_eq!(m.count("stop ssm-linux-metrics"), 1);
}

#[tokio::test]
async fn restart_runs_regardless_of_state() {
    let m = manager(InitSystem::Sysv);
    m.add_unit("ssm-mysql-metrics");
    let runner = RecordingRunner::new();
    let lc = LifecycleController::new(&m, &runner);

    lc.restart("ssm-mysql-metrics").await.unwrap_or_else(|e| panic!("{e}"));
    lc.restart("ssm-mysql-metrics").await.unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(m.count("restart ssm-mysql-metrics"), 2);
    assert!(m.is_active("ssm-mysql-metrics"));
}

#[tokio::test]
async fn manager_failure_carries_context() {
    let m = manager(InitSystem::Systemd);
    m.fail_on("start ssm-linux-metrics");
    let runner = RecordingRunner::new();

    let err = LifecycleController::new(&m, &runner)
        .start("ssm-linux-metrics")
        .await
        .err()
        .unwrap_or_else(|| panic!("start should fail"));

    assert_eq!(err.to_string(), "starting ssm-linux-metrics");
}

#[tokio::test]
async fn enable_uses_the_platform_boot_tool() {
    let runner = RecordingRunner::new();

    let systemd = manager(InitSystem::Systemd);
    let lc = LifecycleController::new(&systemd, &runner);
    lc.enable("ssm-linux-metrics").await.unwrap_or_else(|e| panic!("{e}"));
    lc.disable("ssm-linux-metrics").await.unwrap_or_else(|e| panic!("{e}"));

    let sysv = manager(InitSystem::Sysv);
    LifecycleController::new(&sysv, &runner)
        .enable("ssm-linux-metrics")
        .await
        .unwrap_or_else(|e| panic!("{e}"));

    let upstart = manager(InitSystem::Upstart);
    LifecycleController::new(&upstart, &runner)
        .enable("ssm-linux-metrics")
        .await
        .unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(
        runner.calls(),
        [
            "systemctl enable ssm-linux-metrics",
            "systemctl disable ssm-linux-metrics",
            "update-rc.d -f ssm-linux-metrics defaults",
        ]
    );
}

#[tokio::test]
async fn failed_boot_registration_reports_stderr() {
    let runner = RecordingRunner::new();
    runner.respond("systemctl enable", err_output(1, b"Unit file does not exist."));
    let m = manager(InitSystem::Systemd);

    let err = LifecycleController::new(&m, &runner)
        .enable("ssm-linux-metrics")
        .await
        .err()
        .unwrap_or_else(|| panic!("enable should fail"));

    assert!(err.to_string().contains("Unit file does not exist."));
}

#[tokio::test]
async fn reload_only_where_needed() {
    let runner = RecordingRunner::new();
    let systemd = manager(InitSystem::Systemd);
    let launchd = manager(InitSystem::Launchd);

    LifecycleController::new(&systemd, &runner)
        .reload()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    LifecycleController::new(&launchd, &runner)
        .reload()
        .await
        .unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(systemd.calls(), ["reload"]);
    assert!(launchd.calls().is_empty());
}
