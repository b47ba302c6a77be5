//! Init-system detection.

use tracing::debug;

use crate::application::ports::CommandRunner;
use crate::domain::{InitSystem, Layout};

/// Marker directory present while systemd is PID 1.
const SYSTEMD_RUNTIME_DIR: &str = "/run/systemd/system";

/// Work out which init system manages this host.
///
/// macOS is always launchd. Elsewhere systemd wins when its runtime
/// directory exists, then upstart when `initctl` identifies itself, and sysv
/// is the fallback.
pub async fn detect_init_system(runner: &impl CommandRunner, layout: &Layout) -> InitSystem {
    if cfg!(target_os = "macos") {
        return InitSystem::Launchd;
    }
    if layout.resolve(SYSTEMD_RUNTIME_DIR).is_dir() {
        return InitSystem::Systemd;
    }
    match runner.run("initctl", &["--version"]).await {
        Ok(out) if String::from_utf8_lossy(&out.stdout).contains("upstart") => {
            return InitSystem::Upstart;
        }
        Ok(_) => {}
        Err(e) => debug!(error = %e, "initctl not available"),
    }
    InitSystem::Sysv
}
