//! Installation diff between local units and the registry.

use serde::Serialize;

use crate::domain::local_service::LocalService;
use crate::domain::registry::RemoteServiceRecord;

/// Outcome of an installation check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallationReport {
    pub upgrade_required: bool,
    /// Unit names of active local services nobody registered.
    pub orphaned: Vec<String>,
    /// Service ids registered for this node with no local unit.
    pub missing: Vec<String>,
}

impl InstallationReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        !self.upgrade_required && self.orphaned.is_empty() && self.missing.is_empty()
    }
}

/// Compute the diff.
///
/// `registered` is this node's catalog entries. An empty slice means the
/// node is unknown or has nothing registered: every active service is then
/// orphaned and nothing is reported missing.
#[must_use]
pub fn diff_installation(
    local: &[LocalService],
    active: &[LocalService],
    registered: &[RemoteServiceRecord],
    legacy_configs_present: bool,
) -> InstallationReport {
    let upgrade_required = legacy_configs_present || local.iter().any(LocalService::is_legacy);

    if registered.is_empty() {
        return InstallationReport {
            upgrade_required,
            orphaned: active.iter().map(|s| s.service_name.clone()).collect(),
            missing: Vec::new(),
        };
    }

    let orphaned = active
        .iter()
        .filter(|s| !registered.iter().any(|r| r.is_type(s.service_type)))
        .map(|s| s.service_name.clone())
        .collect();

    let missing = registered
        .iter()
        .filter(|r| !local.iter().any(|s| r.is_type(s.service_type)))
        .map(|r| r.service_id.clone())
        .collect();

    InstallationReport {
        upgrade_required,
        orphaned,
        missing,
    }
}
