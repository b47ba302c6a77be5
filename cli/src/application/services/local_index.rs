//! Application service: discovery of locally installed services.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use tracing::debug;

use ssm_common::ServiceType;
use ssm_common::plugin::exporters;

use crate::application::ports::{LocalFs, ServiceManager};
use crate::domain::local_service::select_per_type;
use crate::domain::{Layout, LocalService};

/// Scans the init system's unit directories.
pub struct LocalServiceIndex<'a, F, M> {
    fs: &'a F,
    manager: &'a M,
    layout: &'a Layout,
}

impl<'a, F: LocalFs, M: ServiceManager> LocalServiceIndex<'a, F, M> {
    #[must_use]
    pub fn new(fs: &'a F, manager: &'a M, layout: &'a Layout) -> Self {
        Self {
            fs,
            manager,
            layout,
        }
    }

    /// Installed services, one per type, ordered by type.
    ///
    /// An empty `filter` returns every recognised service. Unreadable
    /// directories contribute nothing.
    #[must_use]
    pub fn discover(&self, filter: &[ServiceType]) -> Vec<LocalService> {
        let init = self.manager.platform();
        let mut candidates = Vec::new();
        for dir in self.layout.unit_dirs(init) {
            let entries = match self.fs.list_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "skipping unit directory");
                    continue;
                }
            };
            candidates.extend(
                entries
                    .into_iter()
                    .filter(|e| !e.is_dir)
                    .filter_map(|e| LocalService::from_file_name(init, &e.name, e.path)),
            );
        }
        select_per_type(candidates)
            .into_iter()
            .filter(|s| filter.is_empty() || filter.contains(&s.service_type))
            .collect()
    }

    /// The installed service of one type, if any.
    #[must_use]
    pub fn find(&self, service_type: ServiceType) -> Option<LocalService> {
        self.discover(&[service_type]).into_iter().next()
    }

    /// Installed services whose unit reports active.
    pub async fn discover_active(&self) -> Vec<LocalService> {
        let mut active = Vec::new();
        for svc in self.discover(&[]) {
            if self.manager.status(&svc.service_name).await.is_active() {
                active.push(svc);
            }
        }
        active
    }

    /// Whether any exporter config still sits in the pre-migration directory.
    #[must_use]
    pub fn legacy_configs_present(&self) -> bool {
        exporters::ALL
            .iter()
            .any(|exp| self.fs.exists(&self.layout.legacy_exporter_config(exp)))
    }
}
