//! Application service: adding, removing and listing monitored services.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use ssm_common::ServiceType;

use crate::application::ports::{
    AnalyticsApi, Catalog, CommandRunner, ConfigStore, ExporterInit, ExporterPlugin, KvStore,
    LocalFs, ServiceManager, ServiceStatus,
};
use crate::application::services::lifecycle::LifecycleController;
use crate::application::services::local_index::LocalServiceIndex;
use crate::application::services::registry::{NewService, ServiceRegistry};
use crate::domain::registry::service_tags;
use crate::domain::{
    BulkOutcome, ErrorList, Layout, RemoteServiceRecord, ServiceError, UnitDefinition,
    validate_name,
};

/// Options for adding a service.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Defaults to the client name.
    pub alias: Option<String>,
    pub cluster: Option<String>,
    pub disable_ssl: bool,
}

/// What `add` published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedService {
    pub service_type: ServiceType,
    pub alias: String,
    pub unit: String,
    pub port: u16,
    pub tags: Vec<String>,
}

/// One row of `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceListing {
    pub service_type: ServiceType,
    pub unit: String,
    pub status: ServiceStatus,
    pub legacy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Dependencies of the add/remove use-cases.
pub struct Monitoring<'a, F, M, R, C, K, A, S> {
    pub fs: &'a F,
    pub manager: &'a M,
    pub runner: &'a R,
    pub registry: &'a ServiceRegistry<'a, C, K>,
    pub analytics: &'a A,
    pub config: &'a S,
    pub layout: &'a Layout,
}

impl<F, M, R, C, K, A, S> Monitoring<'_, F, M, R, C, K, A, S>
where
    F: LocalFs,
    M: ServiceManager,
    R: CommandRunner,
    C: Catalog,
    K: KvStore,
    A: AnalyticsApi,
    S: ConfigStore,
{
    fn lifecycle(&self) -> LifecycleController<'_, M, R> {
        LifecycleController::new(self.manager, self.runner)
    }

    /// Configure an exporter, publish it, and start its unit.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError::InvalidName` for a malformed alias.
    /// - `ServiceError::AlreadyMonitored` when this node already has the type.
    /// - `ServiceError::DuplicateClient` / `DuplicateAlias` from the registry.
    /// - Any adapter, registry or service-manager failure.
    pub async fn add(
        &self,
        service_type: ServiceType,
        plugin: &mut impl ExporterPlugin,
        opts: &AddOptions,
    ) -> Result<AddedService> {
        let mut config = self.config.load()?;
        let alias = opts
            .alias
            .clone()
            .unwrap_or_else(|| config.client_name.clone());
        validate_name("alias", &alias)?;

        let auth_file = self.config.path();
        let (key, cert) = (self.layout.ssl_key_file(), self.layout.ssl_cert_file());
        let ssl = !opts.disable_ssl;
        let params = ExporterInit {
            credentials: &config.mysql_password,
            bind_address: &config.bind_address,
            auth_file: &auth_file,
            tls_key_file: ssl.then_some(key.as_path()),
            tls_cert_file: ssl.then_some(cert.as_path()),
        };
        let info = plugin
            .init(&params)
            .await
            .with_context(|| format!("initialising {}", plugin.name()))?;

        if let Some(credential) = info.rotated_credential.clone()
            && credential != config.mysql_password
        {
            config.mysql_password = credential;
            self.config.save(&config)?;
        }

        if self.registry.lookup(service_type, None).await?.is_some() {
            return Err(ServiceError::AlreadyMonitored { service_type }.into());
        }

        let cluster = opts.cluster.clone().or_else(|| plugin.cluster_name());
        let tags = service_tags(&alias, ssl, &info, cluster.as_deref());
        let port = plugin.listen_port();
        self.registry
            .register(NewService {
                service_type,
                alias: &alias,
                tags: tags.clone(),
                port,
                kv: plugin.extra_key_values(),
            })
            .await?;

        let unit = self.ensure_unit(service_type, plugin.executable_name()).await?;
        self.lifecycle().start(&unit).await?;
        info!(%service_type, alias, unit, "service added");

        Ok(AddedService {
            service_type,
            alias,
            unit,
            port,
            tags,
        })
    }

    /// Install the canonical unit unless some unit for the type exists.
    async fn ensure_unit(&self, service_type: ServiceType, executable: &str) -> Result<String> {
        let index = LocalServiceIndex::new(self.fs, self.manager, self.layout);
        if let Some(existing) = index.find(service_type) {
            return Ok(existing.service_name);
        }
        let binary = if service_type.is_queries() {
            self.layout.qan_agent_binary()
        } else {
            self.layout.exporter_binary(executable)
        };
        let unit = UnitDefinition {
            name: service_type.unit_name(),
            description: format!("SSM {service_type} exporter"),
            executable: binary.display().to_string(),
            arguments: Vec::new(),
        };
        self.lifecycle().install(&unit).await?;
        Ok(unit.name)
    }

    /// Deregister a service, drop its KV subtree and stop its unit.
    ///
    /// Query services also lose their upstream analytics instances.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NoService` when nothing matches, leaving the
    /// registry untouched.
    pub async fn remove(
        &self,
        service_type: ServiceType,
        alias: Option<&str>,
    ) -> Result<RemoteServiceRecord> {
        let record = self
            .registry
            .lookup(service_type, alias)
            .await?
            .ok_or(ServiceError::NoService)?;
        self.registry.deregister_id(&record.service_id).await?;
        if service_type.is_queries() {
            self.registry
                .purge_analytics(&record.service_id, self.analytics)
                .await;
        }
        self.registry.delete_kv(&record.service_id).await?;

        let unit = LocalServiceIndex::new(self.fs, self.manager, self.layout)
            .find(service_type)
            .map_or_else(|| service_type.unit_name(), |s| s.service_name);
        self.lifecycle().stop(&unit).await?;
        info!(%service_type, unit, "service removed");
        Ok(record)
    }

    /// Remove every service this node publishes, continuing past failures.
    ///
    /// Clears the stored database credential afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error only if the node's entries cannot be read or the
    /// configuration cannot be saved. Per-service failures are in the outcome.
    pub async fn remove_all(&self) -> Result<BulkOutcome> {
        let services = self.registry.node_services().await?;
        let mut errors = ErrorList::new();
        let mut affected = 0;

        for record in &services {
            let Some(service_type) = record.service_type() else {
                warn!(service = %record.service, "unknown service type, skipping");
                continue;
            };
            if errors
                .record(self.remove(service_type, record.alias()).await)
                .is_some()
            {
                affected += 1;
            }
        }

        let mut config = self.config.load()?;
        if !config.mysql_password.is_empty() {
            config.mysql_password.clear();
            self.config.save(&config)?;
        }

        Ok(BulkOutcome {
            affected,
            total: services.len(),
            error: errors.into_error(),
        })
    }
}

/// Local services with their status and, when known, their registration.
///
/// A registry failure is logged and the registration columns are left empty.
pub async fn list_services<F, M, C, K>(
    index: &LocalServiceIndex<'_, F, M>,
    manager: &M,
    registry: Option<&ServiceRegistry<'_, C, K>>,
) -> Vec<ServiceListing>
where
    F: LocalFs,
    M: ServiceManager,
    C: Catalog,
    K: KvStore,
{
    let registered = match registry {
        Some(r) => r.node_services().await.unwrap_or_else(|e| {
            warn!(error = %e, "registry unavailable, listing local state only");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for svc in index.discover(&[]) {
        let record = registered.iter().find(|r| r.is_type(svc.service_type));
        rows.push(ServiceListing {
            service_type: svc.service_type,
            status: manager.status(&svc.service_name).await,
            legacy: svc.is_legacy(),
            alias: record.and_then(|r| r.alias().map(str::to_string)),
            port: record.map(|r| r.port),
            unit: svc.service_name,
        });
    }
    rows
}
