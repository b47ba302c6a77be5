//! Application service: the remote service registry as seen by this node.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use ssm_common::{ServiceType, is_qan_uuid_key, kv_key, kv_prefix};

use crate::application::ports::{AnalyticsApi, Catalog, KvStore};
use crate::domain::registry::alias_tag;
use crate::domain::{Node, Registration, RemoteServiceRecord, ServiceError};

/// A service about to be published.
pub struct NewService<'a> {
    pub service_type: ServiceType,
    pub alias: &'a str,
    pub tags: Vec<String>,
    pub port: u16,
    pub kv: Vec<(String, Vec<u8>)>,
}

/// Catalog and KV access scoped to one node.
pub struct ServiceRegistry<'a, C, K> {
    catalog: &'a C,
    kv: &'a K,
    node: Node,
}

impl<'a, C: Catalog, K: KvStore> ServiceRegistry<'a, C, K> {
    #[must_use]
    pub fn new(catalog: &'a C, kv: &'a K, node: Node) -> Self {
        Self { catalog, kv, node }
    }

    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Everything this node publishes. Empty when the node is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be queried.
    pub async fn node_services(&self) -> Result<Vec<RemoteServiceRecord>> {
        let node = self
            .catalog
            .node(&self.node.name)
            .await
            .with_context(|| format!("reading registry node {}", self.node.name))?;
        Ok(node.map(|n| n.services).unwrap_or_default())
    }

    /// This node's entry for `service_type`, optionally requiring `alias`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be queried. Absence is `Ok(None)`.
    pub async fn lookup(
        &self,
        service_type: ServiceType,
        alias: Option<&str>,
    ) -> Result<Option<RemoteServiceRecord>> {
        let node = self
            .catalog
            .node(&self.node.name)
            .await
            .with_context(|| format!("reading registry node {}", self.node.name))?;
        Ok(node.and_then(|n| n.find(service_type, alias).cloned()))
    }

    /// Refuse a registration that would duplicate a client or an alias.
    ///
    /// # Errors
    ///
    /// - `ServiceError::DuplicateClient` when this client's name is held by a
    ///   node at another address that publishes services.
    /// - `ServiceError::DuplicateAlias` when another node publishes
    ///   `service_type` under `alias`.
    pub async fn check_duplicate(&self, service_type: ServiceType, alias: &str) -> Result<()> {
        if let Some(existing) = self.catalog.node(&self.node.name).await? {
            if existing.node.address != self.node.address && !existing.services.is_empty() {
                return Err(ServiceError::DuplicateClient {
                    name: self.node.name.clone(),
                    ours: self.node.address.clone(),
                    theirs: existing.node.address,
                }
                .into());
            }
        }

        let entries = self
            .catalog
            .service(&service_type.to_string(), Some(&alias_tag(alias)))
            .await?;
        if let Some(other) = entries.into_iter().find(|e| e.node != self.node.name) {
            return Err(ServiceError::DuplicateAlias {
                service_type,
                alias: alias.to_string(),
                node: other.node,
                address: other.address,
            }
            .into());
        }
        Ok(())
    }

    /// Publish a service and its KV pairs. Runs [`Self::check_duplicate`] first.
    ///
    /// The service id equals the type, so a node holds one instance per type.
    ///
    /// # Errors
    ///
    /// Returns a duplicate error, or an error if a catalog or KV write fails.
    pub async fn register(&self, new: NewService<'_>) -> Result<()> {
        self.check_duplicate(new.service_type, new.alias).await?;

        let id = new.service_type.to_string();
        let registration = Registration {
            node: self.node.clone(),
            service_id: id.clone(),
            service: id.clone(),
            tags: new.tags,
            port: new.port,
        };
        self.catalog
            .register(&registration)
            .await
            .with_context(|| format!("registering {id}"))?;
        info!(service = %id, node = %self.node.name, "registered");

        for (key, value) in &new.kv {
            let full = kv_key(&self.node.name, &id, key);
            self.kv
                .put(&full, value)
                .await
                .with_context(|| format!("storing {full}"))?;
        }
        Ok(())
    }

    /// Remove this node's `(service_type, alias)` entry and its KV subtree.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NoService` when no such entry exists, leaving the
    /// registry untouched.
    pub async fn deregister(
        &self,
        service_type: ServiceType,
        alias: Option<&str>,
    ) -> Result<RemoteServiceRecord> {
        let record = self
            .lookup(service_type, alias)
            .await?
            .ok_or(ServiceError::NoService)?;
        self.deregister_id(&record.service_id).await?;
        self.delete_kv(&record.service_id).await?;
        Ok(record)
    }

    /// Remove a catalog entry of this node by id. KV is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog write fails.
    pub async fn deregister_id(&self, service_id: &str) -> Result<()> {
        self.catalog
            .deregister(&self.node.name, service_id)
            .await
            .with_context(|| format!("deregistering {service_id}"))?;
        info!(service = service_id, node = %self.node.name, "deregistered");
        Ok(())
    }

    /// Delete the KV subtree of a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the KV delete fails.
    pub async fn delete_kv(&self, service_id: &str) -> Result<()> {
        let prefix = kv_prefix(&self.node.name, service_id);
        self.kv
            .delete_tree(&prefix)
            .await
            .with_context(|| format!("deleting {prefix}"))
    }

    /// Best-effort removal of analytics instances recorded under a service.
    ///
    /// Every failure is logged and swallowed. Returns how many were deleted.
    pub async fn purge_analytics(&self, service_id: &str, analytics: &impl AnalyticsApi) -> usize {
        let prefix = kv_prefix(&self.node.name, service_id);
        let keys = match self.kv.keys(&prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(prefix, error = %e, "cannot list analytics keys");
                return 0;
            }
        };
        let mut deleted = 0;
        for key in keys.iter().filter(|k| is_qan_uuid_key(k)) {
            let uuid = match self.kv.get(key).await {
                Ok(Some(v)) => String::from_utf8_lossy(&v).into_owned(),
                Ok(None) => continue,
                Err(e) => {
                    warn!(key, error = %e, "cannot read analytics instance id");
                    continue;
                }
            };
            match analytics.delete_instance(&uuid).await {
                Ok(()) => {
                    debug!(uuid, "deleted analytics instance");
                    deleted += 1;
                }
                Err(e) => warn!(uuid, error = %e, "cannot delete analytics instance"),
            }
        }
        deleted
    }
}
