//! Registry records and tag conventions.

use serde::Serialize;
use ssm_common::plugin::tags;
use ssm_common::{ExporterInfo, ServiceType};

/// This client's identity in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub name: String,
    pub address: String,
}

/// One catalog entry published by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteServiceRecord {
    pub service_id: String,
    /// Raw service name as stored; may be a type this client does not know.
    pub service: String,
    pub node: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
}

impl RemoteServiceRecord {
    #[must_use]
    pub fn service_type(&self) -> Option<ServiceType> {
        self.service.parse().ok()
    }

    #[must_use]
    pub fn is_type(&self, service_type: ServiceType) -> bool {
        self.service == service_type.to_string()
    }

    #[must_use]
    pub fn has_alias(&self, alias: &str) -> bool {
        let wanted = alias_tag(alias);
        self.tags.iter().any(|t| *t == wanted)
    }

    /// First alias tag, without its prefix.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.tags.iter().find_map(|t| t.strip_prefix(tags::ALIAS))
    }

    /// Every alias tag, without prefixes.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().filter_map(|t| t.strip_prefix(tags::ALIAS))
    }
}

/// A registry node with everything it publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogNode {
    pub node: Node,
    pub services: Vec<RemoteServiceRecord>,
}

impl CatalogNode {
    /// This node's entry for `service_type`, optionally requiring an alias tag.
    #[must_use]
    pub fn find(
        &self,
        service_type: ServiceType,
        alias: Option<&str>,
    ) -> Option<&RemoteServiceRecord> {
        self.services
            .iter()
            .filter(|s| s.is_type(service_type))
            .find(|s| alias.is_none_or(|a| s.has_alias(a)))
    }
}

/// A service entry as returned by a by-service catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogServiceEntry {
    pub node: String,
    pub address: String,
    pub service_id: String,
    pub tags: Vec<String>,
}

/// Catalog write: one service under one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub node: Node,
    pub service_id: String,
    pub service: String,
    pub tags: Vec<String>,
    pub port: u16,
}

#[must_use]
pub fn alias_tag(alias: &str) -> String {
    format!("{}{alias}", tags::ALIAS)
}

/// Tags published with a new service.
#[must_use]
pub fn service_tags(alias: &str, ssl: bool, info: &ExporterInfo, cluster: Option<&str>) -> Vec<String> {
    let scheme = if ssl { tags::SCHEME_HTTPS } else { tags::SCHEME_HTTP };
    let mut out = vec![
        alias_tag(alias),
        scheme.to_string(),
        format!("{}{}", tags::DISTRO, info.distro),
        format!("{}{}", tags::VERSION, info.version),
    ];
    if let Some(c) = cluster.filter(|c| !c.is_empty()) {
        out.push(format!("{}{c}", tags::CLUSTER));
    }
    out
}
