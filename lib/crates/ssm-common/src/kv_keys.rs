//! Registry KV key layout.
//!
//! Auxiliary data for a registered service lives under
//! `<node>/<service_id>/<key>`. The service id equals the service type, so a
//! node holds at most one subtree per type.

use crate::types::Domain;

/// Format: `{node}/{service_id}/`
#[must_use]
pub fn kv_prefix(node: &str, service_id: &str) -> String {
    format!("{node}/{service_id}/")
}

/// Format: `{node}/{service_id}/{key}`
#[must_use]
pub fn kv_key(node: &str, service_id: &str, key: &str) -> String {
    format!("{node}/{service_id}/{key}")
}

/// Key under which a queries service records its analytics instance UUID.
///
/// Format: `qan_{domain}_uuid`
#[must_use]
pub fn qan_uuid_key(domain: Domain) -> String {
    format!("qan_{domain}_uuid")
}

/// Whether a full KV key names an analytics instance UUID.
///
/// Only the domains that support query analytics carry one.
#[must_use]
pub fn is_qan_uuid_key(key: &str) -> bool {
    [Domain::Mysql, Domain::Mongodb]
        .iter()
        .any(|d| key.ends_with(&format!("/{}", qan_uuid_key(*d))))
}
