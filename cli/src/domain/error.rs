//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

use ssm_common::{ServiceType, ServiceTypeError};

// ── Service errors ────────────────────────────────────────────────────────────

/// Errors about which services exist where.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    BadServiceType(#[from] ServiceTypeError),

    #[error("there is already one {service_type} instance under monitoring on this node.")]
    AlreadyMonitored { service_type: ServiceType },

    #[error(
        "another client '{node}' by address '{address}' is monitoring {service_type} instance under the name '{alias}'.\n\nChoose different name for this service."
    )]
    DuplicateAlias {
        service_type: ServiceType,
        alias: String,
        node: String,
        address: String,
    },

    #[error(
        "another client with the same name '{name}' but different address detected.\n\nThis client address is {ours}, the other one - {theirs}.\nRe-configure this client with the different name using 'ssm-admin config' command."
    )]
    DuplicateClient {
        name: String,
        ours: String,
        theirs: String,
    },

    #[error("no service found.")]
    NoService,
}

impl ServiceError {
    /// Whether this error is one of the duplicate-service family.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::AlreadyMonitored { .. } | Self::DuplicateAlias { .. } | Self::DuplicateClient { .. }
        )
    }
}

// ── Configuration errors ──────────────────────────────────────────────────────

/// Errors caused by local misconfiguration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid configuration for web.listen-address in {file}: '{value}'")]
    InvalidListenAddress { file: String, value: String },

    #[error("invalid {what} '{value}': must match ^[-\\w:\\.]{{2,60}}$")]
    InvalidName { what: &'static str, value: String },

    #[error("{0} is not configured. Run 'ssm-admin config' first.")]
    MissingSetting(&'static str),
}

// ── Connectivity errors ───────────────────────────────────────────────────────

/// Registry unreachable or misconfigured, with a remediation hint.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error(
        "Unable to connect to SSM server by address: {address}\n\nLooks like SSM server running with self-signed SSL certificate.\nRun 'ssm-admin config --server-insecure-ssl' to enable such configuration."
    )]
    SelfSignedCertificate { address: String },

    #[error(
        "Unable to connect to SSM server by address: {address}\n\nLooks like the server is enabled for SSL or self-signed SSL.\nUse 'ssm-admin config' to enable the corresponding SSL option."
    )]
    SslRequired { address: String },

    #[error(
        "Unable to connect to SSM server by address: {address}\n\nLooks like the server is password protected.\nUse 'ssm-admin config' to define server user and password."
    )]
    AuthRequired { address: String },

    #[error(
        "Unable to connect to SSM server by address: {address}\n\nEven though the server is reachable it does not look to be SSM server.\nCheck if the configured address is correct. {detail}"
    )]
    NotSsmServer { address: String, detail: String },

    #[error(
        "This client is configured with HTTP basic authentication.\nHowever, SSM server is not.\n\nIf you forgot to enable password protection on the server, you may want to do so.\n\nOtherwise, run the following command to reset the config and disable authentication:\nssm-admin config --server {address} {ssl_flag}"
    )]
    ServerNotPasswordProtected { address: String, ssl_flag: String },

    #[error(
        "Unable to connect to SSM server by address: {address}\n{detail}\n\n* Check if the configured address is correct.\n* If server is running on non-default port, ensure it was specified along with the address.\n* If server is enabled for SSL or self-signed SSL, enable the corresponding option.\n* You may also check the firewall settings."
    )]
    Unreachable { address: String, detail: String },
}
