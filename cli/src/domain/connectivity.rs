//! Classification of registry connection failures.
//!
//! The HTTP client reports what happened on the wire; these functions decide
//! which remediation the user sees.

use crate::domain::config::SsmConfig;
use crate::domain::error::ConnectivityError;

/// What an authenticated ping of the server produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
    /// Request never got a response. Carries the full error chain text.
    Transport(String),
    Status(u16),
}

const CERT_MARKERS: [&str; 4] = [
    "cannot validate certificate",
    "invalid peer certificate",
    "certificate verify failed",
    "UnknownIssuer",
];

/// Map the first ping to an error, or `None` when the server answered usefully.
#[must_use]
pub fn classify_ping(config: &SsmConfig, outcome: &PingOutcome) -> Option<ConnectivityError> {
    let address = config.server_address.clone();
    match outcome {
        PingOutcome::Transport(message) => {
            if CERT_MARKERS.iter().any(|m| message.contains(m)) {
                Some(ConnectivityError::SelfSignedCertificate { address })
            } else {
                Some(ConnectivityError::Unreachable {
                    detail: scrub_credentials(message, config),
                    address,
                })
            }
        }
        PingOutcome::Status(400) => Some(ConnectivityError::SslRequired { address }),
        PingOutcome::Status(401) => Some(ConnectivityError::AuthRequired { address }),
        PingOutcome::Status(_) => None,
    }
}

/// The registry answered but reported no leader.
#[must_use]
pub fn not_ssm_server(config: &SsmConfig, detail: &str) -> ConnectivityError {
    ConnectivityError::NotSsmServer {
        address: config.server_address.clone(),
        detail: detail.to_string(),
    }
}

/// Client sends credentials but the server accepted an anonymous ping.
#[must_use]
pub fn check_auth_mismatch(config: &SsmConfig, anonymous_status: Option<u16>) -> Option<ConnectivityError> {
    (config.has_auth() && anonymous_status == Some(200)).then(|| {
        ConnectivityError::ServerNotPasswordProtected {
            address: config.server_address.clone(),
            ssl_flag: config.ssl_flag().to_string(),
        }
    })
}

/// Remove basic-auth credentials from an error message.
#[must_use]
pub fn scrub_credentials(message: &str, config: &SsmConfig) -> String {
    if !config.has_auth() {
        return message.to_string();
    }
    let mut out = message.replace(&format!("{}:{}@", config.server_user, config.server_password), "");
    if !config.server_password.is_empty() {
        out = out.replace(&config.server_password, "********");
    }
    out
}
