//! Domain types and validators for the client configuration (`ssm.yml`).
//!
//! Pure functions only: no I/O and no async.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigurationError;
use crate::domain::registry::Node;

#[allow(clippy::expect_used)]
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-\w:\.]{2,60}$").expect("name pattern is valid"));

const MASK: &str = "********";

// ── Config schema ────────────────────────────────────────────────────────────

/// Client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsmConfig {
    /// Registry address, `host[:port]`.
    pub server_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_user: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_password: String,
    pub server_ssl: bool,
    pub server_insecure_ssl: bool,
    /// This node's name in the registry.
    pub client_name: String,
    pub client_address: String,
    /// Address exporters listen on.
    pub bind_address: String,
    /// Credential generated by the mysql adapter.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mysql_password: String,
}

impl SsmConfig {
    /// `https` when either SSL mode is on.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.server_ssl || self.server_insecure_ssl {
            "https"
        } else {
            "http"
        }
    }

    /// Flag to repeat when telling the user how to reconfigure.
    #[must_use]
    pub fn ssl_flag(&self) -> &'static str {
        if self.server_ssl {
            "--server-ssl"
        } else if self.server_insecure_ssl {
            "--server-insecure-ssl"
        } else {
            ""
        }
    }

    #[must_use]
    pub fn has_auth(&self) -> bool {
        !self.server_user.is_empty()
    }

    /// This client's registry identity.
    ///
    /// # Errors
    ///
    /// Returns `MissingSetting` when the client name or address is unset.
    pub fn node(&self) -> Result<Node> {
        if self.client_name.is_empty() {
            return Err(ConfigurationError::MissingSetting("client name").into());
        }
        if self.client_address.is_empty() {
            return Err(ConfigurationError::MissingSetting("client address").into());
        }
        Ok(Node {
            name: self.client_name.clone(),
            address: self.client_address.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns `MissingSetting` when no server address is configured.
    pub fn require_server(&self) -> Result<&str> {
        if self.server_address.is_empty() {
            return Err(ConfigurationError::MissingSetting("server address").into());
        }
        Ok(&self.server_address)
    }

    /// Copy safe to print: secrets replaced by a mask.
    #[must_use]
    pub fn masked(&self) -> Self {
        let mask = |s: &str| if s.is_empty() { String::new() } else { MASK.to_string() };
        Self {
            server_password: mask(&self.server_password),
            mysql_password: mask(&self.mysql_password),
            ..self.clone()
        }
    }
}

/// Partial update from `ssm-admin config` flags. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub server_address: Option<String>,
    pub server_user: Option<String>,
    pub server_password: Option<String>,
    pub server_ssl: Option<bool>,
    pub server_insecure_ssl: Option<bool>,
    pub client_name: Option<String>,
    pub client_address: Option<String>,
    pub bind_address: Option<String>,
}

impl ConfigUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.server_address.is_none()
            && self.server_user.is_none()
            && self.server_password.is_none()
            && self.server_ssl.is_none()
            && self.server_insecure_ssl.is_none()
            && self.client_name.is_none()
            && self.client_address.is_none()
            && self.bind_address.is_none()
    }

    /// Validate and apply onto `config`.
    ///
    /// Enabling one SSL mode clears the other. A client address given without
    /// a bind address also becomes the bind address.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` when the client name does not match the name pattern.
    pub fn apply(self, config: &mut SsmConfig) -> Result<()> {
        if let Some(name) = &self.client_name {
            validate_name("client name", name)?;
        }
        let bind_from_client = self.bind_address.is_none() && self.client_address.is_some();
        if let Some(v) = self.server_address {
            config.server_address = v;
        }
        if let Some(v) = self.server_user {
            config.server_user = v;
        }
        if let Some(v) = self.server_password {
            config.server_password = v;
        }
        if let Some(true) = self.server_ssl {
            config.server_ssl = true;
            config.server_insecure_ssl = false;
        } else if let Some(false) = self.server_ssl {
            config.server_ssl = false;
        }
        if let Some(true) = self.server_insecure_ssl {
            config.server_insecure_ssl = true;
            config.server_ssl = false;
        } else if let Some(false) = self.server_insecure_ssl {
            config.server_insecure_ssl = false;
        }
        if let Some(v) = self.client_name {
            config.client_name = v;
        }
        if let Some(v) = self.client_address {
            if bind_from_client {
                config.bind_address.clone_from(&v);
            }
            config.client_address = v;
        }
        if let Some(v) = self.bind_address {
            config.bind_address = v;
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a client name or service alias.
///
/// # Errors
///
/// Returns `InvalidName` if `value` does not match `^[-\w:\.]{2,60}$`.
pub fn validate_name(what: &'static str, value: &str) -> Result<()> {
    if NAME.is_match(value) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidName {
            what,
            value: value.to_string(),
        }
        .into())
    }
}
