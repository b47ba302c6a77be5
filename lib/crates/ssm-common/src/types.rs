use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugin::{capabilities, exporters, names};

/// Monitored technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Linux,
    Mysql,
    Mongodb,
    Postgresql,
    Proxysql,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Linux,
        Domain::Mysql,
        Domain::Mongodb,
        Domain::Postgresql,
        Domain::Proxysql,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Linux => names::LINUX,
            Domain::Mysql => names::MYSQL,
            Domain::Mongodb => names::MONGODB,
            Domain::Postgresql => names::POSTGRESQL,
            Domain::Proxysql => names::PROXYSQL,
        }
    }

    /// Metrics exporter executable for this domain.
    #[must_use]
    pub fn exporter(self) -> &'static str {
        match self {
            Domain::Linux => exporters::NODE,
            Domain::Mysql => exporters::MYSQLD,
            Domain::Mongodb => exporters::MONGODB,
            Domain::Postgresql => exporters::POSTGRES,
            Domain::Proxysql => exporters::PROXYSQL,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an exporter collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Metrics,
    Queries,
}

impl Capability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Metrics => capabilities::METRICS,
            Capability::Queries => capabilities::QUERIES,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            capabilities::METRICS => Some(Capability::Metrics),
            capabilities::QUERIES => Some(Capability::Queries),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected service type string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bad service type '{given}'.\n\nService type takes the following values: {allowed}.")]
pub struct ServiceTypeError {
    pub given: String,
    pub allowed: String,
}

/// `<domain>:<capability>` classification of a monitored exporter.
///
/// Only the combinations in [`ServiceType::ALLOWED`] can be constructed
/// through parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceType {
    pub domain: Domain,
    pub capability: Capability,
}

impl ServiceType {
    pub const ALLOWED: [ServiceType; 7] = [
        ServiceType::new(Domain::Linux, Capability::Metrics),
        ServiceType::new(Domain::Mysql, Capability::Metrics),
        ServiceType::new(Domain::Mysql, Capability::Queries),
        ServiceType::new(Domain::Mongodb, Capability::Metrics),
        ServiceType::new(Domain::Mongodb, Capability::Queries),
        ServiceType::new(Domain::Postgresql, Capability::Metrics),
        ServiceType::new(Domain::Proxysql, Capability::Metrics),
    ];

    #[must_use]
    pub const fn new(domain: Domain, capability: Capability) -> Self {
        Self { domain, capability }
    }

    /// Whether this combination is on the allow-list.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        Self::ALLOWED.contains(&self)
    }

    #[must_use]
    pub fn is_queries(self) -> bool {
        self.capability == Capability::Queries
    }

    /// Executable that serves this type: the domain exporter, or the query agent.
    #[must_use]
    pub fn executable(self) -> &'static str {
        match self.capability {
            Capability::Metrics => self.domain.exporter(),
            Capability::Queries => exporters::QAN_AGENT,
        }
    }

    /// Hyphenated form used inside unit names, e.g. `mysql-metrics`.
    #[must_use]
    pub fn unit_fragment(self) -> String {
        format!("{}-{}", self.domain, self.capability)
    }

    /// Canonical current-format unit name, e.g. `ssm-mysql-metrics`.
    #[must_use]
    pub fn unit_name(self) -> String {
        format!("ssm-{}", self.unit_fragment())
    }

    /// Parse the hyphenated unit-name fragment (`mysql-metrics`).
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment is not an allow-listed type.
    pub fn from_unit_fragment(fragment: &str) -> Result<Self, ServiceTypeError> {
        fragment.replacen('-', ":", 1).parse()
    }

    fn allowed_list() -> String {
        Self::ALLOWED
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.capability)
    }
}

impl FromStr for ServiceType {
    type Err = ServiceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ServiceTypeError {
            given: s.to_string(),
            allowed: Self::allowed_list(),
        };
        let (domain, capability) = s.split_once(':').ok_or_else(err)?;
        let st = ServiceType::new(
            Domain::parse(domain).ok_or_else(err)?,
            Capability::parse(capability).ok_or_else(err)?,
        );
        if st.is_allowed() { Ok(st) } else { Err(err()) }
    }
}

impl TryFrom<String> for ServiceType {
    type Error = ServiceTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceType> for String {
    fn from(value: ServiceType) -> Self {
        value.to_string()
    }
}

/// Facts an exporter adapter reports about its target after initialisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterInfo {
    pub distro: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    /// Sanitized data source name, when the exporter connects to a database.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dsn: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query_source: String,
    /// A credential the adapter generated and the client must persist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotated_credential: Option<String>,
}
