//! Locally installed services and the unit filename grammar.
//!
//! Unit names follow `^(ssm|pmm)-([a-z]+-[a-z]+)(-\d+)?$`. The middle group is
//! the hyphenated service type; a trailing number marks a legacy, per-port
//! unit from the older package layout.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use ssm_common::ServiceType;

use crate::domain::init_system::InitSystem;

#[allow(clippy::expect_used)]
static UNIT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ssm|pmm)-([a-z]+-[a-z]+)(-\d+)?$").expect("unit name pattern is valid")
});

/// Product prefix of a unit name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitPrefix {
    Ssm,
    Pmm,
}

/// A unit name broken into its grammar parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitName {
    pub prefix: UnitPrefix,
    pub service_type: ServiceType,
    /// Trailing digits without the hyphen, present on legacy units.
    pub version_suffix: Option<String>,
}

impl UnitName {
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.version_suffix.is_some()
    }
}

/// Parse a unit name (extension already stripped).
///
/// Returns `None` for names outside the grammar and for types that are not
/// on the allow-list.
#[must_use]
pub fn parse_unit_name(name: &str) -> Option<UnitName> {
    let caps = UNIT_NAME.captures(name)?;
    let prefix = match caps.get(1)?.as_str() {
        "ssm" => UnitPrefix::Ssm,
        _ => UnitPrefix::Pmm,
    };
    let service_type = ServiceType::from_unit_fragment(caps.get(2)?.as_str()).ok()?;
    let version_suffix = caps
        .get(3)
        .map(|m| m.as_str().trim_start_matches('-').to_string());
    Some(UnitName {
        prefix,
        service_type,
        version_suffix,
    })
}

/// An installed unit recognised as an SSM (or predecessor) service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalService {
    pub service_type: ServiceType,
    pub service_name: String,
    pub file_path: PathBuf,
}

impl LocalService {
    /// Recognise a directory entry. `None` when the name does not belong to us.
    #[must_use]
    pub fn from_file_name(init: InitSystem, file_name: &str, file_path: PathBuf) -> Option<Self> {
        let unit = init.unit_from_file_name(file_name)?;
        let parsed = parse_unit_name(unit)?;
        Some(Self {
            service_type: parsed.service_type,
            service_name: unit.to_string(),
            file_path,
        })
    }

    fn parsed(&self) -> Option<UnitName> {
        parse_unit_name(&self.service_name)
    }

    /// Legacy per-port unit that needs migrating.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.parsed().is_some_and(|p| p.is_legacy())
    }

    #[must_use]
    pub fn is_pmm(&self) -> bool {
        self.parsed().is_some_and(|p| p.prefix == UnitPrefix::Pmm)
    }

    #[must_use]
    pub fn is_queries(&self) -> bool {
        self.service_type.is_queries()
    }

    /// Current-format unit name for this service's type.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        self.service_type.unit_name()
    }
}

/// Keep one service per type.
///
/// A later candidate replaces an earlier one when no entry exists yet for the
/// type or when the candidate is legacy-suffixed. Output is ordered by type.
#[must_use]
pub fn select_per_type(candidates: impl IntoIterator<Item = LocalService>) -> Vec<LocalService> {
    let mut by_type: BTreeMap<ServiceType, LocalService> = BTreeMap::new();
    for svc in candidates {
        if !by_type.contains_key(&svc.service_type) || svc.is_legacy() {
            by_type.insert(svc.service_type, svc);
        }
    }
    by_type.into_values().collect()
}
