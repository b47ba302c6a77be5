//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod aggregate;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod ini;
pub mod init_system;
pub mod local_service;
pub mod migration;
pub mod paths;
pub mod reconcile;
pub mod registry;
pub mod unit_file;

pub use aggregate::{BulkOutcome, ErrorList, PartialFailureError};
pub use config::{SsmConfig, validate_name};
pub use error::{ConfigurationError, ConnectivityError, ServiceError};
pub use init_system::InitSystem;
pub use local_service::{LocalService, UnitName, parse_unit_name};
pub use migration::{MigrationEvent, MigrationState, PollPolicy, UnitMigration};
pub use paths::Layout;
pub use reconcile::InstallationReport;
pub use registry::{CatalogNode, CatalogServiceEntry, Node, Registration, RemoteServiceRecord};
pub use unit_file::{ShadowPatch, UnitDefinition};
