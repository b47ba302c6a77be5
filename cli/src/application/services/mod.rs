//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod bulk;
pub mod config_service;
pub mod lifecycle;
pub mod local_index;
pub mod monitoring;
pub mod reconcile;
pub mod registry;
pub mod uninstall;
pub mod upgrade;
