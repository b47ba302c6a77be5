//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! platform service manager, filesystem access, and the server HTTP clients.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod consul;
pub mod exporter;
pub mod fs;
pub mod platform;
pub mod qan;
pub mod service_manager;
