//! JSON output helpers.
//!
//! Every `--json` result is one pretty-printed object on stdout. Failures
//! use the error object produced by [`format_error`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::services::bulk::LifecycleAction;
use crate::application::services::monitoring::{AddedService, ServiceListing};
use crate::application::services::reconcile::RepairReport;
use crate::application::services::upgrade::UpgradeReport;
use crate::domain::aggregate::BulkSummary;
use crate::domain::{InstallationReport, RemoteServiceRecord, SsmConfig};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable renderer.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &impl Serialize) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }

    pub fn render_listing(&self, rows: &[ServiceListing]) -> Result<()> {
        Self::print(&serde_json::json!({ "services": rows }))
    }

    pub fn render_installation(&self, report: &InstallationReport) -> Result<()> {
        Self::print(report)
    }

    pub fn render_repair(&self, report: &RepairReport) -> Result<()> {
        Self::print(report)
    }

    pub fn render_upgrade(&self, report: &UpgradeReport) -> Result<()> {
        Self::print(report)
    }

    pub fn render_lifecycle(
        &self,
        action: LifecycleAction,
        unit: &str,
        affected: bool,
    ) -> Result<()> {
        Self::print(&serde_json::json!({
            "action": action,
            "unit": unit,
            "affected": affected,
        }))
    }

    pub fn render_bulk(&self, action: &str, summary: &BulkSummary) -> Result<()> {
        Self::print(&serde_json::json!({
            "action": action,
            "affected": summary.affected,
            "total": summary.total,
            "errors": summary.errors,
        }))
    }

    pub fn render_added(&self, added: &AddedService) -> Result<()> {
        Self::print(added)
    }

    pub fn render_removed(&self, record: &RemoteServiceRecord) -> Result<()> {
        Self::print(&serde_json::json!({ "removed": record }))
    }

    pub fn render_config(&self, config: &SsmConfig, path: &Path) -> Result<()> {
        Self::print(&serde_json::json!({
            "path": path.display().to_string(),
            "config": config.masked(),
        }))
    }

    pub fn render_uninstall(&self, count: usize) -> Result<()> {
        Self::print(&serde_json::json!({ "removed": count }))
    }
}
