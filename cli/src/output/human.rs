//! Human-readable terminal renderer.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize as _;

use crate::application::ports::ServiceStatus;
use crate::application::services::bulk::LifecycleAction;
use crate::application::services::monitoring::{AddedService, ServiceListing};
use crate::application::services::reconcile::RepairReport;
use crate::application::services::upgrade::{ConfigMigration, UpgradeReport};
use crate::domain::aggregate::BulkSummary;
use crate::domain::{InstallationReport, RemoteServiceRecord, SsmConfig};
use crate::output::OutputContext;

/// Renders results as terminal text using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    pub fn render_listing(&self, rows: &[ServiceListing]) -> Result<()> {
        if rows.is_empty() {
            self.ctx.info("No services under monitoring.");
            return Ok(());
        }
        if self.ctx.quiet {
            return Ok(());
        }
        let styles = &self.ctx.styles;
        println!(
            "  {} {} {} {} {}",
            format!("{:<20}", "SERVICE TYPE").style(styles.column),
            format!("{:<28}", "UNIT").style(styles.column),
            format!("{:<9}", "RUNNING").style(styles.column),
            format!("{:<16}", "NAME").style(styles.column),
            "PORT".style(styles.column),
        );
        for row in rows {
            let (status, style) = match row.status {
                ServiceStatus::Active => ("YES", styles.active),
                ServiceStatus::Inactive => ("NO", styles.inactive),
            };
            let status = format!("{status:<9}").style(style).to_string();
            let unit = format!("{:<28}", row.unit);
            let unit = if row.legacy {
                unit.style(styles.legacy).to_string()
            } else {
                unit
            };
            println!(
                "  {:<20} {unit} {status} {:<16} {}",
                row.service_type.to_string(),
                row.alias.as_deref().unwrap_or("-"),
                row.port.map_or_else(|| "-".to_string(), |p| p.to_string()),
            );
        }
        Ok(())
    }

    pub fn render_installation(&self, report: &InstallationReport) -> Result<()> {
        if report.is_healthy() {
            self.ctx.success("Installation is consistent with the server.");
            return Ok(());
        }
        if report.upgrade_required {
            self.ctx
                .warn("Legacy services or configs found. Run 'ssm-admin upgrade'.");
        }
        if !report.orphaned.is_empty() {
            self.ctx.header("Services running locally but not registered:");
            for unit in &report.orphaned {
                self.ctx.kv("  orphaned", unit);
            }
        }
        if !report.missing.is_empty() {
            self.ctx.header("Services registered but not installed locally:");
            for id in &report.missing {
                self.ctx.kv("  missing", id);
            }
        }
        self.ctx.info("Run 'ssm-admin repair' to fix.");
        Ok(())
    }

    pub fn render_repair(&self, report: &RepairReport) -> Result<()> {
        if let Some(upgrade) = &report.upgrade {
            self.render_upgrade(upgrade)?;
        }
        for unit in &report.stopped {
            self.ctx.success(&format!("Stopped orphaned {unit}"));
        }
        for id in &report.deregistered {
            self.ctx.success(&format!("Removed missing {id} from the server"));
        }
        if report.analytics_purged > 0 {
            self.ctx.info(&format!(
                "Deleted {} query analytics instance(s)",
                report.analytics_purged
            ));
        }
        if report.upgrade.is_none() && report.stopped.is_empty() && report.deregistered.is_empty() {
            self.ctx.success("Nothing to repair.");
        }
        Ok(())
    }

    pub fn render_upgrade(&self, report: &UpgradeReport) -> Result<()> {
        for c in &report.configs {
            match c {
                ConfigMigration::Moved { exporter } => {
                    self.ctx.success(&format!("Moved {exporter} config"));
                }
                ConfigMigration::Merged {
                    exporter,
                    keys_added,
                } => self.ctx.success(&format!(
                    "Merged {keys_added} setting(s) into {exporter} config"
                )),
            }
        }
        for m in &report.units {
            self.ctx.success(&format!("Migrated {}", m.unit));
            if m.poll_attempts > 0 && !m.shadow_exited {
                self.ctx
                    .warn(&format!("{} did not finish reconfiguring in time", m.unit));
            }
        }
        for unit in &report.restarted {
            self.ctx.info(&format!("Restarted {unit}"));
        }
        if report.configs.is_empty() && report.units.is_empty() {
            self.ctx.success("Already up to date.");
        }
        Ok(())
    }

    pub fn render_lifecycle(
        &self,
        action: LifecycleAction,
        unit: &str,
        affected: bool,
    ) -> Result<()> {
        if affected {
            self.ctx.success(&format!("{unit} {}", action.done()));
        } else {
            self.ctx
                .info(&format!("{unit} is already {}", action.done()));
        }
        Ok(())
    }

    pub fn render_bulk(&self, action: &str, summary: &BulkSummary) -> Result<()> {
        if summary.total == 0 {
            self.ctx.info("No services under monitoring.");
            return Ok(());
        }
        self.ctx.success(&format!(
            "OK, {action} {} of {} service(s).",
            summary.affected, summary.total
        ));
        for e in &summary.errors {
            self.ctx.error(e);
        }
        Ok(())
    }

    pub fn render_added(&self, added: &AddedService) -> Result<()> {
        self.ctx.success(&format!(
            "OK, now monitoring {} using name '{}'.",
            added.service_type, added.alias
        ));
        Ok(())
    }

    pub fn render_removed(&self, record: &RemoteServiceRecord) -> Result<()> {
        self.ctx.success(&format!(
            "OK, removed {} '{}' from monitoring.",
            record.service,
            record.alias().unwrap_or(&record.node)
        ));
        Ok(())
    }

    pub fn render_config(&self, config: &SsmConfig, path: &Path) -> Result<()> {
        if self.ctx.quiet {
            return Ok(());
        }
        let c = config.masked();
        self.ctx
            .header(&format!("Configuration ({})", path.display()));
        println!();
        let rows = [
            ("server_address:", c.server_address.clone()),
            ("server_user:", c.server_user.clone()),
            ("server_password:", c.server_password.clone()),
            ("server_ssl:", c.server_ssl.to_string()),
            ("server_insecure_ssl:", c.server_insecure_ssl.to_string()),
            ("client_name:", c.client_name.clone()),
            ("client_address:", c.client_address.clone()),
            ("bind_address:", c.bind_address.clone()),
        ];
        for (key, value) in rows {
            println!("  {:<22} {value}", key.style(self.ctx.styles.dim));
        }
        Ok(())
    }

    pub fn render_uninstall(&self, count: usize) -> Result<()> {
        self.ctx
            .success(&format!("OK, {count} service(s) removed or stopped."));
        Ok(())
    }
}
