//! Output formatting module

pub mod human;
pub mod json;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::application::services::bulk::LifecycleAction;
use crate::application::services::monitoring::{AddedService, ServiceListing};
use crate::application::services::reconcile::RepairReport;
use crate::application::services::upgrade::UpgradeReport;
use crate::domain::aggregate::BulkSummary;
use crate::domain::{InstallationReport, RemoteServiceRecord, SsmConfig};

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Renders command results in the selected output mode.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

macro_rules! dispatch {
    ($self:ident, $method:ident($($arg:expr),*)) => {
        match $self {
            Renderer::Human(r) => r.$method($($arg),*),
            Renderer::Json(r) => r.$method($($arg),*),
        }
    };
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_listing(&self, rows: &[ServiceListing]) -> Result<()> {
        dispatch!(self, render_listing(rows))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_installation(&self, report: &InstallationReport) -> Result<()> {
        dispatch!(self, render_installation(report))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_repair(&self, report: &RepairReport) -> Result<()> {
        dispatch!(self, render_repair(report))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_upgrade(&self, report: &UpgradeReport) -> Result<()> {
        dispatch!(self, render_upgrade(report))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_lifecycle(
        &self,
        action: LifecycleAction,
        unit: &str,
        affected: bool,
    ) -> Result<()> {
        dispatch!(self, render_lifecycle(action, unit, affected))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_bulk(&self, action: &str, summary: &BulkSummary) -> Result<()> {
        dispatch!(self, render_bulk(action, summary))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_added(&self, added: &AddedService) -> Result<()> {
        dispatch!(self, render_added(added))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_removed(&self, record: &RemoteServiceRecord) -> Result<()> {
        dispatch!(self, render_removed(record))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &SsmConfig, path: &Path) -> Result<()> {
        dispatch!(self, render_config(config, path))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_uninstall(&self, count: usize) -> Result<()> {
        dispatch!(self, render_uninstall(count))
    }
}
