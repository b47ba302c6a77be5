//! Stylesheet for terminal output (owo-colors).

use owo_colors::Style;

/// Styles applied by `OutputContext` and the human renderer.
///
/// The default is plain text; `colorize` switches on colors when the
/// terminal supports them.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub dim: Style,
    /// Section titles in `check` and `config` output.
    pub header: Style,
    /// Table column titles in `list`.
    pub column: Style,
    /// A running exporter.
    pub active: Style,
    /// A stopped exporter.
    pub inactive: Style,
    /// Units still in the pre-upgrade naming scheme.
    pub legacy: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold().cyan();
        self.column = Style::new().bold();
        self.active = Style::new().green().bold();
        self.inactive = Style::new().red();
        self.legacy = Style::new().yellow().italic();
    }
}
