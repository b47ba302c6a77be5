//! Init-system families and their fixed unit-file layout.

use std::fmt;

use serde::Serialize;

/// Platform service manager family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InitSystem {
    Systemd,
    Upstart,
    Sysv,
    Launchd,
}

impl InitSystem {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Systemd => "systemd",
            Self::Upstart => "upstart",
            Self::Sysv => "sysv",
            Self::Launchd => "launchd",
        }
    }

    /// Unit directories to scan, primary first.
    ///
    /// systemd keeps package-shipped units in a second directory.
    #[must_use]
    pub fn unit_dirs(self) -> &'static [&'static str] {
        match self {
            Self::Systemd => &["/etc/systemd/system", "/lib/systemd/system"],
            Self::Upstart => &["/etc/init"],
            Self::Sysv => &["/etc/init.d"],
            Self::Launchd => &["/Library/LaunchDaemons"],
        }
    }

    /// Directory new unit definitions are written to.
    #[must_use]
    pub fn primary_unit_dir(self) -> &'static str {
        self.unit_dirs()[0]
    }

    /// Unit file extension, including the dot. Empty for sysv scripts.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Systemd => ".service",
            Self::Upstart => ".conf",
            Self::Sysv => "",
            Self::Launchd => ".plist",
        }
    }

    #[must_use]
    pub fn unit_file_name(self, unit: &str) -> String {
        format!("{unit}{}", self.extension())
    }

    /// Strip this family's extension from a directory entry name.
    #[must_use]
    pub fn unit_from_file_name(self, file_name: &str) -> Option<&str> {
        file_name.strip_suffix(self.extension())
    }

    /// Whether the manager needs an explicit reload after unit files change.
    #[must_use]
    pub fn needs_reload(self) -> bool {
        self == Self::Systemd
    }

    /// Boot-registration command for `unit`, `None` where the family has none.
    #[must_use]
    pub fn boot_registration(self, unit: &str, enable: bool) -> Option<(&'static str, Vec<String>)> {
        match self {
            Self::Systemd => {
                let verb = if enable { "enable" } else { "disable" };
                Some(("systemctl", vec![verb.to_string(), unit.to_string()]))
            }
            Self::Sysv => {
                let verb = if enable { "defaults" } else { "remove" };
                Some((
                    "update-rc.d",
                    vec!["-f".to_string(), unit.to_string(), verb.to_string()],
                ))
            }
            Self::Upstart | Self::Launchd => None,
        }
    }
}

impl fmt::Display for InitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
