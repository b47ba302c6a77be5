//! Unit definitions: rendering new units and patching shadow copies.
//!
//! Shadow patching is a structured edit per init-system family. Each family
//! gets the one-shot reconfigure flag, loses its auto-restart, and has the
//! predecessor install root rewritten to the current one. Families that
//! carry the job name inside the definition (sysv, launchd) are renamed to
//! the shadow so it never collides with the running legacy job.

use crate::domain::ini::IniDocument;
use crate::domain::init_system::InitSystem;
use crate::domain::paths::{PMM_BASE_DIR, SSM_BASE_DIR};

/// Environment flag that makes an exporter reconfigure itself and exit.
pub const RECONFIGURE_ENV: &str = "ON_CONFIGURE";

/// Everything needed to render a unit for any init system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDefinition {
    pub name: String,
    pub description: String,
    pub executable: String,
    pub arguments: Vec<String>,
}

impl UnitDefinition {
    fn command_line(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render the unit file body for `init`.
    #[must_use]
    pub fn render(&self, init: InitSystem) -> String {
        match init {
            InitSystem::Systemd => format!(
                "[Unit]\nDescription={desc}\nConditionFileIsExecutable={exe}\nAfter=network.target\n\n\
                 [Service]\nStartLimitInterval=5\nStartLimitBurst=10\nExecStart={cmd}\nRestart=always\nRestartSec=120\n\n\
                 [Install]\nWantedBy=multi-user.target\n",
                desc = self.description,
                exe = self.executable,
                cmd = self.command_line(),
            ),
            InitSystem::Upstart => format!(
                "description \"{desc}\"\n\nstart on filesystem or runlevel [2345]\nstop on runlevel [!2345]\n\nrespawn\nrespawn limit 10 5\numask 022\n\nexec {cmd}\n",
                desc = self.description,
                cmd = self.command_line(),
            ),
            InitSystem::Sysv => format!(
                "#!/bin/sh\n### BEGIN INIT INFO\n# Provides:          {name}\n# Required-Start:    $local_fs $network\n# Required-Stop:     $local_fs $network\n# Default-Start:     2 3 4 5\n# Default-Stop:      0 1 6\n# Short-Description: {desc}\n### END INIT INFO\n\n\
                 cmd=\"{cmd}\"\nname=\"{name}\"\npid_file=\"/var/run/$name.pid\"\n\n\
                 is_running() {{ [ -f \"$pid_file\" ] && kill -0 $(cat \"$pid_file\") > /dev/null 2>&1; }}\n\n\
                 case \"$1\" in\n  start)\n    is_running && exit 0\n    $cmd >> \"/var/log/$name.log\" 2>&1 &\n    echo $! > \"$pid_file\"\n    ;;\n\
                 \x20 stop)\n    is_running || exit 0\n    kill $(cat \"$pid_file\") && rm -f \"$pid_file\"\n    ;;\n\
                 \x20 restart)\n    $0 stop\n    $0 start\n    ;;\n\
                 \x20 status)\n    is_running\n    ;;\n\
                 \x20 *)\n    echo \"Usage: $0 {{start|stop|restart|status}}\"\n    exit 1\n    ;;\nesac\n",
                name = self.name,
                desc = self.description,
                cmd = self.command_line(),
            ),
            InitSystem::Launchd => {
                let args: String = std::iter::once(&self.executable)
                    .chain(&self.arguments)
                    .map(|a| format!("\t\t<string>{a}</string>\n"))
                    .collect();
                format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE plist PUBLIC \"-//Apple Computer//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n<plist version=\"1.0\">\n<dict>\n\t<key>Label</key>\n\t<string>{name}</string>\n\t<key>ProgramArguments</key>\n\t<array>\n{args}\t</array>\n\t<key>KeepAlive</key>\n\t<true/>\n\t<key>RunAtLoad</key>\n\t<true/>\n</dict>\n</plist>\n",
                    name = self.name,
                )
            }
        }
    }
}

/// Shadow-unit edit for one init-system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowPatch {
    Systemd,
    Upstart,
    Sysv,
    Launchd,
}

impl From<InitSystem> for ShadowPatch {
    fn from(init: InitSystem) -> Self {
        match init {
            InitSystem::Systemd => Self::Systemd,
            InitSystem::Upstart => Self::Upstart,
            InitSystem::Sysv => Self::Sysv,
            InitSystem::Launchd => Self::Launchd,
        }
    }
}

impl ShadowPatch {
    /// Produce the shadow definition `shadow_name` from a copy of the
    /// legacy unit.
    #[must_use]
    pub fn apply(self, unit: &str, shadow_name: &str) -> String {
        let patched = match self {
            Self::Systemd => patch_systemd(unit),
            Self::Upstart => patch_upstart(unit),
            Self::Sysv => patch_sysv(unit, shadow_name),
            Self::Launchd => patch_launchd(unit, shadow_name),
        };
        rewrite_install_root(&patched)
    }
}

/// Replace references to the predecessor install root.
#[must_use]
pub fn rewrite_install_root(text: &str) -> String {
    text.replace(PMM_BASE_DIR, SSM_BASE_DIR)
}

fn patch_systemd(unit: &str) -> String {
    let mut doc = IniDocument::parse(unit);
    doc.append(
        Some("Service"),
        "Environment",
        &format!("\"{RECONFIGURE_ENV}=1\""),
    );
    doc.set(Some("Service"), "Restart", "no");
    doc.render()
}

fn patch_sysv(unit: &str, shadow_name: &str) -> String {
    let export = format!("export {RECONFIGURE_ENV}=1");
    let renamed: String = unit
        .lines()
        .map(|line| {
            if line.starts_with("name=") {
                format!("name=\"{shadow_name}\"\n")
            } else if line.starts_with("# Provides:") {
                format!("# Provides:          {shadow_name}\n")
            } else {
                format!("{line}\n")
            }
        })
        .collect();
    insert_after_shebang(&renamed, &export)
}

fn patch_upstart(unit: &str) -> String {
    let env = format!("env {RECONFIGURE_ENV}=1");
    let body: Vec<String> = unit
        .lines()
        .map(|line| {
            let words: Vec<&str> = line.split_whitespace().collect();
            let restarts = matches!(words.as_slice(), ["start", "on", "stopped", ..])
                || words.first() == Some(&"respawn");
            if restarts {
                format!("# {line}")
            } else {
                line.to_string()
            }
        })
        .collect();
    format!("{env}\n{}\n", body.join("\n"))
}

fn insert_after_shebang(unit: &str, line: &str) -> String {
    match unit.split_once('\n') {
        Some((first, rest)) if first.starts_with("#!") => format!("{first}\n{line}\n{rest}"),
        _ => format!("{line}\n{unit}"),
    }
}

fn patch_launchd(plist: &str, shadow_name: &str) -> String {
    let mut out = set_label(plist, shadow_name);
    out = set_keep_alive_false(&out);
    let env_entry = format!("<key>{RECONFIGURE_ENV}</key>\n\t\t<string>1</string>");
    if let Some(pos) = find_dict_after_key(&out, "EnvironmentVariables") {
        out.insert_str(pos, &format!("\n\t\t{env_entry}"));
    } else {
        insert_before_root_dict_end(
            &mut out,
            &format!("\t<key>EnvironmentVariables</key>\n\t<dict>\n\t\t{env_entry}\n\t</dict>\n"),
        );
    }
    out
}

fn set_label(plist: &str, label: &str) -> String {
    let key = "<key>Label</key>";
    let mut out = plist.to_string();
    if let Some(start) = plist.find(key) {
        let after_key = start + key.len();
        let rest = &plist[after_key..];
        let trimmed = rest.trim_start();
        let value_start = after_key + (rest.len() - trimmed.len());
        if trimmed.starts_with("<string>")
            && let Some(end) = trimmed.find("</string>")
        {
            out.replace_range(
                value_start..value_start + end + "</string>".len(),
                &format!("<string>{label}</string>"),
            );
            return out;
        }
    }
    insert_before_root_dict_end(
        &mut out,
        &format!("\t<key>Label</key>\n\t<string>{label}</string>\n"),
    );
    out
}

/// Position just past the `<dict>` that follows `<key>name</key>`.
fn find_dict_after_key(plist: &str, name: &str) -> Option<usize> {
    let key = format!("<key>{name}</key>");
    let after_key = plist.find(&key)? + key.len();
    let rest = &plist[after_key..];
    let trimmed = rest.trim_start();
    trimmed
        .starts_with("<dict>")
        .then(|| after_key + (rest.len() - trimmed.len()) + "<dict>".len())
}

fn set_keep_alive_false(plist: &str) -> String {
    let key = "<key>KeepAlive</key>";
    if let Some(start) = plist.find(key) {
        let after_key = start + key.len();
        let rest = &plist[after_key..];
        let trimmed = rest.trim_start();
        let value_start = after_key + (rest.len() - trimmed.len());
        for value in ["<true/>", "<false/>"] {
            if trimmed.starts_with(value) {
                let mut out = plist.to_string();
                out.replace_range(value_start..value_start + value.len(), "<false/>");
                return out;
            }
        }
        // Dict-valued KeepAlive: replace the whole value.
        if trimmed.starts_with("<dict>")
            && let Some(end) = trimmed.find("</dict>")
        {
            let mut out = plist.to_string();
            out.replace_range(value_start..value_start + end + "</dict>".len(), "<false/>");
            return out;
        }
    }
    let mut out = plist.to_string();
    insert_before_root_dict_end(&mut out, "\t<key>KeepAlive</key>\n\t<false/>\n");
    out
}

fn insert_before_root_dict_end(plist: &mut String, fragment: &str) {
    match plist.rfind("</dict>") {
        Some(pos) => plist.insert_str(pos, fragment),
        None => plist.push_str(fragment),
    }
}
