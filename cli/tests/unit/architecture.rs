//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries
//! (domain → application → infra/commands/output) hold.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

fn src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

fn relative(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Non-test lines of every file under `dir` containing any of `needles`.
fn find_in_dir(dir: &Path, needles: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        let rel = relative(&file);
        let mut tracker = CfgTestTracker::new();
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if tracker.process_line(line) {
                continue;
            }
            if let Some(needle) = needles.iter().find(|n| line.contains(*n)) {
                violations.push(format!("{rel}:{}: `{needle}`: {}", i + 1, line.trim()));
            }
        }
    }
    violations
}

// ── Output mode is decided by the renderer ───────────────────────────────────

#[test]
fn no_inline_json_branching_in_commands() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir().join("commands")) {
        let rel = relative(&file);
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            let lineno = i + 1;
            if line.contains("json: bool") {
                violations.push(format!(
                    "{rel}:{lineno}: found `json: bool` parameter: {line}"
                ));
            }
            let trimmed = line.trim();
            if trimmed.starts_with("if json") || trimmed.starts_with("if !json") {
                violations.push(format!("{rel}:{lineno}: found inline JSON branch: {line}"));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Found inline JSON branching in commands/ (use app.renderer()):\n{}",
        violations.join("\n")
    );
}

// ── Process spawning goes through the CommandRunner port ─────────────────────

#[test]
fn no_tokio_command_runner_new_outside_infra() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir()) {
        let rel = relative(&file);
        if rel.contains("/infra/") || rel.ends_with("app.rs") {
            continue;
        }
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if line.contains("TokioCommandRunner::new") {
                violations.push(format!(
                    "{rel}:{}: TokioCommandRunner::new outside infra/: {line}",
                    i + 1
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Found TokioCommandRunner::new outside infra/ (inject a CommandRunner):\n{}",
        violations.join("\n")
    );
}

#[test]
fn services_take_trait_bounds_not_concrete_adapters() {
    let concrete = [
        "TokioCommandRunner",
        "PlatformServiceManager",
        "ConsulClient",
        "QanClient",
        "YamlConfigStore",
        "OsFs",
    ];
    let violations = find_in_dir(&src_dir().join("application"), &concrete);

    assert!(
        violations.is_empty(),
        "Found concrete infra types in the application layer (use port traits):\n{}",
        violations.join("\n")
    );
}

// ── Layer imports ────────────────────────────────────────────────────────────

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = find_in_dir(
        &src_dir().join("infra"),
        &["crate::commands", "crate::output", "crate::app::"],
    );

    assert!(
        violations.is_empty(),
        "infra/ must not depend on presentation code:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = find_in_dir(
        &src_dir().join("infra"),
        &["println!", "eprintln!", "print!(", "eprint!("],
    );

    assert!(
        violations.is_empty(),
        "infra/ must log through tracing, not print:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_has_no_infra_or_output_imports() {
    let violations = find_in_dir(
        &src_dir().join("application"),
        &["crate::infra", "crate::commands", "crate::output", "crate::app::"],
    );

    assert!(
        violations.is_empty(),
        "application/ may only import domain and ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_has_no_blocking_io() {
    let violations = find_in_dir(
        &src_dir().join("application"),
        &["std::fs::", "std::process::Command", "std::net::"],
    );

    assert!(
        violations.is_empty(),
        "application/ must route I/O through ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn domain_is_free_of_io() {
    let violations = find_in_dir(
        &src_dir().join("domain"),
        &[
            "tokio",
            "reqwest",
            "std::fs",
            "std::process",
            "std::net",
            "crate::application",
            "crate::infra",
        ],
    );

    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

// ── Prompts ──────────────────────────────────────────────────────────────────

#[test]
fn commands_use_standardized_confirmation() {
    let violations = find_in_dir(&src_dir().join("commands"), &["dialoguer::", "stdin()"]);

    assert!(
        violations.is_empty(),
        "commands/ must prompt through app.confirm():\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_module_level_dead_code_allows_in_layers() {
    let mut violations = Vec::new();
    for layer in ["domain", "application", "infra", "commands"] {
        for file in collect_rs_files(&src_dir().join(layer)) {
            if read_non_comment_lines(&file)
                .iter()
                .any(|l| l.trim().starts_with("#![allow(dead_code)]"))
            {
                violations.push(relative(&file));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Module-wide dead_code allows hide unused code:\n{}",
        violations.join("\n")
    );
}
