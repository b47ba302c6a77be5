//! Order-preserving INI document model.
//!
//! Used for exporter `.conf` files and systemd unit files. Untouched lines are
//! rendered back byte-for-byte, repeated keys are kept, and edits only touch
//! the lines they name.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry {
        key: String,
        value: String,
        raw: Option<String>,
    },
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: Option<String>,
    header: Option<String>,
    lines: Vec<Line>,
}

impl Section {
    fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            header: None,
            lines: Vec::new(),
        }
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|l| match l {
            Line::Entry { key, value, .. } => Some((key.as_str(), value.as_str())),
            Line::Other(_) => None,
        })
    }

    fn last_entry_index(&self) -> Option<usize> {
        self.lines
            .iter()
            .rposition(|l| matches!(l, Line::Entry { .. }))
    }
}

/// A parsed INI file. The unnamed leading section holds keys before any header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<Section>,
    delimiter: &'static str,
}

impl Default for IniDocument {
    fn default() -> Self {
        Self {
            sections: vec![Section::new(None)],
            delimiter: " = ",
        }
    }
}

impl IniDocument {
    /// Parse text. Never fails: lines that are neither headers nor
    /// `key = value` pairs are kept verbatim.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut doc = Self::default();
        let mut delimiter = None;
        for raw in text.lines() {
            let trimmed = raw.trim();
            if let Some(name) = trimmed
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
            {
                let mut section = Section::new(Some(name.trim()));
                section.header = Some(raw.to_string());
                doc.sections.push(section);
                continue;
            }
            let line = if trimmed.starts_with('#') || trimmed.starts_with(';') {
                Line::Other(raw.to_string())
            } else if let Some((k, v)) = trimmed.split_once('=') {
                if delimiter.is_none() {
                    delimiter = Some(if raw.contains(" = ") { " = " } else { "=" });
                }
                Line::Entry {
                    key: k.trim().to_string(),
                    value: v.trim().to_string(),
                    raw: Some(raw.to_string()),
                }
            } else {
                Line::Other(raw.to_string())
            };
            if let Some(last) = doc.sections.last_mut() {
                last.lines.push(line);
            }
        }
        if let Some(d) = delimiter {
            doc.delimiter = d;
        }
        doc
    }

    fn section(&self, name: Option<&str>) -> Option<&Section> {
        self.sections.iter().find(|s| s.name.as_deref() == name)
    }

    fn section_mut_or_insert(&mut self, name: Option<&str>) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.name.as_deref() == name) {
            Some(i) => i,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    /// Section names in file order, the unnamed section first as `None`.
    #[must_use]
    pub fn section_names(&self) -> Vec<Option<&str>> {
        self.sections.iter().map(|s| s.name.as_deref()).collect()
    }

    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.section(Some(name)).is_some()
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, section: Option<&str>, key: &str) -> Option<&str> {
        self.section(section)?
            .entries()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Every value for a repeated key, in order.
    #[must_use]
    pub fn get_all(&self, section: Option<&str>, key: &str) -> Vec<&str> {
        self.section(section)
            .map(|s| s.entries().filter(|(k, _)| *k == key).map(|(_, v)| v).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_key(&self, section: Option<&str>, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    /// Distinct keys of a section, in first-seen order.
    #[must_use]
    pub fn keys(&self, section: Option<&str>) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        if let Some(s) = self.section(section) {
            for (k, _) in s.entries() {
                if !out.contains(&k) {
                    out.push(k);
                }
            }
        }
        out
    }

    /// Set `key` to `value`, replacing the first occurrence and dropping any
    /// repeats. Creates the key (and section) when absent.
    pub fn set(&mut self, section: Option<&str>, key: &str, value: &str) {
        let sec = self.section_mut_or_insert(section);
        let mut seen = false;
        sec.lines.retain_mut(|line| match line {
            Line::Entry { key: k, value: v, raw } if k == key => {
                if seen {
                    return false;
                }
                seen = true;
                if v != value {
                    value.clone_into(v);
                    *raw = None;
                }
                true
            }
            _ => true,
        });
        if !seen {
            self.append(section, key, value);
        }
    }

    /// Add another `key = value` line after the last entry of the section.
    pub fn append(&mut self, section: Option<&str>, key: &str, value: &str) {
        let sec = self.section_mut_or_insert(section);
        let at = sec.last_entry_index().map_or(0, |i| i + 1);
        sec.lines.insert(
            at,
            Line::Entry {
                key: key.to_string(),
                value: value.to_string(),
                raw: None,
            },
        );
    }

    /// Render back to text, ending with a newline.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            match (&section.header, &section.name) {
                (Some(h), _) => {
                    out.push_str(h);
                    out.push('\n');
                }
                (None, Some(n)) => {
                    if !out.is_empty() && !out.ends_with("\n\n") {
                        out.push('\n');
                    }
                    out.push_str(&format!("[{n}]\n"));
                }
                (None, None) => {}
            }
            for line in &section.lines {
                match line {
                    Line::Entry { raw: Some(r), .. } | Line::Other(r) => out.push_str(r),
                    Line::Entry { key, value, raw: None } => {
                        out.push_str(key);
                        out.push_str(self.delimiter);
                        out.push_str(value);
                    }
                }
                out.push('\n');
            }
        }
        out
    }

    /// Copy every key of `other` that this document lacks, section by section
    /// including the unnamed one. Returns how many keys were added.
    pub fn merge_missing_from(&mut self, other: &IniDocument) -> usize {
        let mut added = 0;
        for name in other.section_names() {
            for key in other.keys(name) {
                if self.has_key(name, key) {
                    continue;
                }
                if let Some(value) = other.get(name, key) {
                    self.append(name, key, value);
                    added += 1;
                }
            }
        }
        added
    }
}
