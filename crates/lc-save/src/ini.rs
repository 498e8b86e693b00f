//! Minimal INI-style text codec for `Scenario.txt`/`Objects.txt`-shaped
//! files: ordered `[Section]` blocks of `Key=Value` lines. Spec §6 calls
//! these "typed serializers described in §4.N", but the core-relevant
//! fields (head/game/landscape/...) are flat key=value pairs, so this
//! module only owns the structural parse; callers pull typed fields out
//! with [`IniSection::get`]/[`IniSection::get_or`].
use std::fmt::Write as _;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IniError {
    #[error("line {line}: expected '[Section]' or 'Key=Value', found {text:?}")]
    Malformed { line: usize, text: String },
}

#[derive(Debug, Clone, Default)]
pub struct IniSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    pub fn new(name: impl Into<String>) -> Self {
        IniSection { name: name.into(), entries: Vec::new() }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value.into();
        } else {
            self.entries.push((key, value.into()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some("1") | Some("true") | Some("True") => true,
            Some("0") | Some("false") | Some("False") => false,
            _ => default,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    pub sections: Vec<IniSection>,
}

impl IniDocument {
    pub fn new() -> Self {
        IniDocument::default()
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> &mut IniSection {
        if let Some(idx) = self.sections.iter().position(|s| s.name == name) {
            &mut self.sections[idx]
        } else {
            self.sections.push(IniSection::new(name));
            self.sections.last_mut().unwrap()
        }
    }

    /// All sections whose name matches `prefix*N` (e.g. `Objects.txt`'s
    /// per-object blocks, named `Object1`, `Object2`, ...), in file order.
    pub fn sections_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a IniSection> {
        self.sections.iter().filter(move |s| s.name.starts_with(prefix))
    }

    pub fn parse(text: &str) -> Result<Self, IniError> {
        let mut doc = IniDocument::new();
        let mut current: Option<IniSection> = None;
        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                if let Some(section) = current.take() {
                    doc.sections.push(section);
                }
                current = Some(IniSection::new(name));
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(IniError::Malformed { line: idx + 1, text: line.to_string() });
            };
            let section = current.get_or_insert_with(|| IniSection::new(""));
            section.set(key.trim(), value.trim());
        }
        if let Some(section) = current.take() {
            doc.sections.push(section);
        }
        Ok(doc)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let _ = writeln!(out, "[{}]", section.name);
            for (key, value) in &section.entries {
                let _ = writeln!(out, "{key}={value}");
            }
            let _ = writeln!(out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_sections_and_keys_in_order() {
        let text = "[Head]\nIcon=1\nDifficulty=2\n\n[Game]\nMode=Melee\n";
        let doc = IniDocument::parse(text).unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.section("Head").unwrap().get("Icon"), Some("1"));
        assert_eq!(doc.section("Game").unwrap().get("Mode"), Some("Melee"));
        let rendered = doc.render();
        let reparsed = IniDocument::parse(&rendered).unwrap();
        assert_eq!(reparsed.section("Head").unwrap().get("Difficulty"), Some("2"));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = "; a comment\n[Head]\n# also a comment\nIcon=1\n\n";
        let doc = IniDocument::parse(text).unwrap();
        assert_eq!(doc.section("Head").unwrap().get("Icon"), Some("1"));
    }

    #[test]
    fn later_key_overwrites_earlier_one() {
        let text = "[Head]\nIcon=1\nIcon=2\n";
        let doc = IniDocument::parse(text).unwrap();
        assert_eq!(doc.section("Head").unwrap().get("Icon"), Some("2"));
        assert_eq!(doc.section("Head").unwrap().entries.len(), 1);
    }

    #[test]
    fn malformed_line_without_equals_is_rejected() {
        let text = "[Head]\nnot a key value line\n";
        assert!(IniDocument::parse(text).is_err());
    }

    #[test]
    fn sections_with_prefix_preserves_order() {
        let text = "[Object1]\nId=1\n\n[Object2]\nId=2\n\n[Head]\nIcon=1\n";
        let doc = IniDocument::parse(text).unwrap();
        let names: Vec<&str> = doc.sections_with_prefix("Object").map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Object1", "Object2"]);
    }

    #[test]
    fn get_int_and_get_bool_fall_back_on_missing_or_bad_values() {
        let text = "[Head]\nIcon=notanumber\nSaveGame=1\n";
        let doc = IniDocument::parse(text).unwrap();
        let head = doc.section("Head").unwrap();
        assert_eq!(head.get_int("Icon", 42), 42);
        assert_eq!(head.get_int("Missing", 7), 7);
        assert!(head.get_bool("SaveGame", false));
        assert!(!head.get_bool("Missing", false));
    }
}
