//! Texture map: a 255-entry table pairing each landscape material with the
//! surface texture drawn for it, loaded from an INI-style `TexMap.txt`.

use std::fmt;

pub const MAX_TEXTURES: usize = 255;

#[derive(Debug, Clone, Default)]
pub struct TexMapEntry {
    pub material: String,
    pub texture: String,
}

#[derive(Debug)]
pub enum TexMapError {
    Malformed { line: usize, text: String },
    IndexOutOfRange { line: usize, index: usize },
}

impl fmt::Display for TexMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TexMapError::Malformed { line, text } => {
                write!(f, "texmap line {line} is not `<index>=<material>-<texture>`: {text:?}")
            }
            TexMapError::IndexOutOfRange { line, index } => {
                write!(f, "texmap line {line} index {index} exceeds {MAX_TEXTURES}")
            }
        }
    }
}

impl std::error::Error for TexMapError {}

/// Holds the index -> (material, texture) mapping. Index 0 is always empty
/// (no texture); valid entries occupy 1..=254.
pub struct TexMap {
    entries: [Option<TexMapEntry>; MAX_TEXTURES + 1],
}

impl TexMap {
    pub fn new() -> Self {
        TexMap {
            entries: std::array::from_fn(|_| None),
        }
    }

    pub fn add_entry(&mut self, index: usize, material: impl Into<String>, texture: impl Into<String>) -> Result<(), TexMapError> {
        if index > MAX_TEXTURES {
            return Err(TexMapError::IndexOutOfRange { line: 0, index });
        }
        self.entries[index] = Some(TexMapEntry {
            material: material.into(),
            texture: texture.into(),
        });
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&TexMapEntry> {
        self.entries.get(index).and_then(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses a `TexMap.txt`-shaped buffer: one `<index>=<material>-<texture>`
    /// assignment per line, `;` comments and blank lines ignored.
    ///
    /// `overload` controls whether entries already present are replaced
    /// (mirrors the scenario-vs-definition overload flags) or left alone.
    pub fn load(&mut self, text: &str, overload: bool) -> Result<(), TexMapError> {
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.split(';').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let (idx_part, rest) = line.split_once('=').ok_or_else(|| TexMapError::Malformed {
                line: lineno + 1,
                text: line.to_string(),
            })?;
            let index: usize = idx_part.trim().parse().map_err(|_| TexMapError::Malformed {
                line: lineno + 1,
                text: line.to_string(),
            })?;
            if index > MAX_TEXTURES {
                return Err(TexMapError::IndexOutOfRange { line: lineno + 1, index });
            }
            let (material, texture) = rest.trim().split_once('-').ok_or_else(|| TexMapError::Malformed {
                line: lineno + 1,
                text: line.to_string(),
            })?;
            if !overload && self.entries[index].is_some() {
                continue;
            }
            self.entries[index] = Some(TexMapEntry {
                material: material.trim().to_string(),
                texture: texture.trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for TexMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_basic_entries() {
        let mut map = TexMap::new();
        map.load("1=Earth-earth\n2=Water-water\n", true).unwrap();
        assert_eq!(map.get(1).unwrap().material, "Earth");
        assert_eq!(map.get(2).unwrap().texture, "water");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn ignores_comments_and_blanks() {
        let mut map = TexMap::new();
        map.load("; a comment\n\n1=Earth-earth\n", true).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn overload_false_keeps_existing_entry() {
        let mut map = TexMap::new();
        map.add_entry(1, "Earth", "earth").unwrap();
        map.load("1=Rock-rock\n", false).unwrap();
        assert_eq!(map.get(1).unwrap().material, "Earth");
    }

    #[test]
    fn overload_true_replaces_entry() {
        let mut map = TexMap::new();
        map.add_entry(1, "Earth", "earth").unwrap();
        map.load("1=Rock-rock\n", true).unwrap();
        assert_eq!(map.get(1).unwrap().material, "Rock");
    }

    #[test]
    fn rejects_index_past_max() {
        let mut map = TexMap::new();
        let err = map.load("999=Earth-earth\n", true).unwrap_err();
        assert!(matches!(err, TexMapError::IndexOutOfRange { .. }));
    }

    #[test]
    fn rejects_malformed_line() {
        let mut map = TexMap::new();
        let err = map.load("not-an-entry\n", true).unwrap_err();
        assert!(matches!(err, TexMapError::Malformed { .. }));
    }
}
