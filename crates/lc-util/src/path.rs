//! Path helpers abstracting the directory separator and scenario/save
//! extensions used across the core (package names, `Objects.txt`-style
//! component files, per-section subfolders).

pub const SEPARATOR: char = '/';

pub fn extension(path: &str) -> Option<&str> {
    let file_name = file_name(path);
    let dot = file_name.rfind('.')?;
    if dot == 0 {
        None
    } else {
        Some(&file_name[dot + 1..])
    }
}

pub fn file_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

pub fn parent(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches(SEPARATOR);
    trimmed.rfind(SEPARATOR).map(|idx| &trimmed[..idx])
}

pub fn join(base: &str, leaf: &str) -> String {
    if base.is_empty() {
        return leaf.to_string();
    }
    if base.ends_with(SEPARATOR) {
        format!("{base}{leaf}")
    } else {
        format!("{base}{SEPARATOR}{leaf}")
    }
}

/// True when `name` names a scenario, save, or player archive by extension.
pub fn is_group_file(path: &str) -> bool {
    matches!(
        extension(path).map(|e| e.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "c4s" | "c4f" | "c4p" | "c4g" | "c4u" | "c4d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_extension_and_name() {
        assert_eq!(extension("Sections/Main.c4s"), Some("c4s"));
        assert_eq!(file_name("Sections/Main.c4s"), "Main.c4s");
        assert_eq!(parent("Sections/Main.c4s"), Some("Sections"));
    }

    #[test]
    fn no_extension() {
        assert_eq!(extension("Scenario"), None);
        assert_eq!(extension(".hidden"), None);
    }

    #[test]
    fn join_avoids_double_separator() {
        assert_eq!(join("Sections/", "Main.c4s"), "Sections/Main.c4s");
        assert_eq!(join("Sections", "Main.c4s"), "Sections/Main.c4s");
    }

    #[test]
    fn group_file_detection() {
        assert!(is_group_file("Tutorial.c4s"));
        assert!(is_group_file("MyDef.c4d"));
        assert!(!is_group_file("Script.c"));
    }
}
