use crate::github::client::MANIFEST_FILES;
use crate::models::{FileBreakdown, FileNode};
use crate::taxonomy::languages::extension;

/// Only this many top-level entries are classified.
pub const BREAKDOWN_LIMIT: usize = 100;

const DOC_KEYWORDS: &[&str] = &["readme", "license", "changelog", "contributing"];
const CONFIG_EXTENSIONS: &[&str] = &["json", "yml", "yaml", "toml", "ini", "cfg", "conf", "config"];
const TEST_KEYWORDS: &[&str] = &["test", "spec", "__test__"];
const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "kt", "cpp", "cc", "c", "h", "hpp", "cs", "go", "rs",
    "rb", "php", "swift", "scala",
];
const ASSET_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "ico", "webp"];

/// Sort top-level entries into buckets. The first matching rule wins and
/// files matching no rule are left out.
pub fn categorize_files(entries: &[FileNode]) -> FileBreakdown {
    let mut breakdown = FileBreakdown::default();

    for entry in entries.iter().take(BREAKDOWN_LIMIT) {
        let name = entry.name.clone();
        if entry.is_dir() {
            breakdown.directories.push(name);
            continue;
        }

        let lower = entry.name.to_lowercase();
        let ext = extension(&entry.name);
        let ext_in = |list: &[&str]| ext.as_deref().is_some_and(|e| list.contains(&e));

        if MANIFEST_FILES.contains(&entry.name.as_str()) {
            breakdown.important_files.push(name);
        } else if DOC_KEYWORDS.iter().any(|k| lower.contains(k)) {
            breakdown.documentation.push(name);
        } else if ext_in(CONFIG_EXTENSIONS) || lower.starts_with('.') {
            breakdown.config_files.push(name);
        } else if TEST_KEYWORDS.iter().any(|k| lower.contains(k)) {
            breakdown.tests.push(name);
        } else if ext_in(SOURCE_EXTENSIONS) {
            breakdown.source_code.push(name);
        } else if ext_in(ASSET_EXTENSIONS) {
            breakdown.assets.push(name);
        }
    }

    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;

    fn node(name: &str, kind: EntryKind) -> FileNode {
        FileNode {
            name: name.to_string(),
            path: name.to_string(),
            kind,
            size: 0,
            download_url: None,
            children: None,
        }
    }

    #[test]
    fn test_categorize_follows_rule_order() {
        let entries = vec![
            node("src", EntryKind::Dir),
            node("Cargo.toml", EntryKind::File),
            node("README.md", EntryKind::File),
            node("tsconfig.json", EntryKind::File),
            node(".gitignore", EntryKind::File),
            node("test_utils.py", EntryKind::File),
            node("main.rs", EntryKind::File),
            node("logo.PNG", EntryKind::File),
            node("Procfile", EntryKind::File),
        ];

        let breakdown = categorize_files(&entries);
        assert_eq!(breakdown.directories, vec!["src"]);
        assert_eq!(breakdown.important_files, vec!["Cargo.toml"]);
        assert_eq!(breakdown.documentation, vec!["README.md"]);
        assert_eq!(breakdown.config_files, vec!["tsconfig.json", ".gitignore"]);
        assert_eq!(breakdown.tests, vec!["test_utils.py"]);
        assert_eq!(breakdown.source_code, vec!["main.rs"]);
        assert_eq!(breakdown.assets, vec!["logo.PNG"]);
    }

    #[test]
    fn test_categorize_caps_entries() {
        let entries: Vec<FileNode> = (0..150)
            .map(|i| node(&format!("dir{}", i), EntryKind::Dir))
            .collect();
        assert_eq!(categorize_files(&entries).directories.len(), BREAKDOWN_LIMIT);
    }

    #[test]
    fn test_extension_match_is_not_substring_match() {
        // ".c" must not match ".config" or ".css"
        let entries = vec![node("styles.css", EntryKind::File)];
        let breakdown = categorize_files(&entries);
        assert!(breakdown.source_code.is_empty());
    }
}
