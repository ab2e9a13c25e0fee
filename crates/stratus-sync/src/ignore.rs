//! Glob-based ignore matching
//!
//! Patterns come from three places, compiled once per run:
//! the per-root `.stratusignore` file (one glob per line, `#` comments),
//! the configuration's `auto_ignore` list, and the built-in auto-ignores
//! (the sync-state and ignore files themselves, which must never be
//! synchronized). Invalid patterns are logged and skipped.

use std::path::Path;

use glob::Pattern;
use tracing::{debug, warn};

use crate::state::{IGNORE_FILE_NAME, STATE_FILE_NAME};

/// Predicate deciding whether a relative path is excluded from traversal
///
/// Pure after compilation; matching mutates nothing.
pub struct IgnoreMatcher {
    patterns: Vec<Pattern>,
}

impl IgnoreMatcher {
    /// Compiles the matcher for a sync root
    ///
    /// Reads `<root>/.stratusignore` when present and appends the
    /// configured and built-in auto-ignore patterns. A missing or
    /// unreadable ignore file simply contributes nothing.
    pub fn load(root: &Path, auto_ignore: &[String]) -> Self {
        let mut raw: Vec<String> = Vec::new();

        match std::fs::read_to_string(root.join(IGNORE_FILE_NAME)) {
            Ok(content) => {
                raw.extend(
                    content
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty() && !line.starts_with('#'))
                        .map(str::to_string),
                );
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(root = %root.display(), error = %err, "Could not read ignore file");
            }
        }

        raw.extend(auto_ignore.iter().cloned());
        raw.push(STATE_FILE_NAME.to_string());
        raw.push(IGNORE_FILE_NAME.to_string());

        Self::compile(raw)
    }

    /// Builds a matcher from literal patterns (primarily for tests)
    pub fn from_patterns<I>(patterns: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut raw: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        raw.push(STATE_FILE_NAME.to_string());
        raw.push(IGNORE_FILE_NAME.to_string());
        Self::compile(raw)
    }

    fn compile(raw: Vec<String>) -> Self {
        let patterns: Vec<Pattern> = raw
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(err) => {
                    warn!(pattern = %p, error = %err, "Skipping invalid ignore pattern");
                    None
                }
            })
            .collect();

        debug!(count = patterns.len(), "Ignore matcher compiled");
        Self { patterns }
    }

    /// True when the relative path matches any ignore pattern
    ///
    /// Patterns match against the slash-separated relative path; a pattern
    /// without a separator also matches the final path component, so
    /// `*.log` excludes logs at any depth.
    pub fn matches(&self, relative_path: &Path) -> bool {
        let path: String = relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let name = path.rsplit('/').next().unwrap_or(&path);

        self.patterns.iter().any(|pattern| {
            pattern.matches(&path)
                || (!pattern.as_str().contains('/') && pattern.matches(name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_auto_ignores() {
        let matcher = IgnoreMatcher::from_patterns::<[&str; 0]>([]);
        assert!(matcher.matches(Path::new(".stratus.json")));
        assert!(matcher.matches(Path::new(".stratusignore")));
        assert!(!matcher.matches(Path::new("notes.txt")));
    }

    #[test]
    fn test_name_patterns_match_at_any_depth() {
        let matcher = IgnoreMatcher::from_patterns(["*.log"]);
        assert!(matcher.matches(Path::new("build.log")));
        assert!(matcher.matches(Path::new("sub/dir/build.log")));
        assert!(!matcher.matches(Path::new("build.log.txt")));
    }

    #[test]
    fn test_path_patterns_are_anchored() {
        let matcher = IgnoreMatcher::from_patterns(["target/**"]);
        assert!(matcher.matches(Path::new("target/debug/app")));
        assert!(!matcher.matches(Path::new("src/target.rs")));
        assert!(!matcher.matches(Path::new("nested/target/file")));
    }

    #[test]
    fn test_invalid_patterns_skipped() {
        let matcher = IgnoreMatcher::from_patterns(["[broken", "*.tmp"]);
        assert!(matcher.matches(Path::new("scratch.tmp")));
        assert!(!matcher.matches(Path::new("scratch.txt")));
    }

    #[test]
    fn test_load_reads_ignore_file_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(IGNORE_FILE_NAME),
            "# build output\n*.o\n\ndrafts/**\n",
        )
        .unwrap();

        let matcher = IgnoreMatcher::load(dir.path(), &["*.bak".to_string()]);
        assert!(matcher.matches(Path::new("main.o")));
        assert!(matcher.matches(Path::new("drafts/essay.md")));
        assert!(matcher.matches(Path::new("old.bak")));
        assert!(!matcher.matches(Path::new("main.rs")));
    }

    #[test]
    fn test_load_without_ignore_file() {
        let dir = tempfile::tempdir().unwrap();
        let matcher = IgnoreMatcher::load(dir.path(), &[]);
        assert!(!matcher.matches(Path::new("anything.txt")));
        assert!(matcher.matches(Path::new(STATE_FILE_NAME)));
    }
}
