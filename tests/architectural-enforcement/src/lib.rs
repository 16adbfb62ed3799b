//! Architectural Enforcement Integration Tests
//!
//! Source scanners shared by the tests in `tests/`:
//! - No sleep() calls in production code
//! - No blocking I/O inside async functions
//!
//! The scanners are line based. Everything from the first `#[cfg(test)]`
//! of a file onwards counts as test code and is skipped.

use std::fs;
use std::path::{Path, PathBuf};

/// One offending line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File, relative to the workspace root
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// What rule was broken
    pub rule: &'static str,
    /// The trimmed source line
    pub source: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.rule,
            self.source
        )
    }
}

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// A production source file, cut off at its test module
#[derive(Debug)]
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// Lines before the first `#[cfg(test)]`
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Split `content` into production lines
    #[must_use]
    pub fn from_content(path: PathBuf, content: &str) -> Self {
        let lines = content
            .lines()
            .take_while(|line| !line.trim().starts_with("#[cfg(test)]"))
            .map(str::to_string)
            .collect();
        Self { path, lines }
    }

    /// Line `idx` with any trailing `//` comment removed
    #[must_use]
    pub fn code(&self, idx: usize) -> &str {
        let line = &self.lines[idx];
        line.split("//").next().unwrap_or(line.as_str())
    }

    /// Build a violation for line `idx`
    #[must_use]
    pub fn violation(&self, idx: usize, rule: &'static str) -> Violation {
        Violation {
            path: self.path.clone(),
            line: idx + 1,
            rule,
            source: self.lines[idx].trim().to_string(),
        }
    }

    /// Whether line `idx` is inside an `async fn`
    ///
    /// `None` when no enclosing function header is found before a module
    /// or impl boundary.
    #[must_use]
    pub fn enclosing_fn_is_async(&self, idx: usize) -> Option<bool> {
        for line in self.lines[..=idx].iter().rev() {
            let line = line.trim();
            if let Some(is_async) = fn_header(line) {
                return Some(is_async);
            }
            if line.starts_with("mod ") || (line.starts_with("impl") && line.contains('{')) {
                return None;
            }
        }
        None
    }

    /// Whether any of the `before` lines up to `idx` contains `needle`
    /// (case-insensitive)
    #[must_use]
    pub fn mentions_before(&self, idx: usize, before: usize, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.lines[idx.saturating_sub(before)..=idx]
            .iter()
            .any(|line| line.to_lowercase().contains(&needle))
    }
}

/// Whether `line` opens a function, and if so whether it is async
#[must_use]
pub fn fn_header(line: &str) -> Option<bool> {
    let mut rest = line.trim_start();
    for prefix in ["pub(crate) ", "pub(super) ", "pub "] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }

    let is_async = if let Some(stripped) = rest.strip_prefix("async ") {
        rest = stripped;
        true
    } else {
        false
    };

    rest.starts_with("fn ").then_some(is_async)
}

/// Every `.rs` file under `dir` (relative to the workspace root)
///
/// A missing directory yields nothing.
#[must_use]
pub fn production_sources(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root();
    let base = root.join(dir);
    if !base.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(&base)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| {
            let content = fs::read_to_string(e.path()).ok()?;
            let relative = e.path().strip_prefix(&root).unwrap_or(e.path()).to_path_buf();
            Some(SourceFile::from_content(relative, &content))
        })
        .collect()
}

/// Print violations and fail the calling test
///
/// # Panics
///
/// Whenever `violations` is not empty.
pub fn report(title: &str, violations: &[Violation], guidance: &[&str]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ CRITICAL: {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    eprintln!();
    for line in guidance {
        eprintln!("{line}");
    }

    panic!(
        "\nFound {} violation(s) in production code.\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(lines: &[&str]) -> SourceFile {
        SourceFile::from_content(PathBuf::from("x.rs"), &lines.join("\n"))
    }

    #[test]
    fn test_fn_header_detection() {
        assert_eq!(fn_header("fn load() {"), Some(false));
        assert_eq!(fn_header("    pub async fn run(&mut self) {"), Some(true));
        assert_eq!(fn_header("pub(crate) fn helper()"), Some(false));
        assert_eq!(fn_header("let f = async move {"), None);
    }

    #[test]
    fn test_test_module_is_cut_off() {
        let source = file(&["fn a() {}", "#[cfg(test)]", "mod tests {", "fn b() {}", "}"]);
        assert_eq!(source.lines.len(), 1);
    }

    #[test]
    fn test_enclosing_async_fn() {
        let source = file(&[
            "async fn bad_function() {",
            "    let contents = std::fs::read_to_string(\"file.txt\")?;",
            "}",
            "fn fine() {",
            "    let contents = std::fs::read_to_string(\"config.toml\")?;",
            "}",
        ]);

        assert_eq!(source.enclosing_fn_is_async(1), Some(true));
        assert_eq!(source.enclosing_fn_is_async(4), Some(false));
    }

    #[test]
    fn test_comments_are_ignored() {
        let source = file(&["let x = 1; // tokio::time::sleep(d)"]);
        assert!(!source.code(0).contains("sleep"));
    }
}
