//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async code MUST NOT use blocking I/O.
//! **Required**: `tokio::fs` and `reqwest` async calls instead of `std::fs`,
//! `std::net`, `std::process` or `reqwest::blocking`.
//! **Acceptable**: blocking calls inside non-async functions, such as
//! config loading and terminal setup before the event loop starts.

use architectural_enforcement::{production_sources, report, SourceFile, Violation};

const CHECKED_DIRS: [&str; 3] = ["checksync/core/src", "checksync/companion/src", "tui/src"];

#[test]
fn test_no_blocking_io_in_production_code() {
    let violations: Vec<Violation> = CHECKED_DIRS
        .iter()
        .flat_map(|dir| production_sources(dir))
        .flat_map(|file| blocking_io_violations(&file))
        .collect();

    report(
        "Blocking I/O calls found in production code!",
        &violations,
        &[
            "❌ FORBIDDEN in async code:",
            "  - std::fs::read_to_string(), std::fs::write(), std::fs::File",
            "  - std::net::TcpStream",
            "  - std::process::Command",
            "  - reqwest::blocking::*",
            "  - io::stdin() / io::stdout()",
            "✅ REQUIRED async I/O:",
            "  - tokio::fs::read_to_string().await, tokio::fs::write().await",
            "  - reqwest::Client::get().send().await",
        ],
    );
}

fn blocking_io_violations(file: &SourceFile) -> Vec<Violation> {
    let mut violations = Vec::new();

    for idx in 0..file.lines.len() {
        // Blocking calls are fine before the runtime matters
        if file.enclosing_fn_is_async(idx) == Some(false) {
            continue;
        }

        let code = file.code(idx);
        let rule = if code.contains("std::fs") {
            "Blocking file I/O"
        } else if code.contains("std::net") {
            "Blocking network I/O"
        } else if code.contains("std::process::Command") {
            "Blocking process I/O"
        } else if code.contains("reqwest::blocking") {
            "Blocking HTTP client"
        } else if (code.contains("io::stdin()") || code.contains("io::stdout()"))
            && file.enclosing_fn_is_async(idx) == Some(true)
        {
            "Blocking stdin/stdout in async"
        } else {
            continue;
        };

        violations.push(file.violation(idx, rule));
    }

    violations
}

#[test]
fn test_blocking_io_detection() {
    let file = SourceFile::from_content(
        "store.rs".into(),
        "async fn load(&self) {\n    let text = std::fs::read_to_string(&self.path)?;\n}\n\
         fn load_file(path: &Path) {\n    let text = std::fs::read_to_string(path)?;\n}",
    );

    let violations = blocking_io_violations(&file);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].line, 2);
    assert_eq!(violations[0].rule, "Blocking file I/O");
}
