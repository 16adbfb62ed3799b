//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Timed work is
//! driven by `tokio::time::interval` ticks or by the host's animation
//! callbacks.
//! **Exceptions**: the companion's retry delay between refused sends.

use architectural_enforcement::{production_sources, report, SourceFile, Violation};

struct SleepPolicy {
    dir: &'static str,
    allow_retry: bool,
}

const POLICIES: [SleepPolicy; 3] = [
    // The device core never waits; time only moves through host callbacks
    SleepPolicy {
        dir: "checksync/core/src",
        allow_retry: false,
    },
    SleepPolicy {
        dir: "checksync/companion/src",
        allow_retry: true,
    },
    SleepPolicy {
        dir: "tui/src",
        allow_retry: false,
    },
];

#[test]
fn test_no_sleep_in_production_code() {
    let violations: Vec<Violation> = POLICIES
        .iter()
        .flat_map(|policy| {
            production_sources(policy.dir)
                .into_iter()
                .flat_map(move |file| sleep_violations(&file, policy))
        })
        .collect();

    report(
        "Sleep calls found in production code!",
        &violations,
        &[
            "✅ ACCEPTABLE sleep uses:",
            "  - Fixed delay between retries of a refused send (companion only)",
            "  - Periodic tasks using tokio::time::interval()",
            "  - Test code",
            "❌ FORBIDDEN:",
            "  - Sleep in polling loops",
            "  - Sleep to wait for an animation or a message",
        ],
    );
}

fn sleep_violations(file: &SourceFile, policy: &SleepPolicy) -> Vec<Violation> {
    (0..file.lines.len())
        .filter(|&idx| {
            let code = file.code(idx);
            code.contains("::sleep(") || code.contains(".sleep(")
        })
        .filter(|&idx| !(policy.allow_retry && file.mentions_before(idx, 15, "retry")))
        .filter(|&idx| !file.mentions_before(idx, 20, "tokio::time::interval"))
        .map(|idx| file.violation(idx, "Sleep call"))
        .collect()
}

#[test]
fn test_retry_sleep_detection() {
    let file = SourceFile::from_content(
        "transfer.rs".into(),
        "Err(Rejected) => {\n    retries += 1;\n    tokio::time::sleep(retry_delay).await;\n}",
    );

    let strict = SleepPolicy {
        dir: "",
        allow_retry: false,
    };
    let lenient = SleepPolicy {
        dir: "",
        allow_retry: true,
    };

    assert_eq!(sleep_violations(&file, &strict).len(), 1);
    assert!(sleep_violations(&file, &lenient).is_empty());
}
