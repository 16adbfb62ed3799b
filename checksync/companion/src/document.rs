//! Markdown Checklist Document
//!
//! The companion's source of truth is a plain markdown file. Open tasks
//! (`- [ ] label`) become list items; everything else is carried through
//! untouched so the file can be written back after a toggle.
//!
//! Item indices are assigned at parse time. Checking an item rewrites its
//! line in place but keeps it in the list, so indices stay stable until the
//! document is loaded again.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static OPEN_TASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-\s\[\s\]\s*(.*)$").unwrap_or_else(|e| unreachable!("task pattern: {e}"))
});

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s+(.+?)\s*$").unwrap_or_else(|e| unreachable!("heading pattern: {e}"))
});

const OPEN_MARKER: &str = "- [ ]";
const DONE_MARKER: &str = "- [x]";

/// Document errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The device referred to an item the document does not have
    #[error("invalid item index {index} (document has {count} items)")]
    InvalidIndex {
        /// Requested index
        index: i64,
        /// Items in the document
        count: usize,
    },
}

/// One open task found in the document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentItem {
    /// Label with surrounding whitespace removed
    pub label: String,
    /// Zero-based line number in the document
    pub line: usize,
    /// Whether the device has checked it since loading
    pub checked: bool,
}

/// A parsed checklist document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChecklistDocument {
    lines: Vec<String>,
    items: Vec<DocumentItem>,
}

impl ChecklistDocument {
    /// Parse markdown text
    ///
    /// Lines are split on `\n` or `\r\n`; only unchecked tasks are items.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();

        let items = lines
            .iter()
            .enumerate()
            .filter_map(|(line, text)| {
                OPEN_TASK.captures(text).map(|caps| DocumentItem {
                    label: caps
                        .get(1)
                        .map_or("", |m| m.as_str())
                        .trim()
                        .to_string(),
                    line,
                    checked: false,
                })
            })
            .collect();

        Self { lines, items }
    }

    /// Open tasks in document order
    #[must_use]
    pub fn items(&self) -> &[DocumentItem] {
        &self.items
    }

    /// Text of the first level-one heading, used as the list title
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.lines
            .iter()
            .find_map(|line| HEADING.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Check or uncheck the item at `index` and rewrite its line
    ///
    /// # Errors
    ///
    /// [`DocumentError::InvalidIndex`] if there is no such item.
    pub fn set_checked(&mut self, index: i64, checked: bool) -> Result<(), DocumentError> {
        let count = self.items.len();
        let item = usize::try_from(index)
            .ok()
            .and_then(|i| self.items.get_mut(i))
            .ok_or(DocumentError::InvalidIndex { index, count })?;

        let line = &mut self.lines[item.line];
        let (from, to) = if checked {
            (OPEN_MARKER, DONE_MARKER)
        } else {
            (DONE_MARKER, OPEN_MARKER)
        };
        if line.contains(from) {
            *line = line.replacen(from, to, 1);
        } else {
            tracing::debug!(line = item.line, "Task marker not found, line left as is");
        }
        item.checked = checked;

        tracing::info!(index, checked, label = %item.label, "Document item updated");
        Ok(())
    }

    /// The document as text, lines joined with `\n`
    #[must_use]
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}
