//! Task index format parser.
//!
//! The index is a markdown document organized as:
//! - `## Category` (or `## Category tasks`) headings
//! - followed by a table whose rows start with a bold display name and carry
//!   one or more `[Name@Version](doc-path)` links anywhere in the row, e.g.
//!   `| **.NET Core**<br>[DotNetCoreCLI@2](dotnet-core-cli-v2.md) | Build a .NET app. |`
//!
//! Anything that does not match this shape is skipped, never an error.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use taskdocs_shared::{TaskCategory, TaskRecord};

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches `## Heading` (level 2 only).
static H2_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##\s+(.+?)\s*#*\s*$").expect("H2 regex")
});

/// Matches a table row whose first cell opens with `**Display name**`.
/// Group 1: display name, group 2: second cell.
static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|?\s*\*\*([^*]+)\*\*[^|]*\|([^|]*)").expect("row regex")
});

/// Matches `[Name@Version](path)`.
static TASK_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([A-Za-z0-9_-]+)@(\d+)\]\(([^)\s]+)\)").expect("task link regex")
});

/// Matches `<br>`, `<br/>`, `<br />`.
static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("br regex"));

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse an index document into task stubs, in discovery order.
///
/// Headings are looked up in `categories`; rows under an unrecognized heading
/// are ignored. Stubs are deduplicated by `full_name + category`, keeping the
/// first occurrence.
pub(crate) fn parse_task_index(
    content: &str,
    categories: &[(&str, TaskCategory)],
) -> Vec<TaskRecord> {
    let mut current: Option<TaskCategory> = None;
    let mut seen: HashSet<(String, TaskCategory)> = HashSet::new();
    let mut stubs = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(caps) = H2_RE.captures(trimmed) {
            current = TaskCategory::lookup(categories, &caps[1]);
            continue;
        }

        let Some(category) = current else {
            continue;
        };

        let Some(caps) = ROW_RE.captures(trimmed) else {
            continue;
        };

        let display_name = caps[1].trim();
        let description = clean_cell(&caps[2]);

        for link in TASK_LINK_RE.captures_iter(trimmed) {
            let stub = TaskRecord::stub(
                &link[1],
                &link[2],
                display_name,
                description.as_str(),
                category,
                &link[3],
            );
            if seen.insert((stub.full_name.clone(), category)) {
                stubs.push(stub);
            }
        }
    }

    stubs
}

/// Collapse `<br>` tags and surrounding whitespace in a table cell.
fn clean_cell(cell: &str) -> String {
    let replaced = BR_RE.replace_all(cell, " ");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
