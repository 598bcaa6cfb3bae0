//! Task index resolution.
//!
//! The public documentation project publishes one index document listing
//! every task by category. This crate fetches that document and turns it into
//! deduplicated [`TaskRecord`] stubs (name, version, display name,
//! description, category, documentation path). Stubs are rebuilt on every
//! call; holding on to them is the caller's choice.

mod parser;

use tracing::{debug, instrument};
use url::Url;

use taskdocs_fetch::{FetchOptions, Fetcher};
use taskdocs_shared::{CATEGORY_TABLE, Result, TaskCategory, TaskRecord};

// ---------------------------------------------------------------------------
// Parsing entry points
// ---------------------------------------------------------------------------

/// Parse an index document using the built-in category table.
///
/// Empty or unstructured input yields an empty list.
pub fn parse_task_index(content: &str) -> Vec<TaskRecord> {
    parser::parse_task_index(content, CATEGORY_TABLE)
}

/// Parse an index document against a caller-supplied category table.
pub fn parse_task_index_with(
    content: &str,
    categories: &[(&str, TaskCategory)],
) -> Vec<TaskRecord> {
    parser::parse_task_index(content, categories)
}

/// Find a stub by case-insensitive full name (`Name@Version`).
pub fn find_stub<'a>(stubs: &'a [TaskRecord], full_name: &str) -> Option<&'a TaskRecord> {
    stubs
        .iter()
        .find(|s| s.full_name.eq_ignore_ascii_case(full_name))
}

/// Group stubs by category in [`TaskCategory::ALL`] order, preserving
/// discovery order within each group. Empty categories are included.
pub fn group_by_category(stubs: &[TaskRecord]) -> Vec<(TaskCategory, Vec<&TaskRecord>)> {
    TaskCategory::ALL
        .iter()
        .map(|category| {
            let members = stubs.iter().filter(|s| s.category == *category).collect();
            (*category, members)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetch the index document at `index_url` and parse it.
#[instrument(skip_all, fields(url = %index_url))]
pub async fn load_task_index(
    fetcher: &Fetcher,
    index_url: &Url,
    opts: &FetchOptions,
) -> Result<Vec<TaskRecord>> {
    let content = fetcher.fetch(index_url.as_str(), opts).await?;
    let stubs = parse_task_index(&content);
    debug!(stubs = stubs.len(), bytes = content.len(), "task index parsed");
    Ok(stubs)
}
