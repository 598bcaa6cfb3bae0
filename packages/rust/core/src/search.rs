//! Search filtering over a task listing.

use taskdocs_shared::{TaskCategory, TaskRecord};

/// Keep records in `category` (when given) whose text matches `query`.
///
/// The category is a precondition: a record outside it is dropped no matter
/// how well its text matches. A blank query matches every record.
pub fn filter_tasks(
    records: Vec<TaskRecord>,
    query: &str,
    category: Option<TaskCategory>,
) -> Vec<TaskRecord> {
    let query = query.trim();
    records
        .into_iter()
        .filter(|record| category.is_none_or(|c| record.category == c))
        .filter(|record| query.is_empty() || record.matches_text(query))
        .collect()
}
