//! Board search filter.

use kanban_proto::Task;

/// Case-insensitive substring match on title or description.
///
/// The term is used as typed, spaces included; only an empty term matches
/// everything.
#[must_use]
pub fn matches(task: &Task, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task.description_text().to_lowercase().contains(&needle)
}
