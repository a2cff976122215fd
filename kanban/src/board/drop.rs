//! Drop resolution: which column does a drag release land in?

use kanban_proto::{Status, TaskId};

use super::BoardState;

/// Maps a drag release to the column the dragged task should move to.
///
/// `release_target` is the identifier of the surface under the pointer when
/// the drag ended: a column identifier, a task id, or `None` if the release
/// was over nothing. Column identifiers are checked first. A task id resolves
/// to that task's column. Returns `None` when the target does not resolve,
/// when the dragged task is no longer on the board, or when the resolved
/// column is the one the task is already in.
#[must_use]
pub fn resolve_drop(
    dragged: &TaskId,
    release_target: Option<&str>,
    board: &BoardState,
) -> Option<Status> {
    let target = release_target?;
    let current = board.get(dragged)?.status;

    let resolved = Status::from_column_id(target)
        .or_else(|| board.get(&TaskId::new(target)).map(|t| t.status))?;

    (resolved != current).then_some(resolved)
}
