//! Property-based tests for the task wire format.
//!
//! Uses proptest to verify:
//! 1. Every column identifier parses back to its own column, and nothing
//!    else parses to a column.
//! 2. Any valid `Task` survives a JSON round trip, with empty descriptions
//!    normalised away.
//! 3. Any non-empty title passes validation, however long.
//! 4. Arbitrary bytes never panic the task decoder.

use kanban_proto::task::validate_title;
use kanban_proto::{Status, Task, TaskDraft, TaskId, ValidationError};
use proptest::prelude::*;

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Todo),
        Just(Status::InProgress),
        Just(Status::Done),
    ]
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-f0-9-]{1,36}",
        "[^\x00]{1,64}",
        prop::option::of("[^\x00]{0,128}"),
        arb_status(),
    )
        .prop_map(|(id, title, description, status)| Task {
            id: TaskId::new(id),
            title,
            description,
            status,
        })
}

proptest! {
    #[test]
    fn column_ids_parse_to_their_column(status in arb_status()) {
        prop_assert_eq!(Status::from_column_id(status.column_id()), Some(status));
        prop_assert_eq!(status.column_id().parse::<Status>(), Ok(status));
    }

    #[test]
    fn other_strings_are_not_columns(s in ".{0,32}") {
        prop_assume!(!Status::ALL.iter().any(|c| c.column_id() == s));
        prop_assert_eq!(Status::from_column_id(&s), None);
        prop_assert!(serde_json::from_value::<Status>(serde_json::Value::String(s)).is_err());
    }

    #[test]
    fn task_json_round_trip(task in arb_task()) {
        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&decoded.id, &task.id);
        prop_assert_eq!(&decoded.title, &task.title);
        prop_assert_eq!(decoded.status, task.status);
        prop_assert_eq!(decoded.description_text(), task.description_text());
    }

    #[test]
    fn draft_into_task_preserves_content(
        title in "[^\x00]{1,64}",
        description in "[^\x00]{0,64}",
        status in arb_status(),
    ) {
        let draft = TaskDraft::new(title.clone(), description.clone(), status);
        let task = draft.into_task(TaskId::new("id"));
        prop_assert_eq!(&task.title, &title);
        prop_assert_eq!(task.description_text(), description.as_str());
        prop_assert_eq!(task.status, status);
    }

    #[test]
    fn any_non_empty_title_is_valid(len in 1usize..4096, c in any::<char>()) {
        let title: String = std::iter::repeat_n(c, len).collect();
        prop_assert!(validate_title(&title).is_ok());
        prop_assert!(TaskDraft::new(title, "", Status::Todo).validate().is_ok());
    }

    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = serde_json::from_slice::<Task>(&bytes);
        let _ = serde_json::from_slice::<Vec<Task>>(&bytes);
    }
}
