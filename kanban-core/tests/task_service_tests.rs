//! Integration tests for task operations
//!
//! Run with: cargo test --test task_service_tests

mod common;

use common::{strings, Fixture};
use kanban_core::error::ErrorKind;
use kanban_core::models::UpdateTask;
use uuid::Uuid;

#[tokio::test]
async fn test_create_appends_tasks() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;

    let tasks = fx.tasks(columns[0].id, &["A", "B", "C"]).await;
    let positions: Vec<i32> = tasks.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert!(tasks.iter().all(|t| t.column_id == columns[0].id));
}

#[tokio::test]
async fn test_create_with_description() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;

    let task = fx
        .kanban
        .tasks
        .create(
            fx.editor.id,
            columns[0].id,
            " Write release notes ",
            Some("Cover the migration steps".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(task.title, "Write release notes");
    assert_eq!(task.description.as_deref(), Some("Cover the migration steps"));

    let blank = fx
        .kanban
        .tasks
        .create(fx.editor.id, columns[0].id, "Tidy up", Some("   ".to_string()))
        .await
        .unwrap();
    assert_eq!(blank.description, None);
}

#[tokio::test]
async fn test_create_validation_and_existence() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;

    let err = fx
        .kanban
        .tasks
        .create(fx.owner.id, columns[0].id, "  ", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = fx
        .kanban
        .tasks
        .create(fx.outsider.id, Uuid::new_v4(), "Orphan", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = fx
        .kanban
        .tasks
        .create(fx.viewer.id, columns[0].id, "Sneaky", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    assert!(fx.task_titles(columns[0].id).await.is_empty());
}

#[tokio::test]
async fn test_move_first_task_to_end() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;
    let tasks = fx.tasks(columns[0].id, &["A", "B", "C"]).await;

    let moved = fx
        .kanban
        .tasks
        .move_task(fx.editor.id, tasks[0].id, columns[0].id, 2)
        .await
        .unwrap();
    assert_eq!(moved.position, 2);

    let listed = fx
        .kanban
        .tasks
        .get_by_column(fx.viewer.id, columns[0].id)
        .await
        .unwrap();
    let order: Vec<(String, i32)> = listed.into_iter().map(|t| (t.title, t.position)).collect();
    assert_eq!(
        order,
        vec![
            ("B".to_string(), 0),
            ("C".to_string(), 1),
            ("A".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn test_move_within_column_range() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;
    let tasks = fx.tasks(columns[0].id, &["A", "B"]).await;

    let err = fx
        .kanban
        .tasks
        .move_task(fx.owner.id, tasks[0].id, columns[0].id, 2)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let same = fx
        .kanban
        .tasks
        .move_task(fx.owner.id, tasks[1].id, columns[0].id, 1)
        .await
        .unwrap();
    assert_eq!(same, tasks[1]);
    assert_eq!(fx.task_titles(columns[0].id).await, strings(&["A", "B"]));
}

#[tokio::test]
async fn test_move_is_idempotent() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;
    let tasks = fx.tasks(columns[0].id, &["A", "B", "C", "D"]).await;

    for _ in 0..2 {
        fx.kanban
            .tasks
            .move_task(fx.owner.id, tasks[3].id, columns[0].id, 1)
            .await
            .unwrap();
        assert_eq!(
            fx.task_titles(columns[0].id).await,
            strings(&["A", "D", "B", "C"])
        );
    }
}

#[tokio::test]
async fn test_move_across_columns() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo", "Done"]).await;
    let todo = fx.tasks(columns[0].id, &["A", "B", "C"]).await;
    fx.tasks(columns[1].id, &["X", "Y"]).await;

    let moved = fx
        .kanban
        .tasks
        .move_task(fx.editor.id, todo[1].id, columns[1].id, 1)
        .await
        .unwrap();
    assert_eq!(moved.column_id, columns[1].id);
    assert_eq!(moved.position, 1);

    assert_eq!(fx.task_titles(columns[0].id).await, strings(&["A", "C"]));
    assert_eq!(fx.task_titles(columns[1].id).await, strings(&["X", "B", "Y"]));
    fx.assert_tasks_dense(columns[0].id).await;
    fx.assert_tasks_dense(columns[1].id).await;
}

#[tokio::test]
async fn test_move_across_columns_can_append() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo", "Done"]).await;
    let todo = fx.tasks(columns[0].id, &["A"]).await;
    fx.tasks(columns[1].id, &["X", "Y"]).await;

    let err = fx
        .kanban
        .tasks
        .move_task(fx.owner.id, todo[0].id, columns[1].id, 3)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(fx.task_titles(columns[0].id).await, strings(&["A"]));

    let moved = fx
        .kanban
        .tasks
        .move_task(fx.owner.id, todo[0].id, columns[1].id, 2)
        .await
        .unwrap();
    assert_eq!(moved.position, 2);
    assert_eq!(fx.task_titles(columns[1].id).await, strings(&["X", "Y", "A"]));
    assert!(fx.task_titles(columns[0].id).await.is_empty());
}

#[tokio::test]
async fn test_move_into_empty_column() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo", "Done"]).await;
    let todo = fx.tasks(columns[0].id, &["A", "B"]).await;

    fx.kanban
        .tasks
        .move_task(fx.owner.id, todo[0].id, columns[1].id, 0)
        .await
        .unwrap();

    assert_eq!(fx.task_titles(columns[0].id).await, strings(&["B"]));
    assert_eq!(fx.task_titles(columns[1].id).await, strings(&["A"]));

    // Append in the source uses the compacted count
    let next = fx
        .kanban
        .tasks
        .create(fx.owner.id, columns[0].id, "C", None)
        .await
        .unwrap();
    assert_eq!(next.position, 1);
}

#[tokio::test]
async fn test_cross_board_move_is_rejected() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;
    let tasks = fx.tasks(columns[0].id, &["A", "B"]).await;

    let other_board = fx.kanban.boards.create(fx.owner.id, "Elsewhere").await.unwrap();
    let foreign = fx
        .kanban
        .columns
        .create(fx.owner.id, other_board.id, "Inbox")
        .await
        .unwrap();

    let err = fx
        .kanban
        .tasks
        .move_task(fx.owner.id, tasks[0].id, foreign.id, 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    assert_eq!(fx.task_titles(columns[0].id).await, strings(&["A", "B"]));
    assert!(fx.task_titles(foreign.id).await.is_empty());
    let task = fx.kanban.tasks.get(fx.owner.id, tasks[0].id).await.unwrap();
    assert_eq!(task, tasks[0]);
}

#[tokio::test]
async fn test_move_to_missing_column() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;
    let tasks = fx.tasks(columns[0].id, &["A"]).await;

    let err = fx
        .kanban
        .tasks
        .move_task(fx.owner.id, tasks[0].id, Uuid::new_v4(), 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_viewer_cannot_move() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;
    let tasks = fx.tasks(columns[0].id, &["A", "B"]).await;

    let err = fx
        .kanban
        .tasks
        .move_task(fx.viewer.id, tasks[0].id, columns[0].id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(fx.task_titles(columns[0].id).await, strings(&["A", "B"]));
}

#[tokio::test]
async fn test_update_keeps_position() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;
    let tasks = fx.tasks(columns[0].id, &["A", "B"]).await;

    let updated = fx
        .kanban
        .tasks
        .update(
            fx.editor.id,
            tasks[1].id,
            UpdateTask {
                title: "B, revised".to_string(),
                description: Some("Now with details".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "B, revised");
    assert_eq!(updated.description.as_deref(), Some("Now with details"));
    assert_eq!(updated.position, 1);
    assert_eq!(updated.column_id, columns[0].id);

    let err = fx
        .kanban
        .tasks
        .update(
            fx.editor.id,
            tasks[1].id,
            UpdateTask {
                title: "".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = fx
        .kanban
        .tasks
        .update(
            fx.viewer.id,
            tasks[1].id,
            UpdateTask {
                title: "Viewer edit".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_delete_compacts() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;
    let tasks = fx.tasks(columns[0].id, &["A", "B", "C"]).await;

    fx.kanban.tasks.delete(fx.editor.id, tasks[0].id).await.unwrap();

    let listed = fx
        .kanban
        .tasks
        .get_by_column(fx.owner.id, columns[0].id)
        .await
        .unwrap();
    let order: Vec<(String, i32)> = listed.into_iter().map(|t| (t.title, t.position)).collect();
    assert_eq!(order, vec![("B".to_string(), 0), ("C".to_string(), 1)]);

    let err = fx.kanban.tasks.get(fx.owner.id, tasks[0].id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = fx.kanban.tasks.delete(fx.owner.id, tasks[0].id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_outsider_cannot_read_tasks() {
    let fx = Fixture::new().await;
    let columns = fx.columns(&["Todo"]).await;
    let tasks = fx.tasks(columns[0].id, &["A"]).await;

    let err = fx.kanban.tasks.get(fx.outsider.id, tasks[0].id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = fx
        .kanban
        .tasks
        .get_by_column(fx.outsider.id, columns[0].id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}
