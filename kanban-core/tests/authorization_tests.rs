//! Role checks across every board-scoped operation
//!
//! A viewer succeeds at every read an owner can do and fails every mutation
//! an owner succeeds at. Outsiders fail both.
//!
//! Run with: cargo test --test authorization_tests

mod common;

use common::{create_user, Fixture};
use kanban_core::error::{ErrorKind, KanbanResult};
use kanban_core::models::{BoardRole, UpdateTask};
use uuid::Uuid;

/// Ids of a small board used by every check
struct Layout {
    todo: Uuid,
    done: Uuid,
    task: Uuid,
}

async fn layout(fx: &Fixture) -> Layout {
    let columns = fx.columns(&["Todo", "Done"]).await;
    let tasks = fx.tasks(columns[0].id, &["A", "B"]).await;
    Layout {
        todo: columns[0].id,
        done: columns[1].id,
        task: tasks[0].id,
    }
}

/// Runs every read as `user` and returns the outcomes
async fn reads(fx: &Fixture, l: &Layout, user: Uuid) -> Vec<(&'static str, KanbanResult<()>)> {
    let k = &fx.kanban;
    vec![
        ("board.get", k.boards.get(user, fx.board.id).await.map(|_| ())),
        (
            "board.get_members",
            k.boards.get_members(user, fx.board.id).await.map(|_| ()),
        ),
        (
            "column.get_by_board",
            k.columns.get_by_board(user, fx.board.id).await.map(|_| ()),
        ),
        ("column.get", k.columns.get(user, l.todo).await.map(|_| ())),
        (
            "task.get_by_column",
            k.tasks.get_by_column(user, l.todo).await.map(|_| ()),
        ),
        ("task.get", k.tasks.get(user, l.task).await.map(|_| ())),
    ]
}

/// Runs every mutation as `user` and returns the outcomes
async fn mutations(fx: &Fixture, l: &Layout, user: Uuid) -> Vec<(&'static str, KanbanResult<()>)> {
    let k = &fx.kanban;
    let invitee = create_user(k, "invitee").await;

    vec![
        (
            "board.update",
            k.boards.update(user, fx.board.id, "Renamed").await.map(|_| ()),
        ),
        (
            "board.invite_member",
            k.boards
                .invite_member(user, fx.board.id, &invitee.email, BoardRole::Viewer)
                .await
                .map(|_| ()),
        ),
        (
            "board.remove_member",
            k.boards.remove_member(user, fx.board.id, invitee.id).await,
        ),
        (
            "column.create",
            k.columns.create(user, fx.board.id, "New").await.map(|_| ()),
        ),
        (
            "column.update",
            k.columns.update(user, l.todo, "Renamed").await.map(|_| ()),
        ),
        (
            "column.move",
            k.columns.move_column(user, l.done, 0).await.map(|_| ()),
        ),
        (
            "task.create",
            k.tasks.create(user, l.todo, "New", None).await.map(|_| ()),
        ),
        (
            "task.update",
            k.tasks
                .update(
                    user,
                    l.task,
                    UpdateTask {
                        title: "Renamed".to_string(),
                        description: None,
                    },
                )
                .await
                .map(|_| ()),
        ),
        (
            "task.move",
            k.tasks.move_task(user, l.task, l.done, 0).await.map(|_| ()),
        ),
        ("task.delete", k.tasks.delete(user, l.task).await),
        ("column.delete", k.columns.delete(user, l.done).await),
        ("board.delete", k.boards.delete(user, fx.board.id).await),
    ]
}

#[tokio::test]
async fn test_owner_can_do_everything() {
    let fx = Fixture::new().await;
    let l = layout(&fx).await;

    for (op, result) in reads(&fx, &l, fx.owner.id).await {
        assert!(result.is_ok(), "owner read {} failed: {:?}", op, result);
    }
    for (op, result) in mutations(&fx, &l, fx.owner.id).await {
        assert!(result.is_ok(), "owner mutation {} failed: {:?}", op, result);
    }
}

#[tokio::test]
async fn test_editor_can_do_everything() {
    let fx = Fixture::new().await;
    let l = layout(&fx).await;

    for (op, result) in mutations(&fx, &l, fx.editor.id).await {
        assert!(result.is_ok(), "editor mutation {} failed: {:?}", op, result);
    }
}

#[tokio::test]
async fn test_viewer_reads_but_never_mutates() {
    let fx = Fixture::new().await;
    let l = layout(&fx).await;

    for (op, result) in reads(&fx, &l, fx.viewer.id).await {
        assert!(result.is_ok(), "viewer read {} failed: {:?}", op, result);
    }
    for (op, result) in mutations(&fx, &l, fx.viewer.id).await {
        let err = result.expect_err(op);
        assert_eq!(err.kind(), ErrorKind::Forbidden, "viewer mutation {}", op);
    }

    // Nothing changed
    assert_eq!(fx.column_titles().await, vec!["Todo", "Done"]);
    assert_eq!(fx.task_titles(l.todo).await, vec!["A", "B"]);
}

#[tokio::test]
async fn test_outsider_is_forbidden_everywhere() {
    let fx = Fixture::new().await;
    let l = layout(&fx).await;

    for (op, result) in reads(&fx, &l, fx.outsider.id).await {
        let err = result.expect_err(op);
        assert_eq!(err.kind(), ErrorKind::Forbidden, "outsider read {}", op);
    }
    for (op, result) in mutations(&fx, &l, fx.outsider.id).await {
        let err = result.expect_err(op);
        assert_eq!(err.kind(), ErrorKind::Forbidden, "outsider mutation {}", op);
    }
}

#[tokio::test]
async fn test_roles_are_per_board() {
    let fx = Fixture::new().await;
    let own = fx.kanban.boards.create(fx.viewer.id, "Viewer's own").await.unwrap();

    // Owner of one board, viewer on the other
    fx.kanban
        .columns
        .create(fx.viewer.id, own.id, "Mine")
        .await
        .unwrap();
    let err = fx
        .kanban
        .columns
        .create(fx.viewer.id, fx.board.id, "Theirs")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // The fixture owner has no role on the viewer's board
    let err = fx.kanban.boards.get(fx.owner.id, own.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}
