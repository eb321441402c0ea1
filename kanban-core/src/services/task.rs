//! Task operations
//!
//! A task is authorized through the board of the column it currently sits
//! in. Moves between columns are limited to columns of that same board.

use crate::auth::{AuthorizationGate, BoardPermission};
use crate::error::{KanbanError, KanbanResult};
use crate::models::{Column, CreateTask, Task, UpdateTask};
use crate::ordering::{self, Position};
use crate::repository::Repositories;
use crate::services::{optional_text, required_text};
use uuid::Uuid;

#[derive(Clone)]
pub struct TaskService {
    repos: Repositories,
    gate: AuthorizationGate,
}

impl TaskService {
    pub fn new(repos: Repositories, gate: AuthorizationGate) -> Self {
        Self { repos, gate }
    }

    /// Loads a task together with the column it sits in
    async fn load(&self, task_id: Uuid) -> KanbanResult<(Task, Column)> {
        let task = self.repos.tasks.get_by_id(task_id).await?;
        let column = self.repos.columns.get_by_id(task.column_id).await?;
        Ok((task, column))
    }

    /// Appends a task to the end of the column
    pub async fn create(
        &self,
        acting_user_id: Uuid,
        column_id: Uuid,
        title: &str,
        description: Option<String>,
    ) -> KanbanResult<Task> {
        let title = required_text("task title", title)?;

        let column = self.repos.columns.get_by_id(column_id).await?;
        self.gate
            .require(column.board_id, acting_user_id, BoardPermission::Write)
            .await?;

        let task = self
            .repos
            .tasks
            .create(CreateTask {
                column_id: column.id,
                title,
                description: optional_text(description),
            })
            .await?;

        tracing::info!(
            task_id = %task.id,
            column_id = %column.id,
            position = task.position,
            "Task created"
        );
        Ok(task)
    }

    /// A column's tasks in position order
    pub async fn get_by_column(
        &self,
        acting_user_id: Uuid,
        column_id: Uuid,
    ) -> KanbanResult<Vec<Task>> {
        let column = self.repos.columns.get_by_id(column_id).await?;
        self.gate
            .require(column.board_id, acting_user_id, BoardPermission::Read)
            .await?;

        Ok(self.repos.tasks.get_by_column_id(column.id).await?)
    }

    pub async fn get(&self, acting_user_id: Uuid, task_id: Uuid) -> KanbanResult<Task> {
        let (task, column) = self.load(task_id).await?;
        self.gate
            .require(column.board_id, acting_user_id, BoardPermission::Read)
            .await?;
        Ok(task)
    }

    /// Replaces title and description. Column and position are untouched.
    pub async fn update(
        &self,
        acting_user_id: Uuid,
        task_id: Uuid,
        data: UpdateTask,
    ) -> KanbanResult<Task> {
        let data = UpdateTask {
            title: required_text("task title", &data.title)?,
            description: optional_text(data.description),
        };

        let (task, column) = self.load(task_id).await?;
        self.gate
            .require(column.board_id, acting_user_id, BoardPermission::Write)
            .await?;

        let task = self.repos.tasks.update(task.id, data).await?;
        tracing::info!(task_id = %task.id, user_id = %acting_user_id, "Task updated");
        Ok(task)
    }

    /// Deletes a task; the tasks after it move up one slot
    pub async fn delete(&self, acting_user_id: Uuid, task_id: Uuid) -> KanbanResult<()> {
        let (task, column) = self.load(task_id).await?;
        self.gate
            .require(column.board_id, acting_user_id, BoardPermission::Write)
            .await?;

        self.repos.tasks.delete(task.id).await?;
        tracing::info!(task_id = %task.id, column_id = %column.id, "Task deleted");
        Ok(())
    }

    /// Moves a task to `position` in `column_id`
    ///
    /// Within its column the valid range is `0..task_count`. Into another
    /// column of the same board it is `0..=destination_count`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a bad position or a column on another board
    /// - `NotFound` if the task or the destination column does not exist
    /// - `Forbidden` if the acting user is below editor on the task's board
    pub async fn move_task(
        &self,
        acting_user_id: Uuid,
        task_id: Uuid,
        column_id: Uuid,
        position: Position,
    ) -> KanbanResult<Task> {
        ordering::check_requested(position)?;

        let (task, source) = self.load(task_id).await?;
        self.gate
            .require(source.board_id, acting_user_id, BoardPermission::Write)
            .await?;

        if column_id != source.id {
            let destination = self.repos.columns.get_by_id(column_id).await?;
            if destination.board_id != source.board_id {
                tracing::warn!(
                    task_id = %task.id,
                    from_board = %source.board_id,
                    to_board = %destination.board_id,
                    "Cross-board task move rejected"
                );
                return Err(KanbanError::invalid_input(
                    "tasks can only move between columns of the same board",
                ));
            }
        }

        let moved = self.repos.tasks.move_to(task.id, column_id, position).await?;
        tracing::info!(
            task_id = %moved.id,
            from_column = %task.column_id,
            to_column = %moved.column_id,
            from = task.position,
            to = moved.position,
            "Task moved"
        );
        Ok(moved)
    }
}
