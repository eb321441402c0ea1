//! Column operations
//!
//! Columns are authorized through their own `board_id`. Reads need viewer,
//! everything else editor.

use crate::auth::{AuthorizationGate, BoardPermission};
use crate::error::KanbanResult;
use crate::models::{Column, CreateColumn};
use crate::ordering::{self, Position};
use crate::repository::Repositories;
use crate::services::required_text;
use uuid::Uuid;

#[derive(Clone)]
pub struct ColumnService {
    repos: Repositories,
    gate: AuthorizationGate,
}

impl ColumnService {
    pub fn new(repos: Repositories, gate: AuthorizationGate) -> Self {
        Self { repos, gate }
    }

    /// Appends a column to the end of the board
    pub async fn create(
        &self,
        acting_user_id: Uuid,
        board_id: Uuid,
        title: &str,
    ) -> KanbanResult<Column> {
        let title = required_text("column title", title)?;

        let board = self.repos.boards.get_by_id(board_id).await?;
        self.gate
            .require(board.id, acting_user_id, BoardPermission::Write)
            .await?;

        let column = self
            .repos
            .columns
            .create(CreateColumn {
                board_id: board.id,
                title,
            })
            .await?;

        tracing::info!(
            column_id = %column.id,
            board_id = %board.id,
            position = column.position,
            "Column created"
        );
        Ok(column)
    }

    /// A board's columns in position order
    pub async fn get_by_board(
        &self,
        acting_user_id: Uuid,
        board_id: Uuid,
    ) -> KanbanResult<Vec<Column>> {
        let board = self.repos.boards.get_by_id(board_id).await?;
        self.gate
            .require(board.id, acting_user_id, BoardPermission::Read)
            .await?;

        Ok(self.repos.columns.get_by_board_id(board.id).await?)
    }

    pub async fn get(&self, acting_user_id: Uuid, column_id: Uuid) -> KanbanResult<Column> {
        let column = self.repos.columns.get_by_id(column_id).await?;
        self.gate
            .require(column.board_id, acting_user_id, BoardPermission::Read)
            .await?;
        Ok(column)
    }

    /// Renames a column. Position is untouched.
    pub async fn update(
        &self,
        acting_user_id: Uuid,
        column_id: Uuid,
        title: &str,
    ) -> KanbanResult<Column> {
        let title = required_text("column title", title)?;

        let column = self.repos.columns.get_by_id(column_id).await?;
        self.gate
            .require(column.board_id, acting_user_id, BoardPermission::Write)
            .await?;

        let column = self.repos.columns.update(column.id, &title).await?;
        tracing::info!(column_id = %column.id, user_id = %acting_user_id, "Column renamed");
        Ok(column)
    }

    /// Deletes a column and its tasks; the columns after it move up one slot
    pub async fn delete(&self, acting_user_id: Uuid, column_id: Uuid) -> KanbanResult<()> {
        let column = self.repos.columns.get_by_id(column_id).await?;
        self.gate
            .require(column.board_id, acting_user_id, BoardPermission::Write)
            .await?;

        let tasks = self.repos.tasks.get_by_column_id(column.id).await?;
        for task in tasks.iter().rev() {
            self.repos.tasks.delete(task.id).await?;
        }
        self.repos.columns.delete(column.id).await?;

        tracing::info!(
            column_id = %column.id,
            board_id = %column.board_id,
            tasks = tasks.len(),
            "Column deleted"
        );
        Ok(())
    }

    /// Moves a column to `position` within its board
    ///
    /// Valid positions are `0..column_count`; anything else is `InvalidInput`.
    /// Moving to the current position returns the column unchanged.
    pub async fn move_column(
        &self,
        acting_user_id: Uuid,
        column_id: Uuid,
        position: Position,
    ) -> KanbanResult<Column> {
        ordering::check_requested(position)?;

        let column = self.repos.columns.get_by_id(column_id).await?;
        self.gate
            .require(column.board_id, acting_user_id, BoardPermission::Write)
            .await?;

        let moved = self.repos.columns.move_to(column.id, position).await?;
        tracing::info!(
            column_id = %moved.id,
            board_id = %moved.board_id,
            from = column.position,
            to = moved.position,
            "Column moved"
        );
        Ok(moved)
    }
}
