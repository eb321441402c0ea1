//! Board operations and membership management
//!
//! | Operation       | Minimum role |
//! |-----------------|--------------|
//! | `create`        | any user     |
//! | `get_all`       | any user     |
//! | `get`           | viewer       |
//! | `get_members`   | viewer       |
//! | `update`        | editor       |
//! | `delete`        | editor       |
//! | `invite_member` | editor       |
//! | `remove_member` | editor       |

use crate::auth::{AuthorizationGate, BoardPermission};
use crate::error::{KanbanError, KanbanResult};
use crate::models::{Board, BoardMember, BoardRole, CreateBoard, CreateBoardMember};
use crate::repository::Repositories;
use crate::services::required_text;
use uuid::Uuid;

#[derive(Clone)]
pub struct BoardService {
    repos: Repositories,
    gate: AuthorizationGate,
}

impl BoardService {
    pub fn new(repos: Repositories, gate: AuthorizationGate) -> Self {
        Self { repos, gate }
    }

    /// Creates a board owned by the acting user
    ///
    /// The owner membership is written in the same atomic unit as the board.
    pub async fn create(&self, acting_user_id: Uuid, name: &str) -> KanbanResult<Board> {
        let name = required_text("board name", name)?;

        let board = self
            .repos
            .boards
            .create(CreateBoard {
                name,
                owner_id: acting_user_id,
            })
            .await?;

        tracing::info!(board_id = %board.id, owner_id = %acting_user_id, "Board created");
        Ok(board)
    }

    /// Boards the acting user is a member of, in any role
    pub async fn get_all(&self, acting_user_id: Uuid) -> KanbanResult<Vec<Board>> {
        let boards = self.repos.boards.get_all(acting_user_id).await?;
        tracing::debug!(user_id = %acting_user_id, count = boards.len(), "Listed boards");
        Ok(boards)
    }

    pub async fn get(&self, acting_user_id: Uuid, board_id: Uuid) -> KanbanResult<Board> {
        let board = self.repos.boards.get_by_id(board_id).await?;
        self.gate
            .require(board.id, acting_user_id, BoardPermission::Read)
            .await?;
        Ok(board)
    }

    /// Renames a board
    pub async fn update(
        &self,
        acting_user_id: Uuid,
        board_id: Uuid,
        name: &str,
    ) -> KanbanResult<Board> {
        let name = required_text("board name", name)?;

        let board = self.repos.boards.get_by_id(board_id).await?;
        self.gate
            .require(board.id, acting_user_id, BoardPermission::Write)
            .await?;

        let board = self.repos.boards.update(board.id, &name).await?;
        tracing::info!(board_id = %board.id, user_id = %acting_user_id, "Board renamed");
        Ok(board)
    }

    /// Deletes a board with all its columns and tasks
    ///
    /// Children are removed first (tasks, then their column) and the first
    /// failure aborts the cascade.
    pub async fn delete(&self, acting_user_id: Uuid, board_id: Uuid) -> KanbanResult<()> {
        let board = self.repos.boards.get_by_id(board_id).await?;
        self.gate
            .require(board.id, acting_user_id, BoardPermission::Write)
            .await?;

        let columns = self.repos.columns.get_by_board_id(board.id).await?;
        let mut removed_tasks = 0usize;

        // Last to first, so no compaction shifts are needed along the way
        for column in columns.iter().rev() {
            let tasks = self.repos.tasks.get_by_column_id(column.id).await?;
            for task in tasks.iter().rev() {
                self.repos.tasks.delete(task.id).await?;
            }
            removed_tasks += tasks.len();
            self.repos.columns.delete(column.id).await?;
        }

        self.repos.boards.delete(board.id).await?;

        tracing::info!(
            board_id = %board.id,
            user_id = %acting_user_id,
            columns = columns.len(),
            tasks = removed_tasks,
            "Board deleted"
        );
        Ok(())
    }

    /// Adds the user registered under `email` to the board
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the email is blank or `role` is owner
    /// - `NotFound` if the board or the invitee does not exist
    /// - `Forbidden` if the acting user is below editor or invites themselves
    /// - `Conflict` if the invitee is already a member
    pub async fn invite_member(
        &self,
        acting_user_id: Uuid,
        board_id: Uuid,
        email: &str,
        role: BoardRole,
    ) -> KanbanResult<BoardMember> {
        let email = required_text("email", email)?;
        if role == BoardRole::Owner {
            return Err(KanbanError::invalid_input(
                "a board has exactly one owner; invite as editor or viewer",
            ));
        }

        let board = self.repos.boards.get_by_id(board_id).await?;
        self.gate
            .require(board.id, acting_user_id, BoardPermission::ManageMembers)
            .await?;

        let invitee = self.repos.users.get_by_email(&email).await?;
        if invitee.id == acting_user_id {
            tracing::warn!(board_id = %board.id, user_id = %acting_user_id, "Self-invite rejected");
            return Err(KanbanError::forbidden("cannot invite yourself"));
        }

        let member = self
            .repos
            .members
            .add(CreateBoardMember {
                board_id: board.id,
                user_id: invitee.id,
                role,
            })
            .await?;

        tracing::info!(
            board_id = %board.id,
            invited_by = %acting_user_id,
            user_id = %member.user_id,
            role = %member.role,
            "Member invited"
        );
        Ok(member)
    }

    /// Removes a member from the board. The owner cannot be removed.
    pub async fn remove_member(
        &self,
        acting_user_id: Uuid,
        board_id: Uuid,
        user_id: Uuid,
    ) -> KanbanResult<()> {
        let board = self.repos.boards.get_by_id(board_id).await?;
        self.gate
            .require(board.id, acting_user_id, BoardPermission::ManageMembers)
            .await?;

        match self.repos.members.get_role(board.id, user_id).await? {
            None => return Err(KanbanError::not_found("membership not found")),
            Some(BoardRole::Owner) => {
                return Err(KanbanError::forbidden("the board owner cannot be removed"))
            }
            Some(_) => {}
        }

        self.repos.members.remove(board.id, user_id).await?;
        tracing::info!(
            board_id = %board.id,
            removed_by = %acting_user_id,
            user_id = %user_id,
            "Member removed"
        );
        Ok(())
    }

    pub async fn get_members(
        &self,
        acting_user_id: Uuid,
        board_id: Uuid,
    ) -> KanbanResult<Vec<BoardMember>> {
        let board = self.repos.boards.get_by_id(board_id).await?;
        self.gate
            .require(board.id, acting_user_id, BoardPermission::Read)
            .await?;

        Ok(self.repos.members.get_members(board.id).await?)
    }
}
