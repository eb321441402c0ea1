//! Board membership model and database operations
//!
//! A membership binds a user to a board with a role. Memberships are the only
//! source of authorization truth: boards carry no owner column, so a user who
//! has no row here cannot see or touch the board.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE board_role AS ENUM ('owner', 'editor', 'viewer');
//!
//! CREATE TABLE board_members (
//!     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     role board_role NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (board_id, user_id)
//! );
//! ```
//!
//! # Roles
//!
//! - **owner**: created the board; full control
//! - **editor**: create, edit, move and delete columns and tasks; invite members
//! - **viewer**: read-only access

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use uuid::Uuid;

/// Roles a user can hold on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "board_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BoardRole {
    /// Created the board; exactly one per board
    Owner,

    /// May mutate columns, tasks and memberships
    Editor,

    /// Read-only access
    Viewer,
}

impl BoardRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardRole::Owner => "owner",
            BoardRole::Editor => "editor",
            BoardRole::Viewer => "viewer",
        }
    }

    /// Checks if this role has permission level of the required role
    ///
    /// Hierarchy: Owner > Editor > Viewer
    pub fn has_permission(&self, required: &BoardRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            BoardRole::Owner => 3,
            BoardRole::Editor => 2,
            BoardRole::Viewer => 1,
        }
    }
}

impl fmt::Display for BoardRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's membership on a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoardMember {
    /// Board ID
    pub board_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role on the board
    pub role: BoardRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for adding a member to a board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBoardMember {
    /// Board ID
    pub board_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign
    pub role: BoardRole,
}

impl BoardMember {
    /// Inserts a membership row
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The membership already exists (unique violation)
    /// - The board or user doesn't exist (foreign key violation)
    /// - A second owner is inserted for the same board
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: &CreateBoardMember,
    ) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, BoardMember>(
            r#"
            INSERT INTO board_members (board_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING board_id, user_id, role, created_at
            "#,
        )
        .bind(data.board_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(member)
    }

    /// Gets a user's role on a board, None if they are not a member
    pub async fn get_role(
        executor: impl PgExecutor<'_>,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BoardRole>, sqlx::Error> {
        let role: Option<BoardRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM board_members
            WHERE board_id = $1 AND user_id = $2
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(role)
    }

    /// Checks if a user has any membership on a board
    pub async fn exists(
        executor: impl PgExecutor<'_>,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM board_members
                WHERE board_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Deletes a membership
    ///
    /// # Returns
    ///
    /// True if a row was deleted, false if the membership didn't exist
    pub async fn delete(
        executor: impl PgExecutor<'_>,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM board_members WHERE board_id = $1 AND user_id = $2")
            .bind(board_id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all members of a board, oldest first
    pub async fn list_by_board(
        executor: impl PgExecutor<'_>,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, BoardMember>(
            r#"
            SELECT board_id, user_id, role, created_at
            FROM board_members
            WHERE board_id = $1
            ORDER BY created_at ASC, user_id ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_role_as_str() {
        assert_eq!(BoardRole::Owner.as_str(), "owner");
        assert_eq!(BoardRole::Editor.as_str(), "editor");
        assert_eq!(BoardRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(BoardRole::Owner.has_permission(&BoardRole::Editor));
        assert!(BoardRole::Editor.has_permission(&BoardRole::Editor));
        assert!(BoardRole::Editor.has_permission(&BoardRole::Viewer));
        assert!(!BoardRole::Viewer.has_permission(&BoardRole::Editor));
        assert!(!BoardRole::Editor.has_permission(&BoardRole::Owner));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&BoardRole::Owner).unwrap();
        assert_eq!(json, "\"owner\"");
    }
}
