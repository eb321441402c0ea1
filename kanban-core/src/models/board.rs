//! Board model and database operations
//!
//! A board is the top-level container. It owns an ordered list of columns and
//! a set of memberships; deleting it removes both.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE boards (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name TEXT NOT NULL CHECK (name <> ''),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Board model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    /// Unique board ID
    pub id: Uuid,

    /// Display name (non-empty)
    pub name: String,

    /// When the board was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBoard {
    /// Board name
    pub name: String,

    /// User who becomes the board's owner
    pub owner_id: Uuid,
}

impl Board {
    /// Inserts a board row. The owner membership is inserted separately by the
    /// caller, inside the same transaction.
    pub async fn insert(executor: impl PgExecutor<'_>, name: &str) -> Result<Self, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(board)
    }

    /// Finds a board by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            SELECT id, name, created_at
            FROM boards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(board)
    }

    /// Locks the board row until the surrounding transaction ends.
    ///
    /// Every write to the board's column ordering takes this lock first, so
    /// column creates, moves and deletes on one board run one at a time.
    ///
    /// # Returns
    ///
    /// False if the board doesn't exist
    pub async fn lock(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM boards WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(executor)
                .await?;

        Ok(locked.is_some())
    }

    /// Lists boards the user holds any membership on, newest first
    pub async fn list_for_member(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let boards = sqlx::query_as::<_, Board>(
            r#"
            SELECT b.id, b.name, b.created_at
            FROM boards b
            INNER JOIN board_members m ON m.board_id = b.id
            WHERE m.user_id = $1
            ORDER BY b.created_at DESC, b.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(boards)
    }

    /// Renames a board
    ///
    /// # Returns
    ///
    /// The updated board, None if it doesn't exist
    pub async fn rename(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET name = $2
            WHERE id = $1
            RETURNING id, name, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(board)
    }

    /// Deletes a board (memberships cascade)
    ///
    /// # Returns
    ///
    /// True if deleted, false if the board didn't exist
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
