//! Column model and database operations
//!
//! Columns are ordered within their board by a dense, zero-based `position`.
//! The queries here are row-level building blocks; the ordering rules are
//! applied by the repository inside a transaction that holds the board lock
//! (see [`crate::repository::postgres`]).
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE columns (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
//!     title TEXT NOT NULL CHECK (title <> ''),
//!     position INTEGER NOT NULL CHECK (position >= 0),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT columns_board_position_key
//!         UNIQUE (board_id, position) DEFERRABLE INITIALLY DEFERRED
//! );
//! ```

use crate::ordering::{Position, Positioned, Shift};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Column model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Column {
    /// Unique column ID
    pub id: Uuid,

    /// Owning board; never changes after creation
    pub board_id: Uuid,

    /// Display title (non-empty)
    pub title: String,

    /// Zero-based slot within the board
    pub position: Position,

    /// When the column was created
    pub created_at: DateTime<Utc>,
}

impl Positioned for Column {
    fn position(&self) -> Position {
        self.position
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
    }
}

/// Input for creating a column. Position is assigned by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateColumn {
    /// Board to append the column to
    pub board_id: Uuid,

    /// Column title
    pub title: String,
}

impl Column {
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        data: &CreateColumn,
        position: Position,
    ) -> Result<Self, sqlx::Error> {
        let column = sqlx::query_as::<_, Column>(
            r#"
            INSERT INTO columns (board_id, title, position)
            VALUES ($1, $2, $3)
            RETURNING id, board_id, title, position, created_at
            "#,
        )
        .bind(data.board_id)
        .bind(&data.title)
        .bind(position)
        .fetch_one(executor)
        .await?;

        Ok(column)
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let column = sqlx::query_as::<_, Column>(
            r#"
            SELECT id, board_id, title, position, created_at
            FROM columns
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(column)
    }

    /// Lists a board's columns in position order
    pub async fn list_by_board(
        executor: impl PgExecutor<'_>,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let columns = sqlx::query_as::<_, Column>(
            r#"
            SELECT id, board_id, title, position, created_at
            FROM columns
            WHERE board_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await?;

        Ok(columns)
    }

    pub async fn count_by_board(
        executor: impl PgExecutor<'_>,
        board_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM columns WHERE board_id = $1")
            .bind(board_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    /// Locks the given column rows until the surrounding transaction ends.
    ///
    /// Rows are locked in ascending id order so two transactions locking the
    /// same pair cannot deadlock. Returns how many rows were locked.
    pub async fn lock_many(
        executor: impl PgExecutor<'_>,
        ids: &[Uuid],
    ) -> Result<usize, sqlx::Error> {
        let locked: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM columns
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;

        Ok(locked.len())
    }

    pub async fn rename(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        title: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let column = sqlx::query_as::<_, Column>(
            r#"
            UPDATE columns
            SET title = $2
            WHERE id = $1
            RETURNING id, board_id, title, position, created_at
            "#,
        )
        .bind(id)
        .bind(title)
        .fetch_optional(executor)
        .await?;

        Ok(column)
    }

    /// Applies a shift to the board's columns, skipping `except`
    ///
    /// # Returns
    ///
    /// Number of columns moved
    pub async fn shift(
        executor: impl PgExecutor<'_>,
        board_id: Uuid,
        shift: &Shift,
        except: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE columns
            SET position = position + $2
            WHERE board_id = $1
              AND position BETWEEN $3 AND $4
              AND id <> $5
            "#,
        )
        .bind(board_id)
        .bind(shift.delta)
        .bind(shift.start)
        .bind(shift.end)
        .bind(except)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_position(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        position: Position,
    ) -> Result<Self, sqlx::Error> {
        let column = sqlx::query_as::<_, Column>(
            r#"
            UPDATE columns
            SET position = $2
            WHERE id = $1
            RETURNING id, board_id, title, position, created_at
            "#,
        )
        .bind(id)
        .bind(position)
        .fetch_one(executor)
        .await?;

        Ok(column)
    }

    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM columns WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
