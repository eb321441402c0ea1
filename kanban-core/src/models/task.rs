//! Task model and database operations
//!
//! Tasks are the leaf work items. They are ordered within their column by a
//! dense, zero-based `position` and can move to another column of the same
//! board.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     column_id UUID NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
//!     title TEXT NOT NULL CHECK (title <> ''),
//!     description TEXT,
//!     position INTEGER NOT NULL CHECK (position >= 0),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT tasks_column_position_key
//!         UNIQUE (column_id, position) DEFERRABLE INITIALLY DEFERRED
//! );
//! ```

use crate::ordering::{Position, Positioned, Shift};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Column the task currently sits in
    pub column_id: Uuid,

    /// Title (non-empty)
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Zero-based slot within the column
    pub position: Position,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

impl Positioned for Task {
    fn position(&self) -> Position {
        self.position
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
    }
}

/// Input for creating a task. Position is assigned by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Column to append the task to
    pub column_id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for editing a task's text. Position and column are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: String,

    /// New description (None clears it)
    #[serde(default)]
    pub description: Option<String>,
}

impl Task {
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        data: &CreateTask,
        position: Position,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (column_id, title, description, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id, column_id, title, description, position, created_at
            "#,
        )
        .bind(data.column_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(position)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, column_id, title, description, position, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Lists a column's tasks in position order
    pub async fn list_by_column(
        executor: impl PgExecutor<'_>,
        column_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, column_id, title, description, position, created_at
            FROM tasks
            WHERE column_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(column_id)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    pub async fn count_by_column(
        executor: impl PgExecutor<'_>,
        column_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE column_id = $1")
            .bind(column_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    /// Updates title and description
    pub async fn update_text(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2, description = $3
            WHERE id = $1
            RETURNING id, column_id, title, description, position, created_at
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Applies a shift to the column's tasks, skipping `except`
    pub async fn shift(
        executor: impl PgExecutor<'_>,
        column_id: Uuid,
        shift: &Shift,
        except: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET position = position + $2
            WHERE column_id = $1
              AND position BETWEEN $3 AND $4
              AND id <> $5
            "#,
        )
        .bind(column_id)
        .bind(shift.delta)
        .bind(shift.start)
        .bind(shift.end)
        .bind(except)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Places a task at a slot, possibly in another column
    pub async fn place(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        column_id: Uuid,
        position: Position,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET column_id = $2, position = $3
            WHERE id = $1
            RETURNING id, column_id, title, description, position, created_at
            "#,
        )
        .bind(id)
        .bind(column_id)
        .bind(position)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
