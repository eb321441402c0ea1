//! PostgreSQL repository backend
//!
//! Each ordering mutation runs in one transaction under READ COMMITTED:
//!
//! 1. `SET LOCAL lock_timeout` from configuration, so a blocked writer fails
//!    fast instead of queueing forever
//! 2. lock the parent row(s) with `SELECT ... FOR UPDATE`: the board for
//!    column writes, the column(s) for task writes, two columns in ascending
//!    id order for a cross-column move
//! 3. re-read the moving row under the lock and count its siblings
//! 4. ask [`crate::ordering`] for a plan and apply it with set-based updates
//!
//! A lost race surfaces as [`RepoError::TransactionConflict`] and the
//! transaction is rolled back when it is dropped. Sibling position
//! uniqueness is also enforced by a deferred unique constraint checked at
//! commit.

use crate::error::{RepoError, RepoResult};
use crate::models::{
    Board, BoardMember, BoardRole, Column, CreateBoard, CreateBoardMember, CreateColumn,
    CreateTask, CreateUser, Task, UpdateTask, User,
};
use crate::ordering::{self, MovePlan, OrderingError, Position};
use crate::repository::{
    BoardMemberRepository, BoardRepository, ColumnRepository, TaskRepository, UserRepository,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

/// Default per-transaction lock timeout
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Repository backend over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_lock_timeout(pool, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Opens a transaction with this store's lock timeout applied
    async fn begin(&self) -> RepoResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }
}

/// Converts a `COUNT(*)` result into a sibling count
fn sibling_count(count: i64) -> Result<usize, OrderingError> {
    usize::try_from(count).map_err(|_| OrderingError::Overflow)
}

/// Maps a failed membership insert to the same errors the memory backend
/// reports, keyed on which constraint fired
fn membership_error(err: sqlx::Error) -> RepoError {
    let constraint = match &err {
        sqlx::Error::Database(db_err) => db_err.constraint().map(str::to_owned),
        _ => None,
    };

    match (RepoError::from(err), constraint.as_deref()) {
        (RepoError::Conflict(_), Some("idx_board_members_single_owner")) => {
            RepoError::Conflict("board already has an owner".to_string())
        }
        (RepoError::Conflict(_), _) => {
            RepoError::Conflict("user is already a member of this board".to_string())
        }
        (RepoError::NotFound(_), Some("board_members_user_id_fkey")) => RepoError::NotFound("user"),
        (RepoError::NotFound(_), _) => RepoError::NotFound("board"),
        (other, _) => other,
    }
}

#[async_trait]
impl BoardRepository for PgStore {
    async fn create(&self, data: CreateBoard) -> RepoResult<Board> {
        let mut tx = self.begin().await?;

        let board = Board::insert(&mut *tx, &data.name).await?;
        BoardMember::create(
            &mut *tx,
            &CreateBoardMember {
                board_id: board.id,
                user_id: data.owner_id,
                role: BoardRole::Owner,
            },
        )
        .await
        .map_err(|err| match RepoError::from(err) {
            RepoError::NotFound(_) => RepoError::NotFound("user"),
            other => other,
        })?;

        tx.commit().await?;
        Ok(board)
    }

    async fn get_all(&self, member_id: Uuid) -> RepoResult<Vec<Board>> {
        Ok(Board::list_for_member(&self.pool, member_id).await?)
    }

    async fn get_by_id(&self, board_id: Uuid) -> RepoResult<Board> {
        Board::find_by_id(&self.pool, board_id)
            .await?
            .ok_or(RepoError::NotFound("board"))
    }

    async fn update(&self, board_id: Uuid, name: &str) -> RepoResult<Board> {
        Board::rename(&self.pool, board_id, name)
            .await?
            .ok_or(RepoError::NotFound("board"))
    }

    async fn delete(&self, board_id: Uuid) -> RepoResult<()> {
        // Memberships, columns and tasks go with the board (ON DELETE CASCADE)
        if !Board::delete(&self.pool, board_id).await? {
            return Err(RepoError::NotFound("board"));
        }
        Ok(())
    }
}

#[async_trait]
impl ColumnRepository for PgStore {
    async fn create(&self, data: CreateColumn) -> RepoResult<Column> {
        let mut tx = self.begin().await?;

        if !Board::lock(&mut *tx, data.board_id).await? {
            return Err(RepoError::NotFound("board"));
        }

        let count = sibling_count(Column::count_by_board(&mut *tx, data.board_id).await?)?;
        let position = ordering::append_position(count)?;
        let column = Column::insert(&mut *tx, &data, position).await?;

        tx.commit().await?;
        Ok(column)
    }

    async fn get_by_board_id(&self, board_id: Uuid) -> RepoResult<Vec<Column>> {
        Ok(Column::list_by_board(&self.pool, board_id).await?)
    }

    async fn get_by_id(&self, column_id: Uuid) -> RepoResult<Column> {
        Column::find_by_id(&self.pool, column_id)
            .await?
            .ok_or(RepoError::NotFound("column"))
    }

    async fn update(&self, column_id: Uuid, title: &str) -> RepoResult<Column> {
        Column::rename(&self.pool, column_id, title)
            .await?
            .ok_or(RepoError::NotFound("column"))
    }

    async fn delete(&self, column_id: Uuid) -> RepoResult<()> {
        let mut tx = self.begin().await?;

        let column = lock_column_board(&mut tx, column_id).await?;
        Column::delete(&mut *tx, column.id).await?;

        let moved = Column::shift(
            &mut *tx,
            column.board_id,
            &ordering::plan_remove(column.position),
            column.id,
        )
        .await?;

        tx.commit().await?;
        tracing::debug!(column_id = %column_id, moved, "Closed column gap");
        Ok(())
    }

    async fn move_to(&self, column_id: Uuid, position: Position) -> RepoResult<Column> {
        let mut tx = self.begin().await?;

        let column = lock_column_board(&mut tx, column_id).await?;
        let count = sibling_count(Column::count_by_board(&mut *tx, column.board_id).await?)?;

        let column = match ordering::plan_move(column.position, position, count)? {
            MovePlan::Unchanged => column,
            MovePlan::Reorder { shift, target } => {
                let moved = Column::shift(&mut *tx, column.board_id, &shift, column.id).await?;
                tracing::debug!(column_id = %column_id, moved, target, "Reordered columns");
                Column::set_position(&mut *tx, column.id, target).await?
            }
        };

        tx.commit().await?;
        Ok(column)
    }
}

/// Locks the column's board and returns the column as seen under the lock
async fn lock_column_board(
    tx: &mut Transaction<'static, Postgres>,
    column_id: Uuid,
) -> RepoResult<Column> {
    let column = Column::find_by_id(&mut **tx, column_id)
        .await?
        .ok_or(RepoError::NotFound("column"))?;

    if !Board::lock(&mut **tx, column.board_id).await? {
        return Err(RepoError::NotFound("board"));
    }

    // Position may have changed while we waited for the lock
    Column::find_by_id(&mut **tx, column_id)
        .await?
        .ok_or(RepoError::NotFound("column"))
}

/// Locks the given columns and returns the task as seen under the lock
///
/// Fails with `TransactionConflict` if the task changed column between the
/// first read and the lock.
async fn lock_task_columns(
    tx: &mut Transaction<'static, Postgres>,
    task: &Task,
    columns: &[Uuid],
) -> RepoResult<Task> {
    let mut ids = columns.to_vec();
    ids.sort();
    ids.dedup();

    let locked = Column::lock_many(&mut **tx, &ids).await?;
    if locked < ids.len() {
        return Err(RepoError::NotFound("column"));
    }

    let current = Task::find_by_id(&mut **tx, task.id)
        .await?
        .ok_or(RepoError::NotFound("task"))?;
    if current.column_id != task.column_id {
        return Err(RepoError::TransactionConflict(format!(
            "task {} moved to another column concurrently",
            task.id
        )));
    }

    Ok(current)
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn create(&self, data: CreateTask) -> RepoResult<Task> {
        let mut tx = self.begin().await?;

        if Column::lock_many(&mut *tx, &[data.column_id]).await? == 0 {
            return Err(RepoError::NotFound("column"));
        }

        let count = sibling_count(Task::count_by_column(&mut *tx, data.column_id).await?)?;
        let position = ordering::append_position(count)?;
        let task = Task::insert(&mut *tx, &data, position).await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn get_by_column_id(&self, column_id: Uuid) -> RepoResult<Vec<Task>> {
        Ok(Task::list_by_column(&self.pool, column_id).await?)
    }

    async fn get_by_id(&self, task_id: Uuid) -> RepoResult<Task> {
        Task::find_by_id(&self.pool, task_id)
            .await?
            .ok_or(RepoError::NotFound("task"))
    }

    async fn update(&self, task_id: Uuid, data: UpdateTask) -> RepoResult<Task> {
        Task::update_text(&self.pool, task_id, &data)
            .await?
            .ok_or(RepoError::NotFound("task"))
    }

    async fn delete(&self, task_id: Uuid) -> RepoResult<()> {
        let mut tx = self.begin().await?;

        let task = Task::find_by_id(&mut *tx, task_id)
            .await?
            .ok_or(RepoError::NotFound("task"))?;
        let task = lock_task_columns(&mut tx, &task, &[task.column_id]).await?;

        Task::delete(&mut *tx, task.id).await?;
        Task::shift(
            &mut *tx,
            task.column_id,
            &ordering::plan_remove(task.position),
            task.id,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn move_to(
        &self,
        task_id: Uuid,
        column_id: Uuid,
        position: Position,
    ) -> RepoResult<Task> {
        let mut tx = self.begin().await?;

        let task = Task::find_by_id(&mut *tx, task_id)
            .await?
            .ok_or(RepoError::NotFound("task"))?;
        let task = lock_task_columns(&mut tx, &task, &[task.column_id, column_id]).await?;

        if task.column_id != column_id {
            let source = Column::find_by_id(&mut *tx, task.column_id)
                .await?
                .ok_or(RepoError::NotFound("column"))?;
            let destination = Column::find_by_id(&mut *tx, column_id)
                .await?
                .ok_or(RepoError::NotFound("column"))?;
            if source.board_id != destination.board_id {
                return Err(RepoError::InvalidMove(
                    "tasks can only move between columns of the same board".to_string(),
                ));
            }
        }

        let task = if task.column_id == column_id {
            let count = sibling_count(Task::count_by_column(&mut *tx, column_id).await?)?;
            match ordering::plan_move(task.position, position, count)? {
                MovePlan::Unchanged => task,
                MovePlan::Reorder { shift, target } => {
                    Task::shift(&mut *tx, column_id, &shift, task.id).await?;
                    Task::place(&mut *tx, task.id, column_id, target).await?
                }
            }
        } else {
            let destination = sibling_count(Task::count_by_column(&mut *tx, column_id).await?)?;
            let insert = ordering::plan_insert(position, destination)?;

            Task::shift(
                &mut *tx,
                task.column_id,
                &ordering::plan_remove(task.position),
                task.id,
            )
            .await?;
            Task::shift(&mut *tx, column_id, &insert, task.id).await?;
            let moved = Task::place(&mut *tx, task.id, column_id, position).await?;

            tracing::debug!(
                task_id = %task_id,
                from = %task.column_id,
                to = %column_id,
                position,
                "Moved task across columns"
            );
            moved
        };

        tx.commit().await?;
        Ok(task)
    }
}

#[async_trait]
impl BoardMemberRepository for PgStore {
    async fn add(&self, data: CreateBoardMember) -> RepoResult<BoardMember> {
        BoardMember::create(&self.pool, &data)
            .await
            .map_err(membership_error)
    }

    async fn get_role(&self, board_id: Uuid, user_id: Uuid) -> RepoResult<Option<BoardRole>> {
        Ok(BoardMember::get_role(&self.pool, board_id, user_id).await?)
    }

    async fn is_member(&self, board_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        Ok(BoardMember::exists(&self.pool, board_id, user_id).await?)
    }

    async fn remove(&self, board_id: Uuid, user_id: Uuid) -> RepoResult<()> {
        if !BoardMember::delete(&self.pool, board_id, user_id).await? {
            return Err(RepoError::NotFound("membership"));
        }
        Ok(())
    }

    async fn get_members(&self, board_id: Uuid) -> RepoResult<Vec<BoardMember>> {
        Ok(BoardMember::list_by_board(&self.pool, board_id).await?)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, data: CreateUser) -> RepoResult<User> {
        User::create(&self.pool, &data).await.map_err(|err| match RepoError::from(err) {
            RepoError::Conflict(_) => RepoError::Conflict("email already registered".to_string()),
            other => other,
        })
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<User> {
        User::find_by_email(&self.pool, email)
            .await?
            .ok_or(RepoError::NotFound("user"))
    }
}
