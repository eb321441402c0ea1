//! Repository contracts
//!
//! Storage is reached only through the traits in this module. Two backends
//! implement them:
//!
//! - [`memory::MemoryStore`]: in-process maps behind one `RwLock`
//! - [`postgres::PgStore`]: PostgreSQL through `sqlx`
//!
//! Services hold `Arc<dyn ...Repository>` and never learn which one is active.
//!
//! # Atomicity
//!
//! Every operation that reads a sibling set and then writes positions
//! (`create`, `delete` and `move_to` on columns and tasks) runs as one atomic
//! unit inside the backend. The backend calls [`crate::ordering`] for the
//! arithmetic; concurrent writers on the same parent are serialized and a
//! reader never sees a half-shifted set.
//!
//! # Errors
//!
//! Each operation reports [`RepoError::NotFound`] for a missing target
//! separately from [`RepoError::Internal`], so services can pick the right
//! error kind.

pub mod memory;
pub mod postgres;

use crate::error::RepoResult;
use crate::models::{
    Board, BoardMember, BoardRole, Column, CreateBoard, CreateBoardMember, CreateColumn,
    CreateTask, CreateUser, Task, UpdateTask, User,
};
use crate::ordering::Position;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[cfg(doc)]
use crate::error::RepoError;

/// Boards and the owner membership created with them
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Inserts the board and its owner membership in one atomic unit
    async fn create(&self, data: CreateBoard) -> RepoResult<Board>;

    /// Boards the user holds any membership on
    async fn get_all(&self, member_id: Uuid) -> RepoResult<Vec<Board>>;

    async fn get_by_id(&self, board_id: Uuid) -> RepoResult<Board>;

    /// Renames the board
    async fn update(&self, board_id: Uuid, name: &str) -> RepoResult<Board>;

    /// Deletes the board with its memberships and any remaining columns and
    /// tasks
    async fn delete(&self, board_id: Uuid) -> RepoResult<()>;
}

/// Columns ordered within a board
#[async_trait]
pub trait ColumnRepository: Send + Sync {
    /// Appends a column at `position = current column count`
    ///
    /// Fails with `NotFound` if the board does not exist.
    async fn create(&self, data: CreateColumn) -> RepoResult<Column>;

    /// A board's columns in position order; empty if there are none
    async fn get_by_board_id(&self, board_id: Uuid) -> RepoResult<Vec<Column>>;

    async fn get_by_id(&self, column_id: Uuid) -> RepoResult<Column>;

    /// Changes the title; position is untouched
    async fn update(&self, column_id: Uuid, title: &str) -> RepoResult<Column>;

    /// Removes the column with any remaining tasks and closes the gap it
    /// leaves
    async fn delete(&self, column_id: Uuid) -> RepoResult<()>;

    /// Moves the column to `position` within its board
    ///
    /// Fails with `Ordering` if `position` is outside `0..column_count`.
    async fn move_to(&self, column_id: Uuid, position: Position) -> RepoResult<Column>;
}

/// Tasks ordered within a column
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Appends a task at `position = current task count`
    ///
    /// Fails with `NotFound` if the column does not exist.
    async fn create(&self, data: CreateTask) -> RepoResult<Task>;

    /// A column's tasks in position order; empty if there are none
    async fn get_by_column_id(&self, column_id: Uuid) -> RepoResult<Vec<Task>>;

    async fn get_by_id(&self, task_id: Uuid) -> RepoResult<Task>;

    /// Changes title and description; position is untouched
    async fn update(&self, task_id: Uuid, data: UpdateTask) -> RepoResult<Task>;

    /// Removes the task and closes the gap it leaves
    async fn delete(&self, task_id: Uuid) -> RepoResult<()>;

    /// Moves the task to `position` in `column_id`
    ///
    /// Within the same column the valid range is `0..task_count`. Into another
    /// column it is `0..=destination_count`; the source column is compacted
    /// and the destination opens a slot, both in the same atomic unit.
    /// A destination on another board fails with `InvalidMove` before any
    /// position changes.
    async fn move_to(&self, task_id: Uuid, column_id: Uuid, position: Position)
        -> RepoResult<Task>;
}

/// Board memberships
#[async_trait]
pub trait BoardMemberRepository: Send + Sync {
    /// Fails with `Conflict` if the membership exists, `NotFound` if the board
    /// or user does not.
    async fn add(&self, data: CreateBoardMember) -> RepoResult<BoardMember>;

    /// The user's role, None if they are not a member
    async fn get_role(&self, board_id: Uuid, user_id: Uuid) -> RepoResult<Option<BoardRole>>;

    async fn is_member(&self, board_id: Uuid, user_id: Uuid) -> RepoResult<bool>;

    /// Fails with `NotFound` if there is no such membership
    async fn remove(&self, board_id: Uuid, user_id: Uuid) -> RepoResult<()>;

    async fn get_members(&self, board_id: Uuid) -> RepoResult<Vec<BoardMember>>;
}

/// Users, as far as the core needs them
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` if the email is taken
    async fn create(&self, data: CreateUser) -> RepoResult<User>;

    async fn get_by_email(&self, email: &str) -> RepoResult<User>;
}

/// One handle per contract, all backed by the same store
#[derive(Clone)]
pub struct Repositories {
    pub boards: Arc<dyn BoardRepository>,
    pub columns: Arc<dyn ColumnRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub members: Arc<dyn BoardMemberRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// Builds the bundle from a store that implements every contract
    pub fn from_store<S>(store: S) -> Self
    where
        S: BoardRepository
            + ColumnRepository
            + TaskRepository
            + BoardMemberRepository
            + UserRepository
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            boards: store.clone(),
            columns: store.clone(),
            tasks: store.clone(),
            members: store.clone(),
            users: store,
        }
    }
}
