//! In-memory repository backend
//!
//! All entities live in one [`State`] behind a single `tokio::sync::RwLock`.
//! Mutations hold the write guard for their whole read-plan-write sequence,
//! which makes each of them one atomic unit; reads take the read guard and
//! always see a consistent snapshot.
//!
//! The backend mirrors the Postgres schema's rules: foreign keys (NotFound),
//! unique emails and memberships (Conflict), one owner per board, and the
//! cascades from boards to columns to tasks.

use crate::error::{RepoError, RepoResult};
use crate::models::user::normalize_email;
use crate::models::{
    Board, BoardMember, BoardRole, Column, CreateBoard, CreateBoardMember, CreateColumn,
    CreateTask, CreateUser, Task, UpdateTask, User,
};
use crate::ordering::{self, MovePlan, Position};
use crate::repository::{
    BoardMemberRepository, BoardRepository, ColumnRepository, TaskRepository, UserRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    boards: HashMap<Uuid, Board>,
    members: HashMap<(Uuid, Uuid), BoardMember>,
    columns: HashMap<Uuid, Column>,
    tasks: HashMap<Uuid, Task>,
}

impl State {
    fn column_count(&self, board_id: Uuid) -> usize {
        self.columns
            .values()
            .filter(|c| c.board_id == board_id)
            .count()
    }

    fn task_count(&self, column_id: Uuid) -> usize {
        self.tasks
            .values()
            .filter(|t| t.column_id == column_id)
            .count()
    }

    /// Removes a column's tasks; the column itself is left alone
    fn drop_tasks_of(&mut self, column_id: Uuid) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, t| t.column_id != column_id);
        before - self.tasks.len()
    }
}

/// Process-local store implementing every repository contract
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoardRepository for MemoryStore {
    async fn create(&self, data: CreateBoard) -> RepoResult<Board> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&data.owner_id) {
            return Err(RepoError::NotFound("user"));
        }

        let board = Board {
            id: Uuid::new_v4(),
            name: data.name,
            created_at: Utc::now(),
        };
        state.members.insert(
            (board.id, data.owner_id),
            BoardMember {
                board_id: board.id,
                user_id: data.owner_id,
                role: BoardRole::Owner,
                created_at: board.created_at,
            },
        );
        state.boards.insert(board.id, board.clone());

        Ok(board)
    }

    async fn get_all(&self, member_id: Uuid) -> RepoResult<Vec<Board>> {
        let state = self.state.read().await;

        let mut boards: Vec<Board> = state
            .members
            .values()
            .filter(|m| m.user_id == member_id)
            .filter_map(|m| state.boards.get(&m.board_id).cloned())
            .collect();
        boards.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(boards)
    }

    async fn get_by_id(&self, board_id: Uuid) -> RepoResult<Board> {
        let state = self.state.read().await;
        state
            .boards
            .get(&board_id)
            .cloned()
            .ok_or(RepoError::NotFound("board"))
    }

    async fn update(&self, board_id: Uuid, name: &str) -> RepoResult<Board> {
        let mut state = self.state.write().await;
        let board = state
            .boards
            .get_mut(&board_id)
            .ok_or(RepoError::NotFound("board"))?;
        board.name = name.to_string();
        Ok(board.clone())
    }

    async fn delete(&self, board_id: Uuid) -> RepoResult<()> {
        let mut state = self.state.write().await;

        if state.boards.remove(&board_id).is_none() {
            return Err(RepoError::NotFound("board"));
        }

        let column_ids: Vec<Uuid> = state
            .columns
            .values()
            .filter(|c| c.board_id == board_id)
            .map(|c| c.id)
            .collect();
        for column_id in column_ids {
            state.drop_tasks_of(column_id);
            state.columns.remove(&column_id);
        }
        state.members.retain(|(b, _), _| *b != board_id);

        Ok(())
    }
}

#[async_trait]
impl ColumnRepository for MemoryStore {
    async fn create(&self, data: CreateColumn) -> RepoResult<Column> {
        let mut state = self.state.write().await;

        if !state.boards.contains_key(&data.board_id) {
            return Err(RepoError::NotFound("board"));
        }

        let position = ordering::append_position(state.column_count(data.board_id))?;
        let column = Column {
            id: Uuid::new_v4(),
            board_id: data.board_id,
            title: data.title,
            position,
            created_at: Utc::now(),
        };
        state.columns.insert(column.id, column.clone());

        Ok(column)
    }

    async fn get_by_board_id(&self, board_id: Uuid) -> RepoResult<Vec<Column>> {
        let state = self.state.read().await;

        let mut columns: Vec<Column> = state
            .columns
            .values()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        columns.sort_by_key(|c| c.position);

        Ok(columns)
    }

    async fn get_by_id(&self, column_id: Uuid) -> RepoResult<Column> {
        let state = self.state.read().await;
        state
            .columns
            .get(&column_id)
            .cloned()
            .ok_or(RepoError::NotFound("column"))
    }

    async fn update(&self, column_id: Uuid, title: &str) -> RepoResult<Column> {
        let mut state = self.state.write().await;
        let column = state
            .columns
            .get_mut(&column_id)
            .ok_or(RepoError::NotFound("column"))?;
        column.title = title.to_string();
        Ok(column.clone())
    }

    async fn delete(&self, column_id: Uuid) -> RepoResult<()> {
        let mut state = self.state.write().await;

        let column = state
            .columns
            .remove(&column_id)
            .ok_or(RepoError::NotFound("column"))?;
        state.drop_tasks_of(column_id);

        let shift = ordering::plan_remove(column.position);
        let moved = ordering::apply_shift(
            state
                .columns
                .values_mut()
                .filter(|c| c.board_id == column.board_id),
            &shift,
        );
        tracing::debug!(column_id = %column_id, moved, "Closed column gap");

        Ok(())
    }

    async fn move_to(&self, column_id: Uuid, position: Position) -> RepoResult<Column> {
        let mut state = self.state.write().await;

        let (board_id, current) = state
            .columns
            .get(&column_id)
            .map(|c| (c.board_id, c.position))
            .ok_or(RepoError::NotFound("column"))?;
        let count = state.column_count(board_id);

        match ordering::plan_move(current, position, count)? {
            MovePlan::Unchanged => {}
            MovePlan::Reorder { shift, target } => {
                ordering::apply_shift(
                    state
                        .columns
                        .values_mut()
                        .filter(|c| c.board_id == board_id && c.id != column_id),
                    &shift,
                );
                if let Some(column) = state.columns.get_mut(&column_id) {
                    column.position = target;
                }
            }
        }

        state
            .columns
            .get(&column_id)
            .cloned()
            .ok_or(RepoError::NotFound("column"))
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create(&self, data: CreateTask) -> RepoResult<Task> {
        let mut state = self.state.write().await;

        if !state.columns.contains_key(&data.column_id) {
            return Err(RepoError::NotFound("column"));
        }

        let position = ordering::append_position(state.task_count(data.column_id))?;
        let task = Task {
            id: Uuid::new_v4(),
            column_id: data.column_id,
            title: data.title,
            description: data.description,
            position,
            created_at: Utc::now(),
        };
        state.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn get_by_column_id(&self, column_id: Uuid) -> RepoResult<Vec<Task>> {
        let state = self.state.read().await;

        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.column_id == column_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.position);

        Ok(tasks)
    }

    async fn get_by_id(&self, task_id: Uuid) -> RepoResult<Task> {
        let state = self.state.read().await;
        state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(RepoError::NotFound("task"))
    }

    async fn update(&self, task_id: Uuid, data: UpdateTask) -> RepoResult<Task> {
        let mut state = self.state.write().await;
        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(RepoError::NotFound("task"))?;
        task.title = data.title;
        task.description = data.description;
        Ok(task.clone())
    }

    async fn delete(&self, task_id: Uuid) -> RepoResult<()> {
        let mut state = self.state.write().await;

        let task = state
            .tasks
            .remove(&task_id)
            .ok_or(RepoError::NotFound("task"))?;

        let shift = ordering::plan_remove(task.position);
        ordering::apply_shift(
            state
                .tasks
                .values_mut()
                .filter(|t| t.column_id == task.column_id),
            &shift,
        );

        Ok(())
    }

    async fn move_to(
        &self,
        task_id: Uuid,
        column_id: Uuid,
        position: Position,
    ) -> RepoResult<Task> {
        let mut state = self.state.write().await;

        let (source_id, current) = state
            .tasks
            .get(&task_id)
            .map(|t| (t.column_id, t.position))
            .ok_or(RepoError::NotFound("task"))?;
        let destination_board = state
            .columns
            .get(&column_id)
            .map(|c| c.board_id)
            .ok_or(RepoError::NotFound("column"))?;
        if state.columns.get(&source_id).map(|c| c.board_id) != Some(destination_board) {
            return Err(RepoError::InvalidMove(
                "tasks can only move between columns of the same board".to_string(),
            ));
        }

        if source_id == column_id {
            let count = state.task_count(column_id);
            match ordering::plan_move(current, position, count)? {
                MovePlan::Unchanged => {}
                MovePlan::Reorder { shift, target } => {
                    ordering::apply_shift(
                        state
                            .tasks
                            .values_mut()
                            .filter(|t| t.column_id == column_id && t.id != task_id),
                        &shift,
                    );
                    if let Some(task) = state.tasks.get_mut(&task_id) {
                        task.position = target;
                    }
                }
            }
        } else {
            // Validate against the destination before touching either column
            let insert = ordering::plan_insert(position, state.task_count(column_id))?;
            let remove = ordering::plan_remove(current);

            ordering::apply_shift(
                state
                    .tasks
                    .values_mut()
                    .filter(|t| t.column_id == source_id && t.id != task_id),
                &remove,
            );
            ordering::apply_shift(
                state
                    .tasks
                    .values_mut()
                    .filter(|t| t.column_id == column_id),
                &insert,
            );
            if let Some(task) = state.tasks.get_mut(&task_id) {
                task.column_id = column_id;
                task.position = position;
            }
            tracing::debug!(
                task_id = %task_id,
                from = %source_id,
                to = %column_id,
                position,
                "Moved task across columns"
            );
        }

        state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(RepoError::NotFound("task"))
    }
}

#[async_trait]
impl BoardMemberRepository for MemoryStore {
    async fn add(&self, data: CreateBoardMember) -> RepoResult<BoardMember> {
        let mut state = self.state.write().await;

        if !state.boards.contains_key(&data.board_id) {
            return Err(RepoError::NotFound("board"));
        }
        if !state.users.contains_key(&data.user_id) {
            return Err(RepoError::NotFound("user"));
        }
        if state.members.contains_key(&(data.board_id, data.user_id)) {
            return Err(RepoError::Conflict(
                "user is already a member of this board".to_string(),
            ));
        }
        if data.role == BoardRole::Owner
            && state
                .members
                .values()
                .any(|m| m.board_id == data.board_id && m.role == BoardRole::Owner)
        {
            return Err(RepoError::Conflict("board already has an owner".to_string()));
        }

        let member = BoardMember {
            board_id: data.board_id,
            user_id: data.user_id,
            role: data.role,
            created_at: Utc::now(),
        };
        state
            .members
            .insert((member.board_id, member.user_id), member.clone());

        Ok(member)
    }

    async fn get_role(&self, board_id: Uuid, user_id: Uuid) -> RepoResult<Option<BoardRole>> {
        let state = self.state.read().await;
        Ok(state.members.get(&(board_id, user_id)).map(|m| m.role))
    }

    async fn is_member(&self, board_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let state = self.state.read().await;
        Ok(state.members.contains_key(&(board_id, user_id)))
    }

    async fn remove(&self, board_id: Uuid, user_id: Uuid) -> RepoResult<()> {
        let mut state = self.state.write().await;
        state
            .members
            .remove(&(board_id, user_id))
            .map(|_| ())
            .ok_or(RepoError::NotFound("membership"))
    }

    async fn get_members(&self, board_id: Uuid) -> RepoResult<Vec<BoardMember>> {
        let state = self.state.read().await;

        let mut members: Vec<BoardMember> = state
            .members
            .values()
            .filter(|m| m.board_id == board_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.user_id.cmp(&b.user_id))
        });

        Ok(members)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, data: CreateUser) -> RepoResult<User> {
        let mut state = self.state.write().await;

        let email = normalize_email(&data.email);
        if state.users.values().any(|u| u.email == email) {
            return Err(RepoError::Conflict("email already registered".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: data.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<User> {
        let state = self.state.read().await;
        let email = normalize_email(email);
        state
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepoError::NotFound("user"))
    }
}
