//! Domain services
//!
//! The services are the core's public operations. Each method takes the
//! pre-authenticated acting user first, then target ids and payload, and
//! returns `Result<T, KanbanError>`.
//!
//! Every method follows the same sequence, and the first failing step decides
//! the error:
//!
//! 1. validate input (no storage access)
//! 2. load the target entity (NotFound)
//! 3. check the acting user's role on the board reached from that entity
//!    (Forbidden)
//! 4. mutate through the repository, whose atomic unit applies any position
//!    changes
//!
//! # Example
//!
//! ```
//! use kanban_core::services::Kanban;
//! use kanban_core::models::CreateUser;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), kanban_core::error::KanbanError> {
//! let kanban = Kanban::in_memory();
//! let user = kanban
//!     .repositories()
//!     .users
//!     .create(CreateUser {
//!         email: "ada@example.com".to_string(),
//!         password_hash: "argon2-hash".to_string(),
//!     })
//!     .await?;
//!
//! let board = kanban.boards.create(user.id, "Launch").await?;
//! let todo = kanban.columns.create(user.id, board.id, "Todo").await?;
//! let task = kanban.tasks.create(user.id, todo.id, "Write notes", None).await?;
//! assert_eq!(task.position, 0);
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod column;
pub mod task;

pub use board::BoardService;
pub use column::ColumnService;
pub use task::TaskService;

use crate::auth::AuthorizationGate;
use crate::config::{Config, StorageBackend};
use crate::db::pool::create_pool;
use crate::error::{KanbanError, KanbanResult};
use crate::repository::memory::MemoryStore;
use crate::repository::postgres::PgStore;
use crate::repository::Repositories;

/// Trims `value` and rejects it if nothing is left
pub(crate) fn required_text(field: &str, value: &str) -> KanbanResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(KanbanError::invalid_input(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional free-text field; blank becomes None
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// All three services over one set of repositories
#[derive(Clone)]
pub struct Kanban {
    pub boards: BoardService,
    pub columns: ColumnService,
    pub tasks: TaskService,
    repositories: Repositories,
}

impl Kanban {
    pub fn new(repositories: Repositories) -> Self {
        let gate = AuthorizationGate::new(repositories.members.clone());

        Self {
            boards: BoardService::new(repositories.clone(), gate.clone()),
            columns: ColumnService::new(repositories.clone(), gate.clone()),
            tasks: TaskService::new(repositories.clone(), gate),
            repositories,
        }
    }

    /// Services over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Repositories::from_store(MemoryStore::new()))
    }

    /// Services over the backend selected in `config`
    ///
    /// For Postgres this connects the pool; it does not run migrations.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let repositories = match config.storage {
            StorageBackend::Memory => Repositories::from_store(MemoryStore::new()),
            StorageBackend::Postgres => {
                let pool = create_pool(&config.database).await?;
                Repositories::from_store(PgStore::with_lock_timeout(pool, config.lock_timeout))
            }
        };

        tracing::info!(storage = %config.storage, "Kanban services ready");
        Ok(Self::new(repositories))
    }

    /// The repositories behind the services, for identity-layer use
    /// (creating users) and for tooling
    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text("title", "  Todo ").unwrap(), "Todo");
    }

    #[test]
    fn test_required_text_rejects_blank() {
        let err = required_text("title", " \t ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("   ".to_string())), None);
        assert_eq!(
            optional_text(Some(" details ".to_string())),
            Some("details".to_string())
        );
    }

    #[tokio::test]
    async fn test_from_config_memory() {
        let kanban = Kanban::from_config(&Config::default()).await.unwrap();
        let boards = kanban.boards.get_all(uuid::Uuid::new_v4()).await.unwrap();
        assert!(boards.is_empty());
    }
}
