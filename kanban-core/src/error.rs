//! Error types for the Kanban core
//!
//! Two layers:
//!
//! - [`RepoError`]: what a repository backend reports. It separates "row not
//!   found" from constraint conflicts, retryable transaction conflicts and
//!   plain internal failures.
//! - [`KanbanError`]: what a domain service returns to its caller. Every
//!   variant belongs to exactly one [`ErrorKind`], and the `From` impls below
//!   are the full mapping table between the layers.
//!
//! Storage details never leave the core: an internal repository failure is
//! logged here and replaced with a generic message.
//!
//! # Example
//!
//! ```
//! use kanban_core::error::{ErrorKind, KanbanError};
//!
//! let err = KanbanError::forbidden("viewers cannot edit columns");
//! assert_eq!(err.kind(), ErrorKind::Forbidden);
//! assert_eq!(err.kind().code(), "forbidden");
//! ```

use crate::auth::authorization::AuthzError;
use crate::ordering::OrderingError;
use std::fmt;

/// Repository result type alias
pub type RepoResult<T> = Result<T, RepoError>;

/// Service result type alias
pub type KanbanResult<T> = Result<T, KanbanError>;

/// SQLSTATE codes the Postgres backend classifies explicitly
mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const SERIALIZATION_FAILURE: &str = "40001";
    pub const DEADLOCK_DETECTED: &str = "40P01";
    pub const LOCK_NOT_AVAILABLE: &str = "55P03";
}

/// Failure reported by a repository operation
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Referenced row does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique constraint violated (e.g. duplicate membership or email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The atomic unit lost a race (lock timeout, deadlock, serialization
    /// failure). Nothing was applied; the caller may retry.
    #[error("transaction conflict: {0}")]
    TransactionConflict(String),

    /// No connection became free in time. Nothing was applied; the caller
    /// may retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Move rejected by a structural rule, such as crossing boards
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// Requested position rejected against the live sibling count
    #[error(transparent)]
    Ordering(#[from] OrderingError),

    /// Anything else the backend could not attribute to the caller
    #[error("internal storage error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row"),
            sqlx::Error::PoolTimedOut => {
                RepoError::Unavailable("timed out acquiring a connection".to_string())
            }
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(sqlstate::UNIQUE_VIOLATION) => {
                    tracing::warn!(
                        constraint = db_err.constraint().unwrap_or("unknown"),
                        "Unique constraint violated"
                    );
                    RepoError::Conflict("value already exists".to_string())
                }
                Some(sqlstate::FOREIGN_KEY_VIOLATION) => RepoError::NotFound("referenced row"),
                Some(
                    sqlstate::SERIALIZATION_FAILURE
                    | sqlstate::DEADLOCK_DETECTED
                    | sqlstate::LOCK_NOT_AVAILABLE,
                ) => RepoError::TransactionConflict(db_err.message().to_string()),
                _ => RepoError::Internal(format!("database error: {}", db_err)),
            },
            other => RepoError::Internal(format!("database error: {}", other)),
        }
    }
}

/// Closed set of caller-visible failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing/empty field, bad position, disallowed value
    InvalidInput,

    /// Referenced board, column, task or user does not exist
    NotFound,

    /// Not a member, or role too low for the operation
    Forbidden,

    /// Duplicate unique value or lost concurrent race
    Conflict,

    /// Storage failure not attributable to the caller
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code for the kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned by every domain service operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KanbanError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {message}")]
    Conflict { message: String, retryable: bool },

    #[error("internal error: {0}")]
    Internal(String),
}

impl KanbanError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        KanbanError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        KanbanError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        KanbanError::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        KanbanError::Conflict {
            message: message.into(),
            retryable: false,
        }
    }

    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            KanbanError::InvalidInput(_) => ErrorKind::InvalidInput,
            KanbanError::NotFound(_) => ErrorKind::NotFound,
            KanbanError::Forbidden(_) => ErrorKind::Forbidden,
            KanbanError::Conflict { .. } => ErrorKind::Conflict,
            KanbanError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True when the operation was rolled back because of a concurrent writer
    /// and may succeed if the caller repeats it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KanbanError::Conflict { retryable: true, .. })
    }
}

impl From<RepoError> for KanbanError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => KanbanError::NotFound(format!("{} not found", what)),
            RepoError::Conflict(msg) => KanbanError::Conflict {
                message: msg,
                retryable: false,
            },
            RepoError::TransactionConflict(msg) => {
                tracing::warn!(reason = %msg, "Concurrent modification rolled back");
                KanbanError::Conflict {
                    message: "concurrent modification, retry the operation".to_string(),
                    retryable: true,
                }
            }
            RepoError::Unavailable(msg) => {
                tracing::warn!(reason = %msg, "Storage unavailable");
                KanbanError::Conflict {
                    message: "storage busy, retry the operation".to_string(),
                    retryable: true,
                }
            }
            RepoError::InvalidMove(msg) => KanbanError::InvalidInput(msg),
            RepoError::Ordering(err) => KanbanError::InvalidInput(err.to_string()),
            RepoError::Internal(msg) => {
                // Log the detail, hand the caller nothing storage specific
                tracing::error!("Internal repository error: {}", msg);
                KanbanError::Internal("an internal error occurred".to_string())
            }
        }
    }
}

impl From<OrderingError> for KanbanError {
    fn from(err: OrderingError) -> Self {
        KanbanError::InvalidInput(err.to_string())
    }
}

impl From<AuthzError> for KanbanError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => {
                KanbanError::Forbidden("not a member of this board".to_string())
            }
            AuthzError::InsufficientRole { required, actual } => KanbanError::Forbidden(format!(
                "requires {} role, has {}",
                required.as_str(),
                actual.as_str()
            )),
            AuthzError::Repository(err) => err.into(),
        }
    }
}
