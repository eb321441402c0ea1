//! # Kanban Core
//!
//! Ordering and access-control core of a multi-user Kanban service. Boards
//! hold ordered columns, columns hold ordered tasks, and every board-scoped
//! operation is gated by the acting user's membership role.
//!
//! ## Module Organization
//!
//! - `ordering`: dense position arithmetic shared by columns and tasks
//! - `auth`: membership resolution and role checks
//! - `models`: domain entities and their row-level Postgres queries
//! - `repository`: storage contracts with memory and Postgres backends
//! - `services`: board, column and task operations
//! - `db`: connection pool and migrations
//! - `config`: environment configuration
//! - `error`: error types and the mapping between layers

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ordering;
pub mod repository;
pub mod services;

pub use error::{ErrorKind, KanbanError, KanbanResult};
pub use services::Kanban;

/// Current version of the kanban core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
