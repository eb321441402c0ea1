//! Domain models
//!
//! Each model carries its row type, its creation input and the row-level
//! Postgres queries for it. Ordering and authorization rules live above this
//! layer (see [`crate::ordering`], [`crate::auth`] and [`crate::repository`]).
//!
//! # Models
//!
//! - `board`: top-level container
//! - `column`: ordered container of tasks within a board
//! - `task`: ordered work item within a column
//! - `board_member`: user-board relationship with a role
//! - `user`: identity referenced by memberships

pub mod board;
pub mod board_member;
pub mod column;
pub mod task;
pub mod user;

pub use board::{Board, CreateBoard};
pub use board_member::{BoardMember, BoardRole, CreateBoardMember};
pub use column::{Column, CreateColumn};
pub use task::{CreateTask, Task, UpdateTask};
pub use user::{CreateUser, User};
