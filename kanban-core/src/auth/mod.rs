//! Authorization for board operations
//!
//! Identity is established upstream; the core receives a pre-authenticated
//! `acting_user_id` and only decides what that user may do.
//!
//! # Modules
//!
//! - [`authorization`]: membership resolution and role checks

pub mod authorization;

pub use authorization::{Access, AuthorizationGate, AuthzError, BoardPermission};
