//! Database plumbing for the Postgres backend
//!
//! - `pool`: connection pool construction, health check and statistics
//! - `migrations`: embedded schema migrations and database create/drop
//!
//! Row-level queries live with their models in [`crate::models`].

pub mod migrations;
pub mod pool;
