// crates/store/src/lib.rs
//! SQLite persistence for FleetSync
//!
//! Owns the local mirror of the remote fleet data: connection pooling,
//! schema migrations, and per-entity query modules.

pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::{connect, connect_in_memory, DatabaseConfig, DbPool};
pub use migrations::{run_migrations, verify_integrity, CURRENT_VERSION};
