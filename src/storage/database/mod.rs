//! Database storage implementation using SeaORM
//!
//! Accounts and the call audit trail. SQLite by default, Postgres behind
//! the `postgres` feature.

/// Database entities module
pub mod entities;
/// Database migration module
pub mod migration;
/// SeaORM database implementation module
pub mod seaorm_db;

// Re-export the main database interface
pub use seaorm_db::DatabaseBackendType;
pub use seaorm_db::SeaOrmDatabase as Database;
