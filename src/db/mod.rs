//! Database layer
//!
//! This module provides database abstraction for DevConnect. It supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The database driver is selected based on configuration.
//!
//! # Usage
//!
//! ```ignore
//! use devconnect::config::DatabaseConfig;
//! use devconnect::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

/// Whether an error chain bottoms out in a database UNIQUE constraint violation.
///
/// Repositories wrap sqlx errors with `anyhow` context, so the original
/// `sqlx::Error` is recovered by downcasting.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}
