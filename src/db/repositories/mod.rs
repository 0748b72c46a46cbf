//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a specific entity.

pub mod post;
pub mod user;

pub use post::{PostRepository, SqlxPostRepository};
pub use user::{SqlxUserRepository, UserRepository};

use anyhow::{Context, Result};
use sqlx::{MySqlPool, SqlitePool};

use crate::db::DynDatabasePool;

fn sqlite_pool(pool: &DynDatabasePool) -> Result<&SqlitePool> {
    pool.as_sqlite().context("Database pool is not SQLite")
}

fn mysql_pool(pool: &DynDatabasePool) -> Result<&MySqlPool> {
    pool.as_mysql().context("Database pool is not MySQL")
}
