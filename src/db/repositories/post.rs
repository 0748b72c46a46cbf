//! Post repository
//!
//! Posts are append-only. Every read joins the author's public fields so
//! feed entries always reflect the author's current profile.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{FeedPost, Post, PostAuthor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::{mysql_pool, sqlite_pool};

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post and return it with its author attached
    async fn create(&self, author_id: i64, content: &str) -> Result<FeedPost>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<FeedPost>>;

    /// List every post, newest first
    async fn list_all(&self) -> Result<Vec<FeedPost>>;

    /// List posts by one author, newest first
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<FeedPost>>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, author_id: i64, content: &str) -> Result<FeedPost> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                insert_post_sqlite(sqlite_pool(&self.pool)?, author_id, content).await?
            }
            DatabaseDriver::Mysql => {
                insert_post_mysql(mysql_pool(&self.pool)?, author_id, content).await?
            }
        };

        self.get_by_id(id)
            .await?
            .with_context(|| format!("Post {} missing after insert", id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<FeedPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_post_by_id_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_post_by_id_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn list_all(&self) -> Result<Vec<FeedPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_posts_sqlite(sqlite_pool(&self.pool)?, None).await,
            DatabaseDriver::Mysql => list_posts_mysql(mysql_pool(&self.pool)?, None).await,
        }
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<FeedPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_posts_sqlite(sqlite_pool(&self.pool)?, Some(author_id)).await
            }
            DatabaseDriver::Mysql => {
                list_posts_mysql(mysql_pool(&self.pool)?, Some(author_id)).await
            }
        }
    }
}

const FEED_SELECT: &str = r#"
    SELECT p.id, p.content, p.author_id, p.created_at,
           u.name AS author_name, u.bio AS author_bio, u.avatar_url AS author_avatar_url
    FROM posts p
    INNER JOIN users u ON u.id = p.author_id
"#;

const FEED_ORDER: &str = "ORDER BY p.created_at DESC, p.id DESC";

fn list_query(author_id: Option<i64>) -> String {
    match author_id {
        Some(_) => format!("{FEED_SELECT} WHERE p.author_id = ? {FEED_ORDER}"),
        None => format!("{FEED_SELECT} {FEED_ORDER}"),
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn insert_post_sqlite(pool: &SqlitePool, author_id: i64, content: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO posts (content, author_id, created_at) VALUES (?, ?, ?)")
        .bind(content)
        .bind(author_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create post")?;

    Ok(result.last_insert_rowid())
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<FeedPost>> {
    let row = sqlx::query(&format!("{FEED_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    row.map(|row| row_to_feed_post_sqlite(&row)).transpose()
}

async fn list_posts_sqlite(pool: &SqlitePool, author_id: Option<i64>) -> Result<Vec<FeedPost>> {
    let sql = list_query(author_id);
    let mut query = sqlx::query(&sql);
    if let Some(author_id) = author_id {
        query = query.bind(author_id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_feed_post_sqlite).collect()
}

fn row_to_feed_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<FeedPost> {
    let author_id: i64 = row.try_get("author_id")?;
    Ok(FeedPost {
        post: Post {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            author_id,
            created_at: row.try_get("created_at")?,
        },
        author: PostAuthor {
            id: author_id,
            name: row.try_get("author_name")?,
            bio: row.try_get("author_bio")?,
            avatar_url: row.try_get("author_avatar_url")?,
        },
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn insert_post_mysql(pool: &MySqlPool, author_id: i64, content: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO posts (content, author_id, created_at) VALUES (?, ?, ?)")
        .bind(content)
        .bind(author_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create post")?;

    i64::try_from(result.last_insert_id()).context("Post id out of range")
}

async fn get_post_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<FeedPost>> {
    let row = sqlx::query(&format!("{FEED_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    row.map(|row| row_to_feed_post_mysql(&row)).transpose()
}

async fn list_posts_mysql(pool: &MySqlPool, author_id: Option<i64>) -> Result<Vec<FeedPost>> {
    let sql = list_query(author_id);
    let mut query = sqlx::query(&sql);
    if let Some(author_id) = author_id {
        query = query.bind(author_id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_feed_post_mysql).collect()
}

fn row_to_feed_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<FeedPost> {
    let author_id: i64 = row.try_get("author_id")?;
    Ok(FeedPost {
        post: Post {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            author_id,
            created_at: row.try_get("created_at")?,
        },
        author: PostAuthor {
            id: author_id,
            name: row.try_get("author_name")?,
            bio: row.try_get("author_bio")?,
            avatar_url: row.try_get("author_avatar_url")?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (SqlxPostRepository, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxPostRepository::new(pool.clone()),
            SqlxUserRepository::new(pool),
        )
    }

    async fn create_author(users: &SqlxUserRepository, name: &str, email: &str) -> User {
        let user = User::new(
            name.to_string(),
            email.to_string(),
            "hash".to_string(),
            format!("{} bio", name),
            None,
        );
        users.create(&user).await.expect("Failed to create user")
    }

    #[tokio::test]
    async fn test_create_post_attaches_author() {
        let (posts, users) = setup().await;
        let author = create_author(&users, "Ada", "ada@example.com").await;

        let created = posts
            .create(author.id, "Hello, feed")
            .await
            .expect("Failed to create post");

        assert!(created.post.id > 0);
        assert_eq!(created.post.content, "Hello, feed");
        assert_eq!(created.post.author_id, author.id);
        assert_eq!(created.author.name, "Ada");
        assert_eq!(created.author.bio, "Ada bio");
    }

    #[tokio::test]
    async fn test_create_post_unknown_author_fails() {
        let (posts, _users) = setup().await;
        assert!(posts.create(404, "orphan").await.is_err());
        assert!(posts.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let (posts, users) = setup().await;
        let author = create_author(&users, "Ada", "ada@example.com").await;

        let p1 = posts.create(author.id, "first").await.unwrap();
        let p2 = posts.create(author.id, "second").await.unwrap();
        let p3 = posts.create(author.id, "third").await.unwrap();

        let ids: Vec<i64> = posts
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|p| p.post.id)
            .collect();
        assert_eq!(ids, vec![p3.post.id, p2.post.id, p1.post.id]);
    }

    #[tokio::test]
    async fn test_list_by_author_filters() {
        let (posts, users) = setup().await;
        let ada = create_author(&users, "Ada", "ada@example.com").await;
        let grace = create_author(&users, "Grace", "grace@example.com").await;

        posts.create(ada.id, "ada 1").await.unwrap();
        posts.create(grace.id, "grace 1").await.unwrap();
        posts.create(ada.id, "ada 2").await.unwrap();

        let ada_posts = posts.list_by_author(ada.id).await.unwrap();
        let contents: Vec<&str> = ada_posts.iter().map(|p| p.post.content.as_str()).collect();
        assert_eq!(contents, vec!["ada 2", "ada 1"]);
        assert!(ada_posts.iter().all(|p| p.author.name == "Ada"));

        assert!(posts.list_by_author(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let (posts, _users) = setup().await;
        assert!(posts.get_by_id(1).await.unwrap().is_none());
    }
}
