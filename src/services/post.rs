//! Post service
//!
//! Append-only feed: posts are created by an authenticated author and read
//! back newest first, either globally or per author.

use crate::db::repositories::PostRepository;
use crate::models::FeedPost;
use anyhow::Context;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Validation error (invalid input)
    #[error("{0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service for the feed
pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
}

impl PostService {
    /// Create a new post service with the given repository
    pub fn new(post_repo: Arc<dyn PostRepository>) -> Self {
        Self { post_repo }
    }

    /// Create a post for an author.
    ///
    /// Content is stored exactly as given, but must contain something other
    /// than whitespace.
    pub async fn create(&self, author_id: i64, content: &str) -> Result<FeedPost, PostServiceError> {
        if content.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "Content is required".to_string(),
            ));
        }

        let post = self
            .post_repo
            .create(author_id, content)
            .await
            .context("Failed to create post")?;

        tracing::debug!(post_id = post.post.id, author_id, "Created post");
        Ok(post)
    }

    /// All posts, newest first
    pub async fn list_all(&self) -> Result<Vec<FeedPost>, PostServiceError> {
        let posts = self.post_repo.list_all().await.context("Failed to list posts")?;
        Ok(posts)
    }

    /// One author's posts, newest first
    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<FeedPost>, PostServiceError> {
        let posts = self
            .post_repo
            .list_by_author(author_id)
            .await
            .context("Failed to list posts by author")?;
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxPostRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateUserInput;
    use crate::services::UserService;

    async fn setup() -> (PostService, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        (
            PostService::new(SqlxPostRepository::boxed(pool.clone())),
            UserService::new(SqlxUserRepository::boxed(pool)),
        )
    }

    async fn register(users: &UserService, name: &str) -> i64 {
        let email = format!("{}@example.com", name.to_lowercase());
        users
            .register(CreateUserInput::new(name, email, "password123", ""))
            .await
            .expect("Failed to register")
            .id
    }

    #[tokio::test]
    async fn test_create_post() {
        let (posts, users) = setup().await;
        let author = register(&users, "Ada").await;

        let post = posts.create(author, "  Shipping it  ").await.unwrap();
        assert_eq!(post.post.author_id, author);
        assert_eq!(post.post.content, "  Shipping it  ");
        assert_eq!(post.author.name, "Ada");
    }

    #[tokio::test]
    async fn test_feed_is_newest_first() {
        let (posts, users) = setup().await;
        let author = register(&users, "Ada").await;

        let p1 = posts.create(author, "P1").await.unwrap();
        let p2 = posts.create(author, "P2").await.unwrap();
        let p3 = posts.create(author, "P3").await.unwrap();

        let feed: Vec<i64> = posts
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.post.id)
            .collect();
        assert_eq!(feed, vec![p3.post.id, p2.post.id, p1.post.id]);
    }

    #[tokio::test]
    async fn test_blank_content_rejected_and_feed_unchanged() {
        let (posts, users) = setup().await;
        let author = register(&users, "Ada").await;
        posts.create(author, "existing").await.unwrap();

        for content in ["", " ", "\n\t  "] {
            let result = posts.create(author, content).await;
            assert!(matches!(result, Err(PostServiceError::ValidationError(_))));
        }

        let feed = posts.list_all().await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].post.content, "existing");
    }

    #[tokio::test]
    async fn test_list_by_author() {
        let (posts, users) = setup().await;
        let ada = register(&users, "Ada").await;
        let grace = register(&users, "Grace").await;

        posts.create(ada, "ada one").await.unwrap();
        posts.create(grace, "grace one").await.unwrap();
        posts.create(ada, "ada two").await.unwrap();

        let ada_posts = posts.list_by_author(ada).await.unwrap();
        assert_eq!(ada_posts.len(), 2);
        assert!(ada_posts.iter().all(|p| p.post.author_id == ada));
        assert_eq!(ada_posts[0].post.content, "ada two");

        let grace_posts = posts.list_by_author(grace).await.unwrap();
        assert_eq!(grace_posts.len(), 1);
        assert_eq!(grace_posts[0].author.name, "Grace");
    }

    #[tokio::test]
    async fn test_list_by_unknown_author_is_empty() {
        let (posts, _) = setup().await;
        assert!(posts.list_by_author(12345).await.unwrap().is_empty());
    }
}
