//! Post model
//!
//! A post row only stores its author's id. Feed reads attach a
//! [`PostAuthor`] snapshot joined from the users table at query time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub content: String,
    /// Immutable author reference
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Public fields of a post's author, read at query time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub id: i64,
    pub name: String,
    pub bio: String,
    pub avatar_url: Option<String>,
}

/// A post enriched with its author's public fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: PostAuthor,
}
