//! Data models
//!
//! Database entities and the inputs used to create them:
//! - `User` / `CreateUserInput`
//! - `Post`, plus the read-time `FeedPost` with its `PostAuthor` snapshot

mod post;
mod user;

pub use post::{FeedPost, Post, PostAuthor};
pub use user::{CreateUserInput, User};
