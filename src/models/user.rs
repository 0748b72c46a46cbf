//! User model
//!
//! Defines the User entity and the input used to create one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address (unique, login key)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Free-form profile text
    pub bio: String,
    /// Profile picture URL
    pub avatar_url: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// Note: The password should already be hashed before calling this function.
    /// Use `services::password::hash_password()` to hash the password.
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        bio: String,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            email,
            password_hash,
            bio,
            avatar_url,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone, Default)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    pub bio: String,
    pub avatar_url: Option<String>,
}

impl CreateUserInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        bio: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            bio: bio.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}
