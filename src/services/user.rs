//! User service
//!
//! Credential store for DevConnect accounts:
//! - Registration with validation and Argon2id password hashing
//! - Credential checks for login
//! - Lookup by id and by email
//!
//! Emails are trimmed and lower-cased before they are stored or looked up,
//! so `Ada@Example.com` and `ada@example.com` name the same account.

use crate::db::is_unique_violation;
use crate::db::repositories::UserRepository;
use crate::models::{CreateUserInput, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Validation error (invalid input)
    #[error("{0}")]
    ValidationError(String),

    /// Email already registered
    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for registration and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    /// Create a new user service with the given repository
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `ValidationError` if name, email or password is empty, or the email is malformed
    /// - `DuplicateEmail` if the email is already registered
    /// - `InternalError` for database errors
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let input = validate_register_input(input)?;

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::DuplicateEmail(input.email));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(
            input.name,
            input.email,
            password_hash,
            input.bio,
            input.avatar_url,
        );

        match self.user_repo.create(&user).await {
            Ok(created) => {
                tracing::info!(user_id = created.id, "Registered new user");
                Ok(created)
            }
            // Lost a race with a concurrent registration of the same email
            Err(e) if is_unique_violation(&e) => Err(UserServiceError::DuplicateEmail(user.email)),
            Err(e) => Err(e.context("Failed to create user").into()),
        }
    }

    /// Check an email/password pair.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(&normalize_email(email))
            .await
            .context("Failed to look up user")?
            .ok_or(UserServiceError::InvalidCredentials)?;

        let password_valid =
            verify_password(password, &user.password_hash).context("Failed to verify password")?;

        if !password_valid {
            tracing::debug!(user_id = user.id, "Rejected login with wrong password");
            return Err(UserServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(&normalize_email(email))
            .await
            .context("Failed to get user by email")?;
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;
        Ok(user)
    }
}

/// Canonical form of an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal `local@domain` shape check
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn validate_register_input(input: CreateUserInput) -> Result<CreateUserInput, UserServiceError> {
    let name = input.name.trim().to_string();
    let email = normalize_email(&input.email);

    if name.is_empty() {
        return Err(UserServiceError::ValidationError(
            "Name is required".to_string(),
        ));
    }
    if email.is_empty() {
        return Err(UserServiceError::ValidationError(
            "Email is required".to_string(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(UserServiceError::ValidationError(
            "Please include a valid email".to_string(),
        ));
    }
    if input.password.is_empty() {
        return Err(UserServiceError::ValidationError(
            "Password is required".to_string(),
        ));
    }

    let avatar_url = input
        .avatar_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    Ok(CreateUserInput {
        name,
        email,
        password: input.password,
        bio: input.bio,
        avatar_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> (UserService, Arc<dyn UserRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool);
        (UserService::new(user_repo.clone()), user_repo)
    }

    // ========================================================================
    // Registration tests
    // ========================================================================

    #[tokio::test]
    async fn test_register_user() {
        let (service, _) = setup_test_service().await;

        let input = CreateUserInput::new("Ada", "ada@example.com", "password123", "Analyst");
        let user = service.register(input).await.expect("Failed to register");

        assert!(user.id > 0);
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.bio, "Analyst");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_ne!(user.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_name() {
        let (service, _) = setup_test_service().await;

        let input = CreateUserInput::new("  Ada  ", "  Ada@Example.COM ", "password123", "")
            .with_avatar("https://img.example/ada.png");
        let user = service.register(input).await.unwrap();

        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.avatar_url.as_deref(), Some("https://img.example/ada.png"));
    }

    #[tokio::test]
    async fn test_register_blank_avatar_is_none() {
        let (service, _) = setup_test_service().await;

        let input = CreateUserInput::new("Ada", "ada@example.com", "password123", "").with_avatar("  ");
        let user = service.register(input).await.unwrap();
        assert!(user.avatar_url.is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails() {
        let (service, repo) = setup_test_service().await;

        let first = service
            .register(CreateUserInput::new("First", "same@example.com", "password123", "one"))
            .await
            .expect("Failed to register first user");

        let result = service
            .register(CreateUserInput::new("Second", "SAME@example.com", "other", "two"))
            .await;
        assert!(matches!(result, Err(UserServiceError::DuplicateEmail(_))));

        // First record unchanged
        let stored = repo.get_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "First");
        assert_eq!(stored.bio, "one");
        assert!(verify_password("password123", &stored.password_hash).unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (service, repo) = setup_test_service().await;

        let cases = [
            CreateUserInput::new("", "a@example.com", "pw", ""),
            CreateUserInput::new("   ", "a@example.com", "pw", ""),
            CreateUserInput::new("Ada", "", "pw", ""),
            CreateUserInput::new("Ada", "not-an-email", "pw", ""),
            CreateUserInput::new("Ada", "@example.com", "pw", ""),
            CreateUserInput::new("Ada", "ada@", "pw", ""),
            CreateUserInput::new("Ada", "a b@example.com", "pw", ""),
            CreateUserInput::new("Ada", "a@example.com", "", ""),
        ];

        for input in cases {
            let result = service.register(input.clone()).await;
            assert!(
                matches!(result, Err(UserServiceError::ValidationError(_))),
                "expected validation error for {:?}",
                input
            );
        }
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    // ========================================================================
    // Authentication tests
    // ========================================================================

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let (service, _) = setup_test_service().await;

        let registered = service
            .register(CreateUserInput::new("Ada", "ada@example.com", "password123", ""))
            .await
            .unwrap();

        let user = service
            .authenticate("ADA@example.com ", "password123")
            .await
            .expect("Authentication should succeed");
        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let (service, repo) = setup_test_service().await;
        service
            .register(CreateUserInput::new("Ada", "ada@example.com", "password123", ""))
            .await
            .unwrap();

        let result = service.authenticate("ada@example.com", "wrong").await;
        assert!(matches!(result, Err(UserServiceError::InvalidCredentials)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let (service, repo) = setup_test_service().await;

        let result = service.authenticate("nobody@example.com", "password123").await;
        assert!(matches!(result, Err(UserServiceError::InvalidCredentials)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_the_same() {
        let (service, _) = setup_test_service().await;
        service
            .register(CreateUserInput::new("Ada", "ada@example.com", "password123", ""))
            .await
            .unwrap();

        let wrong_password = service
            .authenticate("ada@example.com", "nope")
            .await
            .unwrap_err()
            .to_string();
        let unknown_email = service
            .authenticate("ghost@example.com", "nope")
            .await
            .unwrap_err()
            .to_string();
        assert_eq!(wrong_password, unknown_email);
    }

    // ========================================================================
    // Lookup tests
    // ========================================================================

    #[tokio::test]
    async fn test_find_by_email_and_id() {
        let (service, _) = setup_test_service().await;
        let registered = service
            .register(CreateUserInput::new("Ada", "ada@example.com", "password123", ""))
            .await
            .unwrap();

        let by_email = service.find_by_email("Ada@Example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, registered.id);

        let by_id = service.get_by_id(registered.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");

        assert!(service.get_by_id(registered.id + 1).await.unwrap().is_none());
        assert!(service.find_by_email("ghost@example.com").await.unwrap().is_none());
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b"));
        assert!(is_valid_email("ada.lovelace@example.co.uk"));
        assert!(!is_valid_email("ada"));
        assert!(!is_valid_email("a@b@c"));
        assert!(!is_valid_email("@b"));
        assert!(!is_valid_email("a@"));
    }
}
