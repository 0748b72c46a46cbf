//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The API error type and its HTTP mapping
//! - Authentication (session token validation)

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{SqlxPostRepository, SqlxUserRepository};
use crate::db::DynDatabasePool;
use crate::services::{
    PostService, PostServiceError, SuggestionService, TokenError, TokenService, UserService,
    UserServiceError,
};

/// Header carrying the session token
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub token_service: Arc<TokenService>,
    pub suggestion_service: Arc<SuggestionService>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> anyhow::Result<Self> {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let post_repo = SqlxPostRepository::boxed(pool);

        Ok(Self {
            user_service: Arc::new(UserService::new(user_repo)),
            post_service: Arc::new(PostService::new(post_repo)),
            token_service: Arc::new(TokenService::from_config(&config.auth)?),
            suggestion_service: Arc::new(SuggestionService::new(config.ai.clone())?),
        })
    }
}

/// Identity of the caller, set by [`require_auth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("No token, authorization denied"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn duplicate_email(message: impl Into<String>) -> Self {
        Self::new("DUPLICATE_EMAIL", message)
    }

    pub fn invalid_credentials() -> Self {
        Self::new("INVALID_CREDENTIALS", "Invalid Credentials")
    }

    /// Log an unexpected failure and hide its details from the caller
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("{:#}", err);
        Self::new("SERVER_ERROR", "Server Error")
    }

    /// HTTP status for this error's code
    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" | "INVALID_CREDENTIALS" => StatusCode::BAD_REQUEST,
            "DUPLICATE_EMAIL" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::DuplicateEmail(_) => Self::duplicate_email("User already exists"),
            UserServiceError::InvalidCredentials => Self::invalid_credentials(),
            UserServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<PostServiceError> for ApiError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::ValidationError(msg) => Self::validation_error(msg),
            PostServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation_error(rejection.body_text())
    }
}

/// Extract the session token from request headers.
///
/// `x-auth-token` wins; `Authorization: Bearer` is accepted as a fallback.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let from_custom = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty());

    from_custom.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

/// Authentication middleware
///
/// Rejects the request with 401 before it reaches the handler unless it
/// carries a valid, unexpired token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("No token, authorization denied"))?;

    let user_id = state.token_service.verify(token).map_err(|e| {
        match e {
            TokenError::Expired => tracing::debug!("Rejected expired token"),
            TokenError::Invalid => tracing::debug!("Rejected invalid token"),
        }
        ApiError::unauthorized("Token is not valid")
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });
    Ok(next.run(request).await)
}

// ============================================================================
// Tests
// ============================================================================
