//! Authentication API endpoints
//!
//! - POST /api/auth/register - Create an account and return a token
//! - POST /api/auth/login - Exchange credentials for a token
//! - GET /api/auth - Current user (requires auth)

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{AuthResponse, UserResponse};
use crate::models::{CreateUserInput, User};

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/auth", get(current_user))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(body) = payload?;

    let input = CreateUserInput {
        name: body.name,
        email: body.email,
        password: body.password,
        bio: body.bio.unwrap_or_default(),
        avatar_url: body.avatar_url,
    };

    let user = state.user_service.register(input).await?;
    issue_token(&state, user).map(Json)
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(body) = payload?;

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::validation_error("Email and password are required"));
    }

    let user = state
        .user_service
        .authenticate(&body.email, &body.password)
        .await?;
    issue_token(&state, user).map(Json)
}

/// GET /api/auth
///
/// A valid token for a user that no longer exists is treated as unauthorized.
async fn current_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .get_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Token is not valid"))?;

    Ok(Json(user.into()))
}

fn issue_token(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let token = state
        .token_service
        .issue(user.id)
        .map_err(ApiError::internal)?;

    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}
