//! Post API endpoints
//!
//! - GET /api/posts - Feed, newest first
//! - POST /api/posts - Create a post as the authenticated user
//! - GET /api/posts/user/{id} - One author's posts, newest first
//!
//! All routes require auth.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::FeedPost;

/// Request body for creating a post
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub content: String,
}

/// Build protected post routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/user/{id}", get(list_user_posts))
}

/// GET /api/posts
async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<FeedPost>>, ApiError> {
    Ok(Json(state.post_service.list_all().await?))
}

/// POST /api/posts
///
/// The author is always the authenticated caller; any author field in the
/// body is ignored. A valid token for a user that no longer exists is
/// treated as unauthorized.
async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<Json<FeedPost>, ApiError> {
    let Json(body) = payload?;

    if state.user_service.get_by_id(auth.user_id).await?.is_none() {
        return Err(ApiError::unauthorized("Token is not valid"));
    }

    let post = state
        .post_service
        .create(auth.user_id, &body.content)
        .await?;
    Ok(Json(post))
}

/// GET /api/posts/user/{id}
async fn list_user_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FeedPost>>, ApiError> {
    let Ok(author_id) = id.parse::<i64>() else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(state.post_service.list_by_author(author_id).await?))
}
