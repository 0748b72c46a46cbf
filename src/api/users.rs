//! User profile endpoints
//!
//! - GET /api/users/{id} - Public profile (requires auth)

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::UserResponse;

/// Build protected user routes
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/users/{id}", get(get_user))
}

/// GET /api/users/{id}
///
/// Ids that are not integers cannot name a user, so they are a 404 too.
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::not_found("User not found"))?;

    let user = state
        .user_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user.into()))
}
