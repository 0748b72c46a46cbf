//! Post suggestion endpoint
//!
//! - POST /api/ai/suggest - Suggest post text for a draft (requires auth)
//!
//! Always answers 200; upstream failures come back as fallback text.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::SuggestionResponse;

/// Request body for a suggestion
#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    #[serde(default)]
    pub draft: String,
}

/// Build protected suggestion routes
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/ai/suggest", post(suggest))
}

/// POST /api/ai/suggest
async fn suggest(
    State(state): State<AppState>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestionResponse>, ApiError> {
    let Json(body) = payload?;
    let suggestion = state.suggestion_service.suggest(&body.draft).await;
    Ok(Json(SuggestionResponse { suggestion }))
}
