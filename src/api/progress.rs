use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::progress::{BadgeResponse, ProgressResponse};
use crate::services::badges::Badge;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(my_progress)).route("/badges", get(badge_catalog))
}

async fn my_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = repositories::progress::find_by_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load progress"))?;

    let response = match progress {
        Some(progress) => ProgressResponse::from_db(progress),
        None => ProgressResponse::empty(user.id, primitive_now_utc()),
    };

    Ok(Json(response))
}

async fn badge_catalog(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<BadgeResponse>>, ApiError> {
    let held = repositories::progress::find_by_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load progress"))?
        .map(|progress| progress.badges.0)
        .unwrap_or_default();

    let catalog = Badge::ALL
        .into_iter()
        .map(|badge| BadgeResponse {
            id: badge.id().to_string(),
            name: badge.name().to_string(),
            description: badge.description().to_string(),
            icon: badge.icon().to_string(),
            earned: held.iter().any(|id| id == badge.id()),
        })
        .collect();

    Ok(Json(catalog))
}
