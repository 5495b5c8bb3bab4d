use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::video::{ImportSummary, VideoResponse, WatchResponse};
use crate::services::gamification;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos))
        .route("/:video_id/watch", post(watch_video))
}

/// Routes under the `/youtube` prefix rather than `/videos`.
pub(crate) fn youtube_router() -> Router<AppState> {
    Router::new().route("/import", post(import_from_youtube))
}

async fn list_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<VideoResponse>>, ApiError> {
    let videos = repositories::videos::list(state.db())
        .await
        .map_err(|e| ApiError::database(e, "Failed to list videos"))?;

    let watched: HashSet<String> = repositories::progress::find_by_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load progress"))?
        .map(|progress| {
            progress.videos_watched.0.into_iter().map(|record| record.video_id).collect()
        })
        .unwrap_or_default();

    Ok(Json(
        videos
            .into_iter()
            .map(|video| {
                let seen = watched.contains(&video.id);
                VideoResponse::from_db(video, seen)
            })
            .collect(),
    ))
}

async fn watch_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<WatchResponse>, ApiError> {
    repositories::videos::find_by_id(state.db(), &video_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load video"))?
        .ok_or_else(|| ApiError::NotFound(format!("Video {video_id} not found")))?;

    let outcome = gamification::record_video_watch(&state, &user.id, &video_id, primitive_now_utc())
        .await
        .map_err(|e| match e {
            gamification::GamificationError::Database(db) => {
                ApiError::database(db, "Failed to record watch")
            }
            other => ApiError::internal(other, "Failed to record watch"),
        })?;

    Ok(Json(WatchResponse {
        recorded: outcome.recorded,
        new_badges: outcome.new_badges.iter().map(|badge| badge.id().to_string()).collect(),
    }))
}

async fn import_from_youtube(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<ImportSummary>, ApiError> {
    if !state.youtube().is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "YouTube import is not configured".to_string(),
        ));
    }

    let remote = state
        .youtube()
        .fetch_channel_uploads()
        .await
        .map_err(|e| ApiError::BadGateway(format!("YouTube API request failed: {e:#}")))?;

    let existing: HashSet<String> = repositories::videos::existing_youtube_ids(state.db())
        .await
        .map_err(|e| ApiError::database(e, "Failed to list imported videos"))?
        .into_iter()
        .collect();
    let mut position = repositories::videos::max_position(state.db())
        .await
        .map_err(|e| ApiError::database(e, "Failed to read video positions"))?
        .unwrap_or(0);

    let now = primitive_now_utc();
    let mut imported = 0usize;
    let mut skipped = 0usize;
    for video in remote {
        if existing.contains(&video.youtube_id) {
            skipped += 1;
            continue;
        }
        position += 1;
        let created = repositories::videos::create(
            state.db(),
            repositories::videos::CreateVideo {
                id: &Uuid::new_v4().to_string(),
                youtube_id: &video.youtube_id,
                title: &video.title,
                description: &video.description,
                thumbnail_url: video.thumbnail_url.as_deref(),
                published_at: video.published_at,
                position,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::database(e, "Failed to store video"))?;
        if created {
            imported += 1;
        } else {
            skipped += 1;
        }
    }

    tracing::info!(imported, skipped, "YouTube import finished");

    Ok(Json(ImportSummary { imported, skipped }))
}
