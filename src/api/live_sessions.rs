use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::LiveSession;
use crate::repositories;
use crate::schemas::live_session::{
    AttendanceUpdate, LiveSessionCreate, LiveSessionResponse, LiveSessionUpdate,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions).post(create_session))
        .route("/:session_id", axum::routing::patch(update_session).delete(delete_session))
        .route("/:session_id/register", post(register))
        .route("/:session_id/unregister", post(unregister))
        .route("/:session_id/attendance", post(record_attendance))
}

async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<LiveSessionResponse>>, ApiError> {
    let sessions = repositories::live_sessions::list(state.db())
        .await
        .map_err(|e| ApiError::database(e, "Failed to list live sessions"))?;

    Ok(Json(
        sessions
            .into_iter()
            .map(|session| LiveSessionResponse::from_db(session, &user.id))
            .collect(),
    ))
}

async fn create_session(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<LiveSessionCreate>,
) -> Result<(StatusCode, Json<LiveSessionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let session = repositories::live_sessions::create(
        state.db(),
        repositories::live_sessions::CreateLiveSession {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            description: &payload.description,
            scheduled_at: to_primitive_utc(payload.scheduled_at),
            duration_minutes: payload.duration_minutes,
            meeting_url: payload.meeting_url.as_deref(),
            created_by: &admin.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::database(e, "Failed to create live session"))?;

    Ok((StatusCode::CREATED, Json(LiveSessionResponse::from_db(session, &admin.id))))
}

async fn update_session(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(session_id): Path<String>,
    Json(payload): Json<LiveSessionUpdate>,
) -> Result<Json<LiveSessionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let session = repositories::live_sessions::update(
        state.db(),
        &session_id,
        repositories::live_sessions::UpdateLiveSession {
            title: payload.title,
            description: payload.description,
            scheduled_at: payload.scheduled_at.map(to_primitive_utc),
            duration_minutes: payload.duration_minutes,
            meeting_url: payload.meeting_url,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::database(e, "Failed to update live session"))?
    .ok_or_else(|| ApiError::NotFound(format!("Live session {session_id} not found")))?;

    Ok(Json(LiveSessionResponse::from_db(session, &admin.id)))
}

async fn delete_session(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::live_sessions::delete(state.db(), &session_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to delete live session"))?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Live session {session_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn register(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<Json<LiveSessionResponse>, ApiError> {
    let session = update_registration(&state, &session_id, &user.id, true).await?;
    Ok(Json(LiveSessionResponse::from_db(session, &user.id)))
}

async fn unregister(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<Json<LiveSessionResponse>, ApiError> {
    let session = update_registration(&state, &session_id, &user.id, false).await?;
    Ok(Json(LiveSessionResponse::from_db(session, &user.id)))
}

/// Adds or removes the student under a row lock. Re-registering and
/// un-registering while absent are both no-ops.
async fn update_registration(
    state: &AppState,
    session_id: &str,
    student_id: &str,
    join: bool,
) -> Result<LiveSession, ApiError> {
    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::database(e, "Failed to open transaction"))?;

    let mut session = repositories::live_sessions::lock(&mut *tx, session_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load live session"))?
        .ok_or_else(|| ApiError::NotFound(format!("Live session {session_id} not found")))?;

    let mut roster = session.registered_students.0;
    let present = roster.iter().any(|id| id == student_id);
    let changed = if join && !present {
        roster.push(student_id.to_string());
        true
    } else if !join && present {
        roster.retain(|id| id != student_id);
        true
    } else {
        false
    };

    if changed {
        repositories::live_sessions::set_registered(
            &mut *tx,
            session_id,
            serde_json::json!(roster),
            now,
        )
        .await
        .map_err(|e| ApiError::database(e, "Failed to update registration"))?;
    }
    tx.commit().await.map_err(|e| ApiError::database(e, "Failed to commit registration"))?;

    session.registered_students = SqlJson(roster);
    Ok(session)
}

async fn record_attendance(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(session_id): Path<String>,
    Json(payload): Json<AttendanceUpdate>,
) -> Result<Json<LiveSessionResponse>, ApiError> {
    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::database(e, "Failed to open transaction"))?;

    let mut session = repositories::live_sessions::lock(&mut *tx, &session_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load live session"))?
        .ok_or_else(|| ApiError::NotFound(format!("Live session {session_id} not found")))?;

    let mut attended: Vec<String> = Vec::with_capacity(payload.attended_student_ids.len());
    for id in payload.attended_student_ids {
        if !attended.contains(&id) {
            attended.push(id);
        }
    }

    repositories::live_sessions::set_attended(&mut *tx, &session_id, serde_json::json!(attended), now)
        .await
        .map_err(|e| ApiError::database(e, "Failed to record attendance"))?;
    tx.commit().await.map_err(|e| ApiError::database(e, "Failed to commit attendance"))?;

    session.attended_students = SqlJson(attended);
    Ok(Json(LiveSessionResponse::from_db(session, &admin.id)))
}
