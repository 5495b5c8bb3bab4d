use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::assignment::{AssignmentCreate, AssignmentResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assignments))
        .route("/:assignment_id", get(get_assignment).put(upsert_assignment))
}

async fn list_assignments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    let published_only = user.role != UserRole::Admin;

    let assignments = repositories::assignments::list(state.db(), published_only)
        .await
        .map_err(|e| ApiError::database(e, "Failed to list assignments"))?;

    Ok(Json(assignments.into_iter().map(AssignmentResponse::from_db).collect()))
}

async fn get_assignment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(assignment_id): Path<String>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let assignment = repositories::assignments::find_by_id(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load assignment"))?
        .ok_or_else(|| ApiError::NotFound(format!("Assignment {assignment_id} not found")))?;

    // Unpublished assignments read as absent for students.
    if !assignment.is_published && user.role != UserRole::Admin {
        return Err(ApiError::NotFound(format!("Assignment {assignment_id} not found")));
    }

    Ok(Json(AssignmentResponse::from_db(assignment)))
}

async fn upsert_assignment(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(assignment_id): Path<String>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let due_date = to_primitive_utc(payload.due_date);
    let requirements = serde_json::json!(payload.requirements);

    let existing = repositories::assignments::find_by_id(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load assignment"))?;

    let assignment = match existing {
        Some(_) => repositories::assignments::update(
            state.db(),
            &assignment_id,
            repositories::assignments::UpdateAssignment {
                week_number: Some(payload.week_number),
                title: Some(payload.title),
                description: Some(payload.description),
                requirements: Some(requirements),
                due_date: Some(due_date),
                is_published: Some(payload.is_published),
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::database(e, "Failed to update assignment"))?
        .ok_or_else(|| ApiError::NotFound(format!("Assignment {assignment_id} not found")))?,
        None => repositories::assignments::create(
            state.db(),
            repositories::assignments::CreateAssignment {
                id: &assignment_id,
                week_number: payload.week_number,
                title: &payload.title,
                description: &payload.description,
                requirements,
                due_date,
                is_published: payload.is_published,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::database(e, "Failed to create assignment"))?,
    };

    Ok(Json(AssignmentResponse::from_db(assignment)))
}
