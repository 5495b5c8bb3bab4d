use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::{self, UploadCandidate};
use crate::core::config::Settings;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::StoredFile;
use crate::db::types::{SubmissionStatus, UserRole};
use crate::repositories;
use crate::schemas::submission::{ReviewRequest, ReviewResponse, SubmissionResponse};
use crate::services::{ai_feedback, gamification};

pub(crate) fn router(settings: &Settings) -> Router<AppState> {
    // Multipart framing and text fields ride on top of the file budget, so
    // the transport limit sits a little above the validated maximum.
    let body_limit = (settings.uploads().max_total_size_mb as usize + 8) * 1024 * 1024;

    Router::new()
        .route("/", post(create_submission))
        .route("/my", get(my_submissions))
        .route("/:submission_id", get(get_submission))
        .route("/:submission_id/review", post(review_submission))
        .route("/:submission_id/feedback", post(regenerate_feedback))
        .layer(DefaultBodyLimit::max(body_limit))
}

async fn create_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let mut assignment_id: Option<String> = None;
    let mut content = String::new();
    let mut files: Vec<UploadCandidate> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "assignmentId" | "assignment_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest("Invalid assignment id".to_string()))?;
                assignment_id = Some(text);
            }
            "content" => {
                content = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest("Invalid content field".to_string()))?;
            }
            "files" | "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BadRequest(format!("Failed to read file {filename}")))?;
                files.push(UploadCandidate { filename, content_type, bytes: bytes.to_vec() });
            }
            _ => {}
        }
    }

    let assignment_id = assignment_id
        .ok_or_else(|| ApiError::BadRequest("assignmentId is required".to_string()))?;
    let content = content.trim().to_string();
    if content.is_empty() && files.is_empty() {
        return Err(ApiError::BadRequest(
            "A submission needs text content or at least one file".to_string(),
        ));
    }

    // Unpublished assignments read as absent, same as the detail endpoint.
    let assignment = repositories::assignments::find_by_id(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load assignment"))?
        .filter(|assignment| assignment.is_published)
        .ok_or_else(|| ApiError::NotFound(format!("Assignment {assignment_id} not found")))?;

    validation::validate_upload_batch(&files, state.settings())?;

    let mut stored: Vec<StoredFile> = Vec::with_capacity(files.len());
    for candidate in files {
        let key = match state.storage() {
            Some(storage) => storage
                .store_upload(
                    &user.id,
                    &candidate.filename,
                    &candidate.content_type,
                    &candidate.bytes,
                )
                .await
                .map_err(|e| ApiError::internal(e, "Failed to store uploaded file"))?,
            // Without object storage the descriptor still records where the
            // bytes would land, and the submission goes through.
            None => crate::services::storage::upload_key(
                &user.id,
                &candidate.filename,
                &candidate.bytes,
            ),
        };
        stored.push(StoredFile {
            filename: candidate.filename,
            key,
            size: candidate.bytes.len() as i64,
            mime_type: candidate.content_type,
        });
    }

    let now = primitive_now_utc();
    let submission = repositories::submissions::create(
        state.db(),
        repositories::submissions::CreateSubmission {
            id: &Uuid::new_v4().to_string(),
            student_id: &user.id,
            assignment_id: &assignment.id,
            status: SubmissionStatus::Submitted,
            content: &content,
            files: serde_json::json!(stored),
            submitted_at: now,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::database(e, "Failed to create submission"))?;

    // Feedback generation happens off the request path; failures are logged
    // and picked up later by the backfill sweep.
    let spawned_state = state.clone();
    let spawned = submission.clone();
    tokio::spawn(async move {
        if let Err(error) = ai_feedback::generate_for_submission(&spawned_state, &spawned).await {
            tracing::error!(
                submission_id = %spawned.id,
                error = %error,
                "Background feedback generation failed"
            );
        }
    });

    tracing::info!(
        submission_id = %submission.id,
        student_id = %user.id,
        assignment_id = %assignment.id,
        "Submission received"
    );

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from_db(submission))))
}

#[derive(Debug, Deserialize)]
struct MySubmissionsQuery {
    #[serde(default)]
    #[serde(alias = "assignmentId")]
    assignment_id: Option<String>,
}

async fn my_submissions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MySubmissionsQuery>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let submissions = repositories::submissions::list_by_student(
        state.db(),
        &user.id,
        query.assignment_id.as_deref(),
    )
    .await
    .map_err(|e| ApiError::database(e, "Failed to list submissions"))?;

    Ok(Json(submissions.into_iter().map(SubmissionResponse::from_db).collect()))
}

async fn get_submission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(submission_id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = repositories::submissions::find_by_id(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load submission"))?
        .ok_or_else(|| ApiError::NotFound(format!("Submission {submission_id} not found")))?;

    if submission.student_id != user.id && user.role != UserRole::Admin {
        return Err(ApiError::Unauthorized("Access denied"));
    }

    Ok(Json(SubmissionResponse::from_db(submission)))
}

async fn review_submission(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(submission_id): Path<String>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.status == SubmissionStatus::Submitted {
        return Err(ApiError::BadRequest(
            "Review status must be approved or needs_revision".to_string(),
        ));
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::database(e, "Failed to open transaction"))?;

    let existing = repositories::submissions::find_by_id(&mut *tx, &submission_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load submission"))?
        .ok_or_else(|| ApiError::NotFound(format!("Submission {submission_id} not found")))?;

    repositories::submissions::review(
        &mut *tx,
        &submission_id,
        payload.status,
        payload.instructor_feedback,
        &admin.id,
        now,
    )
    .await
    .map_err(|e| ApiError::database(e, "Failed to record review"))?;

    let (points_awarded, total_points, new_badges) = if payload.status == SubmissionStatus::Approved
    {
        let award = gamification::calculate_points(&mut tx, &submission_id, state.points(), now)
            .await
            .map_err(award_error)?;
        let badges = gamification::check_badges(&mut tx, &existing.student_id, now)
            .await
            .map_err(award_error)?;
        (
            award.awarded,
            Some(award.new_total),
            badges.iter().map(|badge| badge.id().to_string()).collect(),
        )
    } else {
        (0, None, Vec::new())
    };

    tx.commit().await.map_err(|e| ApiError::database(e, "Failed to commit review"))?;

    tracing::info!(
        submission_id = %submission_id,
        reviewer_id = %admin.id,
        status = ?payload.status,
        points_awarded,
        "Submission reviewed"
    );

    let submission = repositories::submissions::fetch_one_by_id(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to reload submission"))?;

    Ok(Json(ReviewResponse {
        submission: SubmissionResponse::from_db(submission),
        points_awarded,
        total_points,
        new_badges,
    }))
}

async fn regenerate_feedback(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(submission_id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = repositories::submissions::find_by_id(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load submission"))?
        .ok_or_else(|| ApiError::NotFound(format!("Submission {submission_id} not found")))?;

    ai_feedback::generate_for_submission(&state, &submission)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to generate feedback"))?;

    let refreshed = repositories::submissions::fetch_one_by_id(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to reload submission"))?;

    Ok(Json(SubmissionResponse::from_db(refreshed)))
}

fn award_error(error: gamification::GamificationError) -> ApiError {
    match error {
        gamification::GamificationError::SubmissionNotFound
        | gamification::GamificationError::AssignmentNotFound => {
            ApiError::NotFound(error.to_string())
        }
        gamification::GamificationError::NotApproved => ApiError::BadRequest(error.to_string()),
        gamification::GamificationError::Database(e) => {
            ApiError::database(e, "Gamification update failed")
        }
    }
}
