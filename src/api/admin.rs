use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use time::Duration;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::{SubmissionStatus, UserRole};
use crate::repositories;
use crate::schemas::admin::{
    AdminEmailCreate, AdminEmailResponse, AdminStudentResponse, BackfillSummary,
    PlatformStatsResponse, ProfileResponse, ReviewQueueItem, SeedSummary,
    StudentAccountResponse, StudentDetailResponse,
};
use crate::schemas::progress::ProgressResponse;
use crate::schemas::submission::SubmissionResponse;
use crate::services::ai_feedback;

const ACTIVE_WINDOW_DAYS: i64 = 7;
const BACKFILL_BATCH_LIMIT: i64 = 25;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students))
        .route("/students/:student_id", get(student_details))
        .route("/stats", get(platform_stats))
        .route("/emails", get(list_admin_emails).post(add_admin_email))
        .route("/emails/:email", axum::routing::delete(remove_admin_email))
        .route("/seed-assignments", post(seed_assignments))
        .route("/submissions", get(review_queue))
        .route("/feedback/backfill", post(backfill_feedback))
}

async fn list_students(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<Vec<AdminStudentResponse>>, ApiError> {
    let overviews = repositories::users::list_student_overviews(state.db())
        .await
        .map_err(|e| ApiError::database(e, "Failed to list students"))?;

    Ok(Json(
        overviews
            .into_iter()
            .map(|row| AdminStudentResponse {
                id: row.id,
                email: row.email,
                display_name: row.display_name,
                is_active: row.is_active,
                created_at: format_primitive(row.created_at),
                total_points: row.total_points.unwrap_or(0),
                current_streak: row.current_streak.unwrap_or(0),
                last_activity_at: row.last_activity_at.map(format_primitive),
                badge_count: row.badge_count.unwrap_or(0),
                submission_count: row.submission_count,
                approved_count: row.approved_count,
            })
            .collect(),
    ))
}

async fn student_details(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(student_id): Path<String>,
) -> Result<Json<StudentDetailResponse>, ApiError> {
    let (user, profile, progress, submissions) = tokio::join!(
        repositories::users::find_by_id(state.db(), &student_id),
        repositories::profiles::find_by_user(state.db(), &student_id),
        repositories::progress::find_by_student(state.db(), &student_id),
        repositories::submissions::list_by_student(state.db(), &student_id, None),
    );

    let user = user
        .map_err(|e| ApiError::database(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound(format!("Student {student_id} not found")))?;
    let profile = profile.map_err(|e| ApiError::database(e, "Failed to load profile"))?;
    let progress = progress.map_err(|e| ApiError::database(e, "Failed to load progress"))?;
    let submissions =
        submissions.map_err(|e| ApiError::database(e, "Failed to load submissions"))?;

    let progress = match progress {
        Some(progress) => ProgressResponse::from_db(progress),
        None => ProgressResponse::empty(user.id.clone(), primitive_now_utc()),
    };

    Ok(Json(StudentDetailResponse {
        student: StudentAccountResponse::from_db(user),
        profile: profile.map(ProfileResponse::from_db),
        progress,
        submissions: submissions.into_iter().map(SubmissionResponse::from_db).collect(),
    }))
}

async fn platform_stats(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<PlatformStatsResponse>, ApiError> {
    let active_since = primitive_now_utc() - Duration::days(ACTIVE_WINDOW_DAYS);

    let (students, assignments, submissions, pending, videos, totals) = tokio::join!(
        repositories::users::count_by_role(state.db(), UserRole::Student),
        repositories::assignments::count(state.db()),
        repositories::submissions::count(state.db()),
        repositories::submissions::count_by_status(state.db(), SubmissionStatus::Submitted),
        repositories::videos::count(state.db()),
        repositories::progress::totals(state.db(), active_since),
    );

    let totals = totals.map_err(|e| ApiError::database(e, "Failed to aggregate progress"))?;

    Ok(Json(PlatformStatsResponse {
        total_students: students.map_err(|e| ApiError::database(e, "Failed to count students"))?,
        total_assignments: assignments
            .map_err(|e| ApiError::database(e, "Failed to count assignments"))?,
        total_submissions: submissions
            .map_err(|e| ApiError::database(e, "Failed to count submissions"))?,
        pending_review: pending
            .map_err(|e| ApiError::database(e, "Failed to count pending submissions"))?,
        total_videos: videos.map_err(|e| ApiError::database(e, "Failed to count videos"))?,
        points_awarded: totals.points_awarded,
        active_students: totals.active_students,
    }))
}

async fn list_admin_emails(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<Vec<AdminEmailResponse>>, ApiError> {
    let entries = repositories::admin_emails::list(state.db())
        .await
        .map_err(|e| ApiError::database(e, "Failed to list admin emails"))?;

    Ok(Json(entries.into_iter().map(AdminEmailResponse::from_db).collect()))
}

async fn add_admin_email(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<AdminEmailCreate>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let email = payload.email.trim().to_lowercase();
    let added = repositories::admin_emails::add(state.db(), &email, &admin.id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::database(e, "Failed to add admin email"))?;
    if !added {
        return Err(ApiError::Conflict(format!("{email} is already an admin email")));
    }

    tracing::info!(email = %email, added_by = %admin.id, "Admin email allow-listed");

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "email": email }))))
}

async fn remove_admin_email(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(email): Path<String>,
) -> Result<StatusCode, ApiError> {
    let email = email.trim().to_lowercase();
    let removed = repositories::admin_emails::remove(state.db(), &email)
        .await
        .map_err(|e| ApiError::database(e, "Failed to remove admin email"))?;
    if !removed {
        return Err(ApiError::NotFound(format!("{email} is not an admin email")));
    }
    Ok(StatusCode::NO_CONTENT)
}

struct SeedTemplate {
    week: i32,
    title: &'static str,
    description: &'static str,
    requirements: &'static [&'static str],
}

const SEED_TEMPLATES: [SeedTemplate; 8] = [
    SeedTemplate {
        week: 1,
        title: "HTML & CSS Foundations",
        description: "Build and style a personal profile page from scratch.",
        requirements: &[
            "Semantic HTML structure with header, main and footer",
            "External stylesheet, no inline styles",
            "Responsive layout down to 360px wide",
        ],
    },
    SeedTemplate {
        week: 2,
        title: "JavaScript Fundamentals",
        description: "Add behaviour to the page: an interactive to-do list without frameworks.",
        requirements: &[
            "Add, complete and delete items",
            "State persisted to localStorage",
            "No global variables besides the entry point",
        ],
    },
    SeedTemplate {
        week: 3,
        title: "Working with APIs",
        description: "Fetch data from a public HTTP API and render it with loading and error states.",
        requirements: &[
            "fetch with async/await",
            "Visible loading and error states",
            "At least one user-triggered refetch",
        ],
    },
    SeedTemplate {
        week: 4,
        title: "React Basics",
        description: "Rebuild the gallery from week 3 as a component tree.",
        requirements: &[
            "Function components with props",
            "List rendering with stable keys",
            "One reusable presentational component",
        ],
    },
    SeedTemplate {
        week: 5,
        title: "State & Forms",
        description: "A multi-step signup form with client-side validation.",
        requirements: &[
            "Controlled inputs",
            "Per-field validation messages",
            "State survives navigating between steps",
        ],
    },
    SeedTemplate {
        week: 6,
        title: "Backend Basics",
        description: "A small REST API with persistent storage for the to-do domain.",
        requirements: &[
            "CRUD endpoints returning JSON",
            "Input validation with helpful error messages",
            "Data survives a server restart",
        ],
    },
    SeedTemplate {
        week: 7,
        title: "Full-Stack Integration",
        description: "Connect the week 5 frontend to the week 6 API.",
        requirements: &[
            "Frontend talks only to your own API",
            "Optimistic UI update for at least one action",
            "Errors from the API surface to the user",
        ],
    },
    SeedTemplate {
        week: 8,
        title: "Capstone Project",
        description: "Ship a deployed full-stack application of your own design.",
        requirements: &[
            "Deployed and reachable over HTTPS",
            "README with setup and architecture notes",
            "Authentication or another non-trivial feature",
        ],
    },
];

async fn seed_assignments(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<SeedSummary>, ApiError> {
    let existing = repositories::assignments::existing_week_numbers(state.db())
        .await
        .map_err(|e| ApiError::database(e, "Failed to read existing assignments"))?;

    let now = primitive_now_utc();
    let mut created = Vec::new();
    let mut skipped = Vec::new();
    for template in &SEED_TEMPLATES {
        if existing.contains(&template.week) {
            skipped.push(template.week);
            continue;
        }

        let requirements: Vec<String> =
            template.requirements.iter().map(|req| req.to_string()).collect();
        repositories::assignments::create(
            state.db(),
            repositories::assignments::CreateAssignment {
                id: &format!("week-{}", template.week),
                week_number: template.week,
                title: template.title,
                description: template.description,
                requirements: serde_json::json!(requirements),
                due_date: now + Duration::days(7 * template.week as i64),
                is_published: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::database(e, "Failed to seed assignment"))?;
        created.push(template.week);
    }

    tracing::info!(created = ?created, skipped = ?skipped, "Assignment seed finished");

    Ok(Json(SeedSummary { created, skipped }))
}

#[derive(Debug, Deserialize)]
struct ReviewQueueQuery {
    #[serde(default)]
    status: Option<SubmissionStatus>,
}

async fn review_queue(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<ReviewQueueQuery>,
) -> Result<Json<Vec<ReviewQueueItem>>, ApiError> {
    let rows = repositories::submissions::list_review_queue(state.db(), query.status)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load review queue"))?;

    Ok(Json(
        rows.into_iter()
            .map(|row| ReviewQueueItem {
                id: row.id,
                student_id: row.student_id,
                student_name: row.student_name,
                student_email: row.student_email,
                assignment_id: row.assignment_id,
                assignment_title: row.assignment_title,
                week_number: row.week_number,
                status: row.status,
                content: row.content,
                files: row.files.0,
                submitted_at: format_primitive(row.submitted_at),
                has_ai_feedback: row.ai_feedback.is_some(),
            })
            .collect(),
    ))
}

async fn backfill_feedback(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<BackfillSummary>, ApiError> {
    let outcome = ai_feedback::backfill_missing(&state, BACKFILL_BATCH_LIMIT).await;

    Ok(Json(BackfillSummary { processed: outcome.processed, failed: outcome.failed }))
}
