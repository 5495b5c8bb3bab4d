use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;

const COLUMNS: &str = "\
    id, student_id, assignment_id, status, content, files, submitted_at, \
    ai_feedback, instructor_feedback, reviewed_by, reviewed_at, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!("SELECT {COLUMNS} FROM submissions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!("SELECT {COLUMNS} FROM submissions WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
    assignment_id: Option<&str>,
) -> Result<Vec<Submission>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM submissions WHERE student_id = "
    ));
    builder.push_bind(student_id);

    if let Some(assignment_id) = assignment_id {
        builder.push(" AND assignment_id = ");
        builder.push_bind(assignment_id);
    }

    builder.push(" ORDER BY submitted_at DESC");

    builder.build_query_as::<Submission>().fetch_all(pool).await
}

pub(crate) struct CreateSubmission<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub assignment_id: &'a str,
    pub status: SubmissionStatus,
    pub content: &'a str,
    pub files: serde_json::Value,
    pub submitted_at: time::PrimitiveDateTime,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (
            id, student_id, assignment_id, status, content, files, submitted_at,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.assignment_id)
    .bind(params.status)
    .bind(params.content)
    .bind(params.files)
    .bind(params.submitted_at)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_ai_feedback(
    pool: &PgPool,
    id: &str,
    feedback: serde_json::Value,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE submissions SET ai_feedback = $1, updated_at = $2 WHERE id = $3")
        .bind(Json(feedback))
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn review(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    status: SubmissionStatus,
    instructor_feedback: Option<String>,
    reviewed_by: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE submissions
         SET status = $1,
             instructor_feedback = COALESCE($2, instructor_feedback),
             reviewed_by = $3,
             reviewed_at = $4,
             updated_at = $4
         WHERE id = $5",
    )
    .bind(status)
    .bind(instructor_feedback)
    .bind(reviewed_by)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Submissions still waiting on generated feedback, oldest first.
pub(crate) async fn list_missing_feedback(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions \
         WHERE ai_feedback IS NULL \
         ORDER BY submitted_at LIMIT $1"
    ))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

/// One row of the instructor review queue: the submission joined with the
/// student account and the assignment it answers.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReviewQueueRow {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) assignment_id: String,
    pub(crate) assignment_title: String,
    pub(crate) week_number: i32,
    pub(crate) status: SubmissionStatus,
    pub(crate) content: String,
    pub(crate) files: Json<serde_json::Value>,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) ai_feedback: Option<Json<serde_json::Value>>,
}

pub(crate) async fn list_review_queue(
    pool: &PgPool,
    status: Option<SubmissionStatus>,
) -> Result<Vec<ReviewQueueRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT s.id,
                s.student_id,
                u.display_name AS student_name,
                u.email AS student_email,
                s.assignment_id,
                a.title AS assignment_title,
                a.week_number,
                s.status,
                s.content,
                s.files,
                s.submitted_at,
                s.ai_feedback
         FROM submissions s
         JOIN users u ON u.id = s.student_id
         JOIN assignments a ON a.id = s.assignment_id",
    );

    if let Some(status) = status {
        builder.push(" WHERE s.status = ");
        builder.push_bind(status);
    }

    builder.push(" ORDER BY s.submitted_at");

    builder
        .build_query_as::<ReviewQueueRow>()
        .fetch_all(pool)
        .await
}

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
        .fetch_one(pool)
        .await
}

pub(crate) async fn count_by_status(
    pool: &PgPool,
    status: SubmissionStatus,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE status = $1")
        .bind(status)
        .fetch_one(pool)
        .await
}
