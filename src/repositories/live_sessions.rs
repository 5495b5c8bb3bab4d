use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::LiveSession;

const COLUMNS: &str = "\
    id, title, description, scheduled_at, duration_minutes, meeting_url, \
    registered_students, attended_students, created_by, created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<LiveSession>, sqlx::Error> {
    sqlx::query_as::<_, LiveSession>(&format!("SELECT {COLUMNS} FROM live_sessions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<LiveSession>, sqlx::Error> {
    sqlx::query_as::<_, LiveSession>(&format!(
        "SELECT {COLUMNS} FROM live_sessions ORDER BY scheduled_at"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateLiveSession<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub scheduled_at: time::PrimitiveDateTime,
    pub duration_minutes: i32,
    pub meeting_url: Option<&'a str>,
    pub created_by: &'a str,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateLiveSession<'_>,
) -> Result<LiveSession, sqlx::Error> {
    sqlx::query_as::<_, LiveSession>(&format!(
        "INSERT INTO live_sessions (
            id, title, description, scheduled_at, duration_minutes, meeting_url,
            created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.scheduled_at)
    .bind(params.duration_minutes)
    .bind(params.meeting_url)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateLiveSession {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: Option<time::PrimitiveDateTime>,
    pub duration_minutes: Option<i32>,
    pub meeting_url: Option<String>,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateLiveSession,
) -> Result<Option<LiveSession>, sqlx::Error> {
    sqlx::query_as::<_, LiveSession>(&format!(
        "UPDATE live_sessions SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            scheduled_at = COALESCE($3, scheduled_at),
            duration_minutes = COALESCE($4, duration_minutes),
            meeting_url = COALESCE($5, meeting_url),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.scheduled_at)
    .bind(params.duration_minutes)
    .bind(params.meeting_url)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM live_sessions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Reads the row under `FOR UPDATE` so roster edits never lose writes.
pub(crate) async fn lock(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<LiveSession>, sqlx::Error> {
    sqlx::query_as::<_, LiveSession>(&format!(
        "SELECT {COLUMNS} FROM live_sessions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn set_registered(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    registered_students: serde_json::Value,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE live_sessions SET registered_students = $1, updated_at = $2 WHERE id = $3")
        .bind(registered_students)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn set_attended(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    attended_students: serde_json::Value,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE live_sessions SET attended_students = $1, updated_at = $2 WHERE id = $3")
        .bind(attended_students)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
