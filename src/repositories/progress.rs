use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Progress;

const COLUMNS: &str = "\
    student_id, total_points, current_streak, last_activity_at, assignments_completed, \
    videos_watched, badges, forum_stats, created_at, updated_at";

pub(crate) async fn find_by_student(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Option<Progress>, sqlx::Error> {
    sqlx::query_as::<_, Progress>(&format!(
        "SELECT {COLUMNS} FROM progress WHERE student_id = $1"
    ))
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

/// Inserts a zeroed counter row for the student unless one already exists.
pub(crate) async fn create_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO progress (student_id, last_activity_at, created_at, updated_at)
         VALUES ($1, $2, $2, $2)
         ON CONFLICT (student_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Reads the row under `FOR UPDATE`. Callers run inside a transaction and
/// insert the row first, so a miss is a hard error.
pub(crate) async fn lock(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
) -> Result<Progress, sqlx::Error> {
    sqlx::query_as::<_, Progress>(&format!(
        "SELECT {COLUMNS} FROM progress WHERE student_id = $1 FOR UPDATE"
    ))
    .bind(student_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn apply_award(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    total_points: i64,
    assignments_completed: serde_json::Value,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE progress
         SET total_points = $1,
             assignments_completed = $2,
             last_activity_at = $3,
             updated_at = $3
         WHERE student_id = $4",
    )
    .bind(total_points)
    .bind(assignments_completed)
    .bind(now)
    .bind(student_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn set_badges(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    badges: serde_json::Value,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE progress SET badges = $1, updated_at = $2 WHERE student_id = $3")
        .bind(badges)
        .bind(now)
        .bind(student_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn record_watches(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    videos_watched: serde_json::Value,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE progress
         SET videos_watched = $1,
             last_activity_at = $2,
             updated_at = $2
         WHERE student_id = $3",
    )
    .bind(videos_watched)
    .bind(now)
    .bind(student_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn set_streak(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    current_streak: i32,
    total_points: i64,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE progress
         SET current_streak = $1,
             total_points = $2,
             updated_at = $3
         WHERE student_id = $4",
    )
    .bind(current_streak)
    .bind(total_points)
    .bind(now)
    .bind(student_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn touch_activity(
    pool: &PgPool,
    student_id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE progress SET last_activity_at = $1, updated_at = $1 WHERE student_id = $2",
    )
    .bind(now)
    .bind(student_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Progress>, sqlx::Error> {
    sqlx::query_as::<_, Progress>(&format!(
        "SELECT {COLUMNS} FROM progress ORDER BY student_id"
    ))
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProgressTotals {
    pub(crate) points_awarded: i64,
    pub(crate) active_students: i64,
}

pub(crate) async fn totals(
    pool: &PgPool,
    active_since: PrimitiveDateTime,
) -> Result<ProgressTotals, sqlx::Error> {
    sqlx::query_as::<_, ProgressTotals>(
        "SELECT COALESCE(SUM(total_points), 0)::bigint AS points_awarded,
                COUNT(*) FILTER (WHERE last_activity_at >= $1) AS active_students
         FROM progress",
    )
    .bind(active_since)
    .fetch_one(pool)
    .await
}
