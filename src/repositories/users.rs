use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::{SubmissionStatus, UserRole};

const COLUMNS: &str = "\
    id, email, display_name, role, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, display_name, role, is_active, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.display_name)
    .bind(params.role)
    .bind(params.is_active)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateUser {
    pub display_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(pool: &PgPool, id: &str, params: UpdateUser) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET
            display_name = COALESCE($1, display_name),
            role = COALESCE($2, role),
            is_active = COALESCE($3, is_active),
            updated_at = $4
         WHERE id = $5",
    )
    .bind(params.display_name)
    .bind(params.role)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn set_role(
    pool: &PgPool,
    id: &str,
    role: UserRole,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role = $1, updated_at = $2 WHERE id = $3")
        .bind(role)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn count_by_role(pool: &PgPool, role: UserRole) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
        .bind(role)
        .fetch_one(pool)
        .await
}

/// One row of the back-office roster: account fields joined with the
/// student's progress counters and submission totals.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StudentOverview {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) display_name: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) total_points: Option<i64>,
    pub(crate) current_streak: Option<i32>,
    pub(crate) last_activity_at: Option<PrimitiveDateTime>,
    pub(crate) badge_count: Option<i32>,
    pub(crate) submission_count: i64,
    pub(crate) approved_count: i64,
}

pub(crate) async fn list_student_overviews(
    pool: &PgPool,
) -> Result<Vec<StudentOverview>, sqlx::Error> {
    sqlx::query_as::<_, StudentOverview>(
        "SELECT u.id,
                u.email,
                u.display_name,
                u.is_active,
                u.created_at,
                p.total_points,
                p.current_streak,
                p.last_activity_at,
                jsonb_array_length(p.badges) AS badge_count,
                COALESCE(s.total, 0) AS submission_count,
                COALESCE(s.approved, 0) AS approved_count
         FROM users u
         LEFT JOIN progress p ON p.student_id = u.id
         LEFT JOIN (
             SELECT student_id,
                    COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = $1) AS approved
             FROM submissions
             GROUP BY student_id
         ) s ON s.student_id = u.id
         WHERE u.role = $2
         ORDER BY u.created_at",
    )
    .bind(SubmissionStatus::Approved)
    .bind(UserRole::Student)
    .fetch_all(pool)
    .await
}
