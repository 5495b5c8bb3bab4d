use sqlx::PgPool;

use crate::db::models::Assignment;

const COLUMNS: &str = "\
    id, week_number, title, description, requirements, due_date, is_published, \
    created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list(pool: &PgPool, published_only: bool) -> Result<Vec<Assignment>, sqlx::Error> {
    if published_only {
        sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {COLUMNS} FROM assignments WHERE is_published ORDER BY week_number"
        ))
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {COLUMNS} FROM assignments ORDER BY week_number"
        ))
        .fetch_all(pool)
        .await
    }
}

pub(crate) async fn existing_week_numbers(pool: &PgPool) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT week_number FROM assignments ORDER BY week_number")
        .fetch_all(pool)
        .await
}

pub(crate) struct CreateAssignment<'a> {
    pub id: &'a str,
    pub week_number: i32,
    pub title: &'a str,
    pub description: &'a str,
    pub requirements: serde_json::Value,
    pub due_date: time::PrimitiveDateTime,
    pub is_published: bool,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (
            id, week_number, title, description, requirements, due_date, is_published,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.week_number)
    .bind(params.title)
    .bind(params.description)
    .bind(params.requirements)
    .bind(params.due_date)
    .bind(params.is_published)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateAssignment {
    pub week_number: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<serde_json::Value>,
    pub due_date: Option<time::PrimitiveDateTime>,
    pub is_published: Option<bool>,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAssignment,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "UPDATE assignments SET
            week_number = COALESCE($1, week_number),
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            requirements = COALESCE($4, requirements),
            due_date = COALESCE($5, due_date),
            is_published = COALESCE($6, is_published),
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.week_number)
    .bind(params.title)
    .bind(params.description)
    .bind(params.requirements)
    .bind(params.due_date)
    .bind(params.is_published)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assignments")
        .fetch_one(pool)
        .await
}
