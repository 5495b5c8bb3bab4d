use sqlx::PgPool;

use crate::db::models::Video;

const COLUMNS: &str = "\
    id, youtube_id, title, description, thumbnail_url, published_at, position, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!("SELECT {COLUMNS} FROM videos WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!(
        "SELECT {COLUMNS} FROM videos ORDER BY position, published_at DESC NULLS LAST"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn existing_youtube_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT youtube_id FROM videos")
        .fetch_all(pool)
        .await
}

pub(crate) async fn max_position(pool: &PgPool) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT MAX(position) FROM videos")
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateVideo<'a> {
    pub id: &'a str,
    pub youtube_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub thumbnail_url: Option<&'a str>,
    pub published_at: Option<time::PrimitiveDateTime>,
    pub position: i32,
    pub created_at: time::PrimitiveDateTime,
}

/// Returns `false` when the video was already imported.
pub(crate) async fn create(pool: &PgPool, params: CreateVideo<'_>) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO videos (
            id, youtube_id, title, description, thumbnail_url, published_at, position, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        ON CONFLICT (youtube_id) DO NOTHING",
    )
    .bind(params.id)
    .bind(params.youtube_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.thumbnail_url)
    .bind(params.published_at)
    .bind(params.position)
    .bind(params.created_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM videos")
        .fetch_one(pool)
        .await
}
