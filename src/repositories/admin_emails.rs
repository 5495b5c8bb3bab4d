use sqlx::PgPool;

use crate::db::models::AdminEmail;

const COLUMNS: &str = "email, added_by, created_at";

pub(crate) async fn contains(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admin_emails WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<AdminEmail>, sqlx::Error> {
    sqlx::query_as::<_, AdminEmail>(&format!(
        "SELECT {COLUMNS} FROM admin_emails ORDER BY created_at"
    ))
    .fetch_all(pool)
    .await
}

/// Returns `false` when the address was already allow-listed.
pub(crate) async fn add(
    pool: &PgPool,
    email: &str,
    added_by: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO admin_emails (email, added_by, created_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(email)
    .bind(added_by)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn remove(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM admin_emails WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
