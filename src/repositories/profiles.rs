use sqlx::PgPool;

use crate::db::models::Profile;

const COLUMNS: &str = "\
    user_id, cohort, goals, timezone, onboarding_completed, created_at, updated_at";

pub(crate) async fn find_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!("SELECT {COLUMNS} FROM profiles WHERE user_id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn create_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO profiles (user_id, onboarding_completed, created_at, updated_at)
         VALUES ($1, FALSE, $2, $2)
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

