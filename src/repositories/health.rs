use sqlx::PgPool;

/// Cheap liveness probe for the readiness endpoint.
pub(crate) async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
