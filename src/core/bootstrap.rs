use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Makes sure the configured operator email is on the admin allow-list and
/// that an already-registered account under that email carries the admin
/// role. Runs at startup and is idempotent.
pub(crate) async fn ensure_first_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_email.is_empty() {
        tracing::warn!("FIRST_ADMIN_EMAIL not configured; skipping admin bootstrap");
        return Ok(());
    }

    let email = &admin.first_admin_email;
    let now = primitive_now_utc();

    let inserted = repositories::admin_emails::add(state.db(), email, "bootstrap", now).await?;
    if inserted {
        tracing::info!(email = %email, "Added bootstrap admin to allow-list");
    } else {
        tracing::info!(email = %email, "Bootstrap admin already on allow-list");
    }

    // A session minted before the promotion keeps its old role claim until
    // the next sign-in; only the stored row is corrected here.
    if let Some(user) = repositories::users::find_by_email(state.db(), email).await? {
        if user.role != UserRole::Admin {
            repositories::users::set_role(state.db(), &user.id, UserRole::Admin, now).await?;
            tracing::info!(user_id = %user.id, "Promoted bootstrap admin account");
        }
    }

    Ok(())
}
