use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{self, CurrentAdmin};
use crate::core::config::Settings;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::{SessionCreate, SessionState, ViewModeUpdate};

pub(crate) const SESSION_COOKIE: &str = "session";
pub(crate) const VIEW_MODE_COOKIE: &str = "viewMode";

/// Max session creations per subject per window.
const SESSION_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const SESSION_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session).get(read_session).delete(delete_session))
        .route("/view-mode", post(set_view_mode).delete(clear_view_mode))
}

async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SessionCreate>,
) -> Result<(CookieJar, Json<SessionState>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let claims = security::verify_id_token(&payload.id_token, state.settings())
        .map_err(|_| ApiError::Unauthorized("Invalid identity token"))?;

    let rate_key = format!("rl:session:{}", claims.sub);
    let allowed = state
        .redis()
        .rate_limit(&rate_key, SESSION_RATE_LIMIT, SESSION_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many sign-in attempts, try again later"));
    }

    let email = claims.email.trim().to_ascii_lowercase();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Identity token is missing an email".to_string()));
    }

    let now = primitive_now_utc();

    // Role is derived from the allow-list each time a session is created and
    // stays fixed in the claim until the next sign-in.
    let is_admin = repositories::admin_emails::contains(state.db(), &email)
        .await
        .map_err(|e| ApiError::database(e, "Failed to check admin allow-list"))?;
    let role = if is_admin { UserRole::Admin } else { UserRole::Student };

    let display_name = claims
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string);

    let existing = repositories::users::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load user"))?;

    let (user, created) = match existing {
        Some(mut user) => {
            let name_update = display_name.filter(|name| *name != user.display_name);
            let role_changed = user.role != role;

            if name_update.is_some() || role_changed {
                repositories::users::update(
                    state.db(),
                    &user.id,
                    repositories::users::UpdateUser {
                        display_name: name_update.clone(),
                        role: role_changed.then_some(role),
                        is_active: None,
                        updated_at: now,
                    },
                )
                .await
                .map_err(|e| ApiError::database(e, "Failed to update user"))?;

                if let Some(name) = name_update {
                    user.display_name = name;
                }
                user.role = role;
            }

            (user, false)
        }
        None => {
            let fallback_name = email.split('@').next().unwrap_or("Student").to_string();
            let display_name = display_name.unwrap_or(fallback_name);

            let user = repositories::users::create(
                state.db(),
                repositories::users::CreateUser {
                    id: &Uuid::new_v4().to_string(),
                    email: &email,
                    display_name: &display_name,
                    role,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::database(e, "Failed to create user"))?;

            (user, true)
        }
    };

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is disabled"));
    }

    if created || payload.is_new_user {
        repositories::profiles::create_if_absent(state.db(), &user.id, now)
            .await
            .map_err(|e| ApiError::database(e, "Failed to create profile"))?;
    }

    let is_new = created || payload.is_new_user;
    let ttl_days = if is_new {
        state.settings().security().session_ttl_new_user_days
    } else {
        state.settings().security().session_ttl_days
    };

    let token = security::create_session_token(
        &user.id,
        &user.email,
        user.role.as_str(),
        state.settings(),
        Duration::days(ttl_days as i64),
    )
    .map_err(|e| ApiError::internal(e, "Failed to create session token"))?;

    tracing::info!(user_id = %user.id, new_user = is_new, "Session created");

    let cookie = session_cookie(token, ttl_days, state.settings());
    Ok((jar.add(cookie), Json(SessionState::for_user(&user))))
}

async fn read_session(State(state): State<AppState>, jar: CookieJar) -> Json<SessionState> {
    let response = match guards::session_claims(&jar, &state) {
        Some(claims) => SessionState::from_claims(claims.sub, claims.email, claims.role),
        None => SessionState::anonymous(),
    };

    Json(response)
}

async fn delete_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let jar = jar.remove(removal_cookie(SESSION_COOKIE, state.settings()));
    (jar, StatusCode::NO_CONTENT)
}

async fn set_view_mode(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    jar: CookieJar,
    Json(payload): Json<ViewModeUpdate>,
) -> Result<(CookieJar, StatusCode), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if !matches!(payload.view_mode.as_str(), "admin" | "student") {
        return Err(ApiError::BadRequest("viewMode must be 'admin' or 'student'".to_string()));
    }

    let cookie = view_mode_cookie(payload.view_mode, state.settings());
    Ok((jar.add(cookie), StatusCode::NO_CONTENT))
}

async fn clear_view_mode(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let jar = jar.remove(removal_cookie(VIEW_MODE_COOKIE, state.settings()));
    (jar, StatusCode::NO_CONTENT)
}

fn session_cookie(token: String, max_age_days: u64, settings: &Settings) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.runtime().environment.is_production())
        .path("/")
        .max_age(Duration::days(max_age_days as i64));

    if let Some(domain) = &settings.security().cookie_domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

/// The viewMode cookie is read by the frontend, so it is not httpOnly.
fn view_mode_cookie(mode: String, settings: &Settings) -> Cookie<'static> {
    let mut builder = Cookie::build((VIEW_MODE_COOKIE, mode))
        .same_site(SameSite::Lax)
        .secure(settings.runtime().environment.is_production())
        .path("/")
        .max_age(Duration::days(settings.security().view_mode_ttl_days as i64));

    if let Some(domain) = &settings.security().cookie_domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

fn removal_cookie(name: &'static str, settings: &Settings) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    if let Some(domain) = &settings.security().cookie_domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn test_settings() -> Settings {
        std::env::set_var("SECRET_KEY", "test-secret");
        std::env::remove_var("COOKIE_DOMAIN");
        std::env::remove_var("MENTORA_ENV");
        std::env::remove_var("ENVIRONMENT");
        Settings::load().expect("settings")
    }

    #[test]
    fn session_cookie_is_http_only_lax() {
        let _guard = test_support::env_lock();
        let settings = test_settings();

        let cookie = session_cookie("token-value".to_string(), 14, &settings);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(14)));
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn view_mode_cookie_is_readable_by_the_client() {
        let _guard = test_support::env_lock();
        let settings = test_settings();

        let cookie = view_mode_cookie("student".to_string(), &settings);
        assert_eq!(cookie.name(), VIEW_MODE_COOKIE);
        assert_eq!(cookie.http_only(), None);
        assert_eq!(cookie.max_age(), Some(Duration::days(30)));
    }

    #[test]
    fn cookie_domain_is_applied_when_configured() {
        let _guard = test_support::env_lock();
        std::env::set_var("SECRET_KEY", "test-secret");
        std::env::set_var("COOKIE_DOMAIN", "app.example.com");
        std::env::remove_var("MENTORA_ENV");
        std::env::remove_var("ENVIRONMENT");
        let settings = Settings::load().expect("settings");
        std::env::remove_var("COOKIE_DOMAIN");

        let cookie = session_cookie("token-value".to_string(), 5, &settings);
        assert_eq!(cookie.domain(), Some("app.example.com"));

        let removal = removal_cookie(SESSION_COOKIE, &settings);
        assert_eq!(removal.domain(), Some("app.example.com"));
    }
}
