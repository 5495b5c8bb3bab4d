use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use crate::api::auth::SESSION_COOKIE;
use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

/// Verified claims from the session cookie, or None when the cookie is
/// missing, expired, or tampered with.
pub(crate) fn session_claims(
    jar: &CookieJar,
    state: &AppState,
) -> Option<security::SessionClaims> {
    let cookie = jar.get(SESSION_COOKIE)?;
    security::verify_session_token(cookie.value(), state.settings()).ok()
}

async fn load_active_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    let user = repositories::users::find_by_id(state.db(), user_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load user"))?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized("User not found"));
    };

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is disabled"));
    }

    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(claims) = session_claims(&jar, &app_state) else {
            return Err(ApiError::Unauthorized("Not authenticated"));
        };

        let user = load_active_user(&app_state, &claims.sub).await?;

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(claims) = session_claims(&jar, &app_state) else {
            return Err(ApiError::Unauthorized("Not authenticated"));
        };

        // Role comes from the session claim, fixed at sign-in.
        if UserRole::from_claim(&claims.role) != Some(UserRole::Admin) {
            return Err(ApiError::Forbidden("Admin access required"));
        }

        let user = load_active_user(&app_state, &claims.sub).await?;

        Ok(CurrentAdmin(user))
    }
}
