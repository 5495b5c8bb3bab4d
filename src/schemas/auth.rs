use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::User;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SessionCreate {
    #[serde(alias = "idToken")]
    #[validate(length(min = 1, message = "idToken must not be empty"))]
    pub(crate) id_token: String,
    #[serde(default)]
    #[serde(alias = "isNewUser")]
    pub(crate) is_new_user: bool,
}

/// Session state as seen by the caller. Unauthenticated requests get the
/// same shape with empty fields rather than a 401.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionState {
    pub(crate) authenticated: bool,
    pub(crate) user_id: String,
    pub(crate) email: String,
    pub(crate) role: String,
}

impl SessionState {
    pub(crate) fn anonymous() -> Self {
        Self {
            authenticated: false,
            user_id: String::new(),
            email: String::new(),
            role: String::new(),
        }
    }

    pub(crate) fn for_user(user: &User) -> Self {
        Self {
            authenticated: true,
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
        }
    }

    pub(crate) fn from_claims(user_id: String, email: String, role: String) -> Self {
        Self { authenticated: true, user_id, email, role }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ViewModeUpdate {
    #[serde(alias = "viewMode")]
    #[validate(length(min = 1, message = "viewMode must not be empty"))]
    pub(crate) view_mode: String,
}
