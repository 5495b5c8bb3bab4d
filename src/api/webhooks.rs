use axum::{routing::post, Router};

use crate::api::errors::ApiError;
use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/zoom", post(zoom_webhook))
}

// Registered so the URL can be handed to Zoom ahead of time; the body is
// ignored until the integration lands.
async fn zoom_webhook() -> Result<(), ApiError> {
    Err(ApiError::NotImplemented("Zoom webhooks are not implemented"))
}
