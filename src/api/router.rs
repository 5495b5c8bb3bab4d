use axum::{
    http::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    http::{HeaderName, Method, Request, Response},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::api::{
    admin, assignments, auth, chats, handlers, live_sessions, progress, submissions, videos,
    webhooks,
};
use crate::core::{config::Settings, state::AppState};

pub(crate) fn router(state: AppState) -> Router {
    let cors = build_cors_layer(state.settings());
    let api_prefix = state.settings().api().api_prefix.clone();
    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/assignments", assignments::router())
        .nest("/submissions", submissions::router(state.settings()))
        .nest("/progress", progress::router())
        .nest("/chats", chats::router())
        .nest("/live-sessions", live_sessions::router())
        .nest("/videos", videos::router())
        .nest("/youtube", videos::youtube_router())
        .nest("/admin", admin::router())
        .nest("/webhooks", webhooks::router());

    let request_id_header = HeaderName::from_static("x-request-id");
    let request_id_header_for_span = request_id_header.clone();
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(move |request: &Request<_>| {
            let request_id = request
                .headers()
                .get(&request_id_header_for_span)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_response(|response: &Response<axum::body::Body>, latency: Duration, _span: &Span| {
            let status_label = response.status().as_u16().to_string();
            metrics::counter!(
                "http_requests_total",
                "status" => status_label.clone()
            )
            .increment(1);
            metrics::histogram!(
                "http_request_duration_seconds",
                "status" => status_label
            )
            .record(latency.as_secs_f64());
        });

    let mut router: Router<AppState> = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz).head(handlers::healthz))
        .nest(&api_prefix, api)
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(trace_layer)
        .layer(cors);

    if state.settings().telemetry().prometheus_enabled {
        router = router.route("/metrics", get(handlers::metrics));
    }

    router.with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins = settings
        .cors()
        .origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            ORIGIN,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        // Wildcard origin cannot be combined with allow_credentials
        base.allow_origin(Any)
    } else {
        base.allow_credentials(true).allow_origin(AllowOrigin::list(origins))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::core::{config::Settings, metrics};
    use crate::test_support;

    #[tokio::test]
    async fn root_returns_service_banner() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let app = test_support::test_app();
        let response = app
            .oneshot(test_support::json_request(Method::GET, "/", None, None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = test_support::read_json(response).await;
        assert_eq!(json["message"], "Mentora API");
        assert_eq!(json["docs_url"], "/api/docs");
    }

    #[tokio::test]
    async fn metrics_disabled_returns_404() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let app = test_support::test_app();
        let response = app
            .oneshot(test_support::json_request(Method::GET, "/metrics", None, None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_enabled_returns_200() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        std::env::set_var("PROMETHEUS_ENABLED", "1");

        let settings = Settings::load().expect("settings");
        metrics::init(&settings).expect("metrics init");
        let app = super::router(test_support::build_state(settings));
        std::env::set_var("PROMETHEUS_ENABLED", "0");

        let response = app
            .oneshot(test_support::json_request(Method::GET, "/metrics", None, None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_requires_session() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let app = test_support::test_app();
        let response = app
            .oneshot(test_support::json_request(Method::GET, "/api/assignments", None, None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_session_cookie_is_rejected() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let app = test_support::test_app();
        let response = app
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/progress/me",
                Some("session=not-a-token"),
                None,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_read_is_anonymous_by_default() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let app = test_support::test_app();
        let response = app
            .oneshot(test_support::json_request(Method::GET, "/api/auth/session", None, None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = test_support::read_json(response).await;
        assert_eq!(json["authenticated"], false);
        assert_eq!(json["userId"], "");
    }

    #[tokio::test]
    async fn session_delete_clears_cookie() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let app = test_support::test_app();
        let response = app
            .oneshot(test_support::json_request(Method::DELETE, "/api/auth/session", None, None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cleared = response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("set-cookie header");
        assert!(cleared.starts_with("session="));
    }

    #[tokio::test]
    async fn empty_id_token_is_bad_request() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let app = test_support::test_app();
        let response = app
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/auth/session",
                None,
                Some(serde_json::json!({"idToken": "", "isNewUser": false})),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn forged_id_token_is_unauthorized() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let app = test_support::test_app();
        let response = app
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/auth/session",
                None,
                Some(serde_json::json!({"idToken": "forged.jwt.value", "isNewUser": true})),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn zoom_webhook_is_not_implemented() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let app = test_support::test_app();
        let response = app
            .oneshot(test_support::json_request(Method::POST, "/api/webhooks/zoom", None, None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        let json = test_support::read_json(response).await;
        assert_eq!(json["status"], 501);
    }
}
