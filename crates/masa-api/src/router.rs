use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::CorsConfig,
    docs::ApiDoc,
    middleware::logging,
    routes::{chat, feedback, health, history, support},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Chat
        .route("/chat/init", post(chat::init_chat))
        .route("/chat/message", post(chat::send_message))
        .route("/chat/history/:user_id", get(history::get_history))
        // Feedback
        .route("/chat/feedback", post(feedback::submit_feedback))
        .route("/feedback/summary", get(feedback::feedback_summary))
        // Support
        .route("/chat/support", post(support::request_support));

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::permissive();
    }

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            header::ORIGIN,
        ])
        .max_age(Duration::from_secs(3600));

    if config.origins.iter().any(|o| o == "*") {
        // Browsers refuse credentials with a wildcard origin
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .origins
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect();
        cors.allow_origin(origins).allow_credentials(true)
    }
}
