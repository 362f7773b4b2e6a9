pub mod handlers;
pub mod upload;


use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::classifier::ModelHandle;
use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub model: ModelHandle,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = create_cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/test-upload", post(handlers::test_upload))
        .route("/predict", post(handlers::predict))
        .route("/model-info", get(handlers::model_info))
        .layer(DefaultBodyLimit::max(state.config.max_content_length))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn create_cors_layer(allowed_origins: &[HeaderValue]) -> CorsLayer {
    use tower_http::cors::Any;

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(allowed_origins.to_vec())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    cors.max_age(Duration::from_secs(3600))
}
