//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use imgconv_core::Config;
use imgconv_infra::request_id_middleware;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let config = &state.config;
    let cors = setup_cors(config)?;

    let api_routes = Router::new()
        .route("/health", get(handlers::health::liveness_check))
        .route("/api/formats", get(handlers::formats::list_formats))
        .route(
            "/api/convert-images",
            post(handlers::convert::convert_images),
        );

    // Replaces axum's implicit 2 MB cap. Overruns surface as a multipart
    // error and render through `HttpAppError` as a JSON 413.
    let body_limit = match config.max_upload_size_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };
    let api_routes = api_routes.layer(body_limit);

    let app = match &config.static_dir {
        Some(dir) => {
            let index = Path::new(dir).join("index.html");
            tracing::info!(static_dir = %dir, "Serving static assets with SPA fallback");
            api_routes.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => api_routes,
    };

    let app = app
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.allows_any_origin() {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new().allow_origin(origins)
    };

    Ok(cors
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}
