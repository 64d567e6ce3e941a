//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use imgconv_core::Config;
use std::sync::Arc;

/// Validate configuration, build the state and the router.
/// Tracing must already be initialized.
pub fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::info!(
        environment = %config.environment,
        quality = ?config.quality,
        failure_policy = ?config.failure_policy,
        max_concurrent_conversions = config.max_concurrent_conversions,
        max_decode_pixels = ?config.max_decode_pixels,
        max_upload_size_bytes = ?config.max_upload_size_bytes,
        "Configuration loaded and validated successfully"
    );

    let state = Arc::new(AppState::new(config));
    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
