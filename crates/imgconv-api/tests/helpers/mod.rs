//! Test helpers: build the router and an in-process test server.
//!
//! Run from workspace root: `cargo test -p imgconv-api`.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use imgconv_api::setup::routes;
use imgconv_api::state::AppState;
use imgconv_core::{Config, FailurePolicy};
use std::sync::Arc;

pub const CONVERT_PATH: &str = "/api/convert-images";

/// Config with small, deterministic concurrency and no environment lookups
pub fn test_config() -> Config {
    Config {
        max_concurrent_conversions: 2,
        ..Config::default()
    }
}

pub fn setup_test_server(config: Config) -> TestServer {
    let state = Arc::new(AppState::new(config));
    let app = routes::setup_routes(state).expect("Failed to build routes");
    TestServer::new(app.into_make_service()).expect("Failed to create test server")
}

pub fn default_server() -> TestServer {
    setup_test_server(test_config())
}

pub fn partial_server() -> TestServer {
    setup_test_server(Config {
        failure_policy: FailurePolicy::Partial,
        ..test_config()
    })
}

/// A `files` part with a file name
pub fn file_part(name: &str, data: Vec<u8>) -> Part {
    Part::bytes(data)
        .file_name(name.to_string())
        .mime_type("application/octet-stream")
}

/// Multipart form with a `format` field and the given files
pub fn conversion_form(format: &str, files: Vec<(&str, Vec<u8>)>) -> MultipartForm {
    files
        .into_iter()
        .fold(MultipartForm::new().add_text("format", format.to_string()), |form, (name, data)| {
            form.add_part("files", file_part(name, data))
        })
}
