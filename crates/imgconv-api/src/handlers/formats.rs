use axum::Json;
use imgconv_core::{FormatEntry, REGISTRY};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub formats: &'static [FormatEntry],
}

/// List the supported target formats in registry order
pub async fn list_formats() -> Json<FormatsResponse> {
    Json(FormatsResponse { formats: &REGISTRY })
}
