use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension, Json,
};
use imgconv_infra::RequestId;

use crate::error::HttpAppError;
use crate::services::conversion::ConversionResponse;
use crate::state::AppState;
use crate::utils::upload::read_conversion_form;

/// Convert a batch of uploaded images
///
/// Multipart fields: `format` (target format id) and one or more `files`.
/// Responds with the converted files as data URIs, in upload order.
#[tracing::instrument(
    skip(state, request_id, multipart),
    fields(operation = "convert_images", request_id = %request_id.0)
)]
pub async fn convert_images(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResponse>, HttpAppError> {
    let form = read_conversion_form(multipart?).await?;
    let response = state.conversion.convert(form).await?;
    Ok(Json(response))
}
