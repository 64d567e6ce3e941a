//! Multipart parsing for the conversion endpoint

use axum::extract::Multipart;

use crate::error::HttpAppError;
use crate::services::conversion::{ConversionForm, FormatField, RawFile};
use crate::utils::naming::DEFAULT_FILE_NAME;

pub const FORMAT_FIELD: &str = "format";
pub const FILES_FIELD: &str = "files";

/// Read the whole multipart body into an unvalidated `ConversionForm`.
///
/// `format` must arrive exactly once as a plain UTF-8 text field; anything
/// else marks it invalid. Only `files` parts that carry a filename are files.
/// They are kept in upload order, and an empty filename becomes `image`. A
/// part with an empty filename and no content is what browsers send for an
/// untouched file input and is skipped. Other fields are ignored.
pub async fn read_conversion_form(mut multipart: Multipart) -> Result<ConversionForm, HttpAppError> {
    let mut form = ConversionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FORMAT_FIELD) => {
                let sent_as_file = field.file_name().is_some();
                let bytes = field.bytes().await?;

                form.format = match (&form.format, sent_as_file) {
                    (FormatField::Missing, false) => match String::from_utf8(bytes.to_vec()) {
                        Ok(value) => FormatField::Value(value),
                        Err(_) => FormatField::Invalid,
                    },
                    _ => FormatField::Invalid,
                };
            }
            Some(FILES_FIELD) => {
                let Some(file_name) = field.file_name().map(str::to_owned) else {
                    tracing::debug!("Ignoring 'files' text field without a filename");
                    continue;
                };
                let bytes = field.bytes().await?;

                if file_name.trim().is_empty() {
                    if bytes.is_empty() {
                        tracing::debug!("Skipping empty file input");
                        continue;
                    }
                    form.files.push(RawFile {
                        original_name: DEFAULT_FILE_NAME.to_string(),
                        bytes,
                    });
                } else {
                    form.files.push(RawFile {
                        original_name: file_name,
                        bytes,
                    });
                }
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }

    Ok(form)
}
