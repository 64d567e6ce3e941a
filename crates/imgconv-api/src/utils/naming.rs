//! Output naming and data URI packaging

use base64::Engine;
use imgconv_core::FormatEntry;

/// Name used when an upload has no usable file name
pub const DEFAULT_FILE_NAME: &str = "image";

/// Remove the last `.ext` from the final path component.
///
/// Any extension is stripped regardless of case. A leading dot is part of
/// the name (`.hidden` stays `.hidden`), and a trailing dot with nothing
/// after it is not an extension.
pub fn strip_extension(name: &str) -> &str {
    let component_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let component = &name[component_start..];

    match component.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < component.len() => &name[..component_start + dot],
        _ => name,
    }
}

/// Output file name: stem of the original plus the target extension
pub fn output_name(original_name: &str, entry: &FormatEntry) -> String {
    let stem = strip_extension(original_name.trim());
    let stem = if stem.is_empty() || stem.ends_with('/') {
        DEFAULT_FILE_NAME
    } else {
        stem
    };
    format!("{}.{}", stem, entry.extension)
}

/// `data:{mime};base64,{payload}` with standard padded base64
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, encoded)
}
