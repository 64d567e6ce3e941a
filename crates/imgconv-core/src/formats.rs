//! Format registry
//!
//! The closed set of target encodings a conversion can produce, with the MIME
//! type and file extension used for the converted output.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Target encoding for a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    Png,
    Jpeg,
    WebP,
    Avif,
    Tiff,
    Gif,
}

impl TargetFormat {
    /// Every supported format, in registry order
    pub const ALL: [TargetFormat; 6] = [
        TargetFormat::Png,
        TargetFormat::Jpeg,
        TargetFormat::WebP,
        TargetFormat::Avif,
        TargetFormat::Tiff,
        TargetFormat::Gif,
    ];

    /// Registry entry for this format
    pub fn entry(self) -> &'static FormatEntry {
        match self {
            TargetFormat::Png => &REGISTRY[0],
            TargetFormat::Jpeg => &REGISTRY[1],
            TargetFormat::WebP => &REGISTRY[2],
            TargetFormat::Avif => &REGISTRY[3],
            TargetFormat::Tiff => &REGISTRY[4],
            TargetFormat::Gif => &REGISTRY[5],
        }
    }

    pub fn id(self) -> &'static str {
        self.entry().id
    }

    pub fn mime_type(self) -> &'static str {
        self.entry().mime
    }

    pub fn extension(self) -> &'static str {
        self.entry().extension
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Returned when a format id is not in the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for TargetFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
            .map(|entry| entry.format)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// One row of the format registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatEntry {
    #[serde(skip)]
    pub format: TargetFormat,
    pub id: &'static str,
    pub mime: &'static str,
    pub extension: &'static str,
}

/// Registry table. The jpeg entry names its files `.jpg`.
pub static REGISTRY: [FormatEntry; 6] = [
    FormatEntry {
        format: TargetFormat::Png,
        id: "png",
        mime: "image/png",
        extension: "png",
    },
    FormatEntry {
        format: TargetFormat::Jpeg,
        id: "jpeg",
        mime: "image/jpeg",
        extension: "jpg",
    },
    FormatEntry {
        format: TargetFormat::WebP,
        id: "webp",
        mime: "image/webp",
        extension: "webp",
    },
    FormatEntry {
        format: TargetFormat::Avif,
        id: "avif",
        mime: "image/avif",
        extension: "avif",
    },
    FormatEntry {
        format: TargetFormat::Tiff,
        id: "tiff",
        mime: "image/tiff",
        extension: "tiff",
    },
    FormatEntry {
        format: TargetFormat::Gif,
        id: "gif",
        mime: "image/gif",
        extension: "gif",
    },
];

/// Look up a format by its registry id. Ids are matched exactly.
pub fn resolve(format_id: &str) -> Option<&'static FormatEntry> {
    REGISTRY.iter().find(|entry| entry.id == format_id)
}

/// Comma-separated list of supported ids, e.g. for error messages
pub fn supported_ids() -> String {
    REGISTRY
        .iter()
        .map(|entry| entry.id)
        .collect::<Vec<_>>()
        .join(", ")
}
