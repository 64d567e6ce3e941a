use std::str::FromStr;

/// Quality presets for lossy encoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityPreset {
    #[default]
    Normal, // Default quality, balanced size and quality
    Better,   // Higher quality, ≈125% file size
    Best,     // Near pristine quality, ≈170% file size
    Lighter,  // Smaller files, ≈80% file size
    Lightest, // Maximum compression, ≈50% file size
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid quality preset: {0}")]
pub struct InvalidQualityPreset(pub String);

impl FromStr for QualityPreset {
    type Err = InvalidQualityPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(QualityPreset::Normal),
            "better" => Ok(QualityPreset::Better),
            "best" => Ok(QualityPreset::Best),
            "lighter" => Ok(QualityPreset::Lighter),
            "lightest" => Ok(QualityPreset::Lightest),
            _ => Err(InvalidQualityPreset(s.to_string())),
        }
    }
}

impl QualityPreset {
    /// Get quality value for JPEG (0-100)
    pub fn jpeg_quality(self) -> u8 {
        match self {
            QualityPreset::Normal => 75,
            QualityPreset::Better => 85,
            QualityPreset::Best => 95,
            QualityPreset::Lighter => 65,
            QualityPreset::Lightest => 50,
        }
    }

    /// Get quality value for WebP (0-100)
    pub fn webp_quality(self) -> f32 {
        match self {
            QualityPreset::Normal => 80.0,
            QualityPreset::Better => 90.0,
            QualityPreset::Best => 98.0,
            QualityPreset::Lighter => 70.0,
            QualityPreset::Lightest => 55.0,
        }
    }

    /// Get quality value for AVIF (0-100)
    pub fn avif_quality(self) -> u8 {
        match self {
            QualityPreset::Normal => 70,
            QualityPreset::Better => 80,
            QualityPreset::Best => 90,
            QualityPreset::Lighter => 60,
            QualityPreset::Lightest => 45,
        }
    }
}
