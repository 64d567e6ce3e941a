//! Application state

use imgconv_core::Config;
use imgconv_processing::{ImageTranscoder, TranscodeOptions};

use crate::services::conversion::ConversionService;

/// Immutable per-process state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub conversion: ConversionService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let transcoder = ImageTranscoder::new(TranscodeOptions {
            quality: config.quality,
            max_decode_pixels: config.max_decode_pixels,
        });
        let conversion = ConversionService::new(
            transcoder,
            config.max_concurrent_conversions,
            config.failure_policy,
        );
        Self { config, conversion }
    }
}
