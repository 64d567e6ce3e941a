//! Configuration module
//!
//! Server and conversion settings loaded from the environment (and an optional
//! `.env` file). Typed variables that fail to parse are startup errors.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context};

use crate::quality::QualityPreset;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";

/// What a batch does when one of its files fails to convert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Any failed file fails the whole request
    #[default]
    AllOrNothing,
    /// Failed files are reported in place, the rest are returned
    Partial,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all_or_nothing" | "all-or-nothing" => Ok(FailurePolicy::AllOrNothing),
            "partial" => Ok(FailurePolicy::Partial),
            other => Err(anyhow!(
                "Invalid failure policy: {} (expected 'all_or_nothing' or 'partial')",
                other
            )),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Directory with the built frontend, served with SPA fallback
    pub static_dir: Option<String>,
    /// Upper bound on concurrently running transcodes within one request
    pub max_concurrent_conversions: usize,
    /// Maximum width * height accepted for decode; `None` decodes anything
    pub max_decode_pixels: Option<u64>,
    /// Request body limit in bytes; `None` leaves it to the hosting environment
    pub max_upload_size_bytes: Option<usize>,
    pub quality: QualityPreset,
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            static_dir: None,
            max_concurrent_conversions: default_concurrency(),
            max_decode_pixels: None,
            max_upload_size_bytes: None,
            quality: QualityPreset::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        _ => Ok(None),
    }
}

impl Config {
    /// Load configuration from process environment
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let defaults = Config::default();

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or(defaults.environment);

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors_origins);

        let max_upload_size_bytes = parse_var::<usize>(&lookup, "MAX_UPLOAD_SIZE_MB")?
            .map(|mb| {
                mb.checked_mul(1024 * 1024)
                    .context("MAX_UPLOAD_SIZE_MB is too large")
            })
            .transpose()?;

        let config = Config {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            environment,
            cors_origins,
            static_dir: lookup("STATIC_DIR").filter(|s| !s.trim().is_empty()),
            max_concurrent_conversions: parse_var(&lookup, "MAX_CONCURRENT_CONVERSIONS")?
                .unwrap_or(defaults.max_concurrent_conversions),
            max_decode_pixels: parse_var(&lookup, "MAX_DECODE_PIXELS")?,
            max_upload_size_bytes,
            quality: parse_var(&lookup, "CONVERT_QUALITY")?.unwrap_or(defaults.quality),
            failure_policy: parse_var(&lookup, "BATCH_FAILURE_POLICY")?
                .unwrap_or(defaults.failure_policy),
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.allows_any_origin() {
            return Err(anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        if self.max_concurrent_conversions == 0 {
            return Err(anyhow!("MAX_CONCURRENT_CONVERSIONS must be at least 1"));
        }
        if self.max_decode_pixels == Some(0) {
            return Err(anyhow!("MAX_DECODE_PIXELS must be greater than 0 when set"));
        }
        if self.max_upload_size_bytes == Some(0) {
            return Err(anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0 when set"));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
