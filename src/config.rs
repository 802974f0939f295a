// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind
    pub host: String,
    /// Server port
    pub port: u16,
    /// Human-readable logs at debug level
    pub debug: bool,
    /// Allowed CORS origins ("*" allows any)
    pub cors_origins: Vec<String>,
    /// Per-file upload limit in megabytes
    pub max_file_size_mb: u64,
    /// Maximum number of images accepted by a single upload request
    pub max_images_per_upload: usize,
    /// Rows per sheet returned by the spreadsheet preview
    pub preview_rows: usize,
    /// Sessions older than this are swept (0 disables the sweeper)
    pub auto_cleanup_hours: u64,
    /// Base directory holding `uploads/`, `processed_data/` and `static/`
    pub data_dir: PathBuf,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            debug: true,
            cors_origins: vec!["http://localhost:3000".to_string()],
            max_file_size_mb: 5,
            max_images_per_upload: 20,
            preview_rows: 10,
            auto_cleanup_hours: 24,
            data_dir: PathBuf::from("."),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("API_PORT", 8000)?,
            debug: parse_bool("DEBUG")?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_file_size_mb: parse_var("MAX_FILE_SIZE", 50)?,
            max_images_per_upload: parse_var("MAX_IMAGES_PER_UPLOAD", 1000)?,
            preview_rows: parse_var("PREVIEW_ROWS", 10)?,
            auto_cleanup_hours: parse_var("AUTO_CLEANUP_HOURS", 24)?,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        })
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-file upload limit in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        usize::try_from(self.max_file_size_mb.saturating_mul(BYTES_PER_MB)).unwrap_or(usize::MAX)
    }

    /// Whole-request body limit: room for a full image batch plus form fields.
    pub fn request_body_limit(&self) -> usize {
        self.max_file_size_bytes()
            .saturating_mul(self.max_images_per_upload.saturating_add(1))
    }

    /// True when any origin may call the API.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

/// Parse `CORS_ORIGINS`, accepting either a JSON list or a comma-separated list.
pub fn parse_origins(raw: &str) -> Vec<String> {
    let origins = match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(_) => raw.split(',').map(str::to_string).collect(),
    };

    origins
        .into_iter()
        .map(|o| o.trim().trim_matches('"').trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_bool(name: &'static str) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::Invalid(name, raw)),
        },
        Err(_) => Ok(false),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
