// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Session identifiers and per-session processing status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::AppError;

const MAX_SESSION_ID_LEN: usize = 64;

/// Client-supplied session identifier.
///
/// Session ids become directory and file names, so only ASCII letters,
/// digits, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_SESSION_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(AppError::BadRequest(format!(
                "Invalid session_id: must be 1-{} characters of [A-Za-z0-9_-]",
                MAX_SESSION_ID_LEN
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Progress of a session through upload and processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProcessingStatus {
    pub session_id: String,
    pub excel_uploaded: bool,
    pub excel_filename: Option<String>,
    pub excel_path: Option<String>,
    pub images_uploaded: bool,
    pub image_count: usize,
    pub uploaded_images: Vec<String>,
    pub processing_complete: bool,
    pub output_path: Option<String>,
    pub mapped_plants: usize,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl ProcessingStatus {
    /// Fresh status for a session whose spreadsheet was just stored.
    pub fn with_excel(session_id: &SessionId, filename: &str, path: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            excel_uploaded: true,
            excel_filename: Some(filename.to_string()),
            excel_path: Some(path.to_string()),
            images_uploaded: false,
            image_count: 0,
            uploaded_images: Vec::new(),
            processing_complete: false,
            output_path: None,
            mapped_plants: 0,
            created_at: Utc::now(),
        }
    }
}
