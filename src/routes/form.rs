// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Form extraction shared by the upload and processing routes.

use crate::error::{AppError, Result};
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, StatusCode};
use axum::Form;
use std::collections::HashMap;

/// Text fields of a form, whether sent as multipart or urlencoded.
#[derive(Debug, Default)]
pub struct FormFields(pub HashMap<String, String>);

impl FormFields {
    /// Required text field.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::BadRequest(format!("Missing form field: {name}")))
    }

    pub fn optional(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            let mut fields = HashMap::new();
            while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                let value = field.text().await.map_err(multipart_error)?;
                fields.insert(name, value);
            }
            Ok(Self(fields))
        } else {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(fields))
        }
    }
}

/// A file part of a multipart upload.
#[derive(Debug)]
pub struct UploadedFile {
    /// Client-supplied file name (unsanitized)
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// One part of a multipart upload.
#[derive(Debug)]
pub enum UploadPart {
    SessionId(String),
    File(UploadedFile),
}

/// Reads a multipart upload one part at a time, so only the current file
/// is held in memory. Enforces the per-file size and file count limits.
pub struct UploadStream {
    multipart: Multipart,
    max_file_bytes: usize,
    max_files: usize,
    files_read: usize,
}

impl UploadStream {
    pub fn new(multipart: Multipart, max_file_bytes: usize, max_files: usize) -> Self {
        Self {
            multipart,
            max_file_bytes,
            max_files,
            files_read: 0,
        }
    }

    /// Next session id or file part; other fields are ignored.
    pub async fn next_part(&mut self) -> Result<Option<UploadPart>> {
        while let Some(field) = self.multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_string);
            let filename = field.file_name().map(str::to_string);

            match (name.as_deref(), filename) {
                (Some("session_id"), _) => {
                    let value = field.text().await.map_err(multipart_error)?;
                    return Ok(Some(UploadPart::SessionId(value)));
                }
                (_, Some(filename)) => {
                    if self.files_read >= self.max_files {
                        return Err(AppError::BadRequest(format!(
                            "Too many files: at most {} per upload",
                            self.max_files
                        )));
                    }
                    self.files_read += 1;
                    let bytes = read_limited(field, &filename, self.max_file_bytes).await?;
                    return Ok(Some(UploadPart::File(UploadedFile { filename, bytes })));
                }
                _ => {}
            }
        }
        Ok(None)
    }
}

/// Multipart upload held in memory: the session id plus its file parts.
/// Used for single-file uploads.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub session_id: Option<String>,
    pub files: Vec<UploadedFile>,
}

impl UploadForm {
    /// Read a whole multipart upload of at most `max_files` files.
    pub async fn read(
        multipart: Multipart,
        max_file_bytes: usize,
        max_files: usize,
    ) -> Result<Self> {
        let mut stream = UploadStream::new(multipart, max_file_bytes, max_files);
        let mut form = Self::default();

        while let Some(part) = stream.next_part().await? {
            match part {
                UploadPart::SessionId(id) => form.session_id = Some(id),
                UploadPart::File(file) => form.files.push(file),
            }
        }

        Ok(form)
    }

    pub fn session_id(&self) -> Result<&str> {
        self.session_id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("Missing form field: session_id".to_string()))
    }

    /// The single file of a one-file upload.
    pub fn single_file(&mut self) -> Result<UploadedFile> {
        if self.files.is_empty() {
            return Err(AppError::BadRequest("Missing form field: file".to_string()));
        }
        Ok(self.files.swap_remove(0))
    }
}

async fn read_limited(mut field: Field<'_>, filename: &str, max_bytes: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "{filename} exceeds the {} MB limit",
                max_bytes / (1024 * 1024)
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
