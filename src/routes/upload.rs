// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upload routes: spreadsheet, individual images and image archives.

use crate::error::{AppError, Result};
use crate::models::SessionId;
use crate::routes::form::{UploadForm, UploadPart, UploadStream};
use crate::services::{archive, sniff, SpreadsheetKind};
use crate::storage::sanitize_filename;
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload/excel", post(upload_excel))
        .route("/upload/images", post(upload_images))
        .route("/upload/images-zip", post(upload_images_zip))
}

// ─── Spreadsheet ─────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadExcelResponse {
    pub message: String,
    pub session_id: String,
}

/// Store the session spreadsheet and start (or restart) the session.
async fn upload_excel(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadExcelResponse>> {
    let mut form = UploadForm::read(multipart, state.config.max_file_size_bytes(), 1).await?;
    let session_id = SessionId::parse(form.session_id()?)?;
    let file = form.single_file()?;

    let filename = sanitize_filename(&file.filename)
        .ok_or_else(|| AppError::BadRequest("Invalid file name".to_string()))?;
    let kind = SpreadsheetKind::from_filename(&filename)
        .ok_or_else(|| AppError::BadRequest("Only Excel files are supported".to_string()))?;
    if !sniff::verify_spreadsheet(kind, &file.bytes) {
        return Err(AppError::UnsupportedMediaType(format!(
            "{filename} does not contain a {kind:?} spreadsheet"
        )));
    }

    let path = state
        .storage
        .write_file(&state.storage.excel_dir(&session_id), &filename, &file.bytes)
        .await?;
    state
        .sessions
        .start(&session_id, &filename, &path.to_string_lossy());

    tracing::info!(
        session_id = %session_id,
        filename = %filename,
        bytes = file.bytes.len(),
        "Spreadsheet uploaded"
    );

    Ok(Json(UploadExcelResponse {
        message: "Excel file uploaded successfully".to_string(),
        session_id: session_id.to_string(),
    }))
}

// ─── Images ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadImagesResponse {
    pub message: String,
    pub uploaded_files: Vec<String>,
    pub skipped_files: Vec<String>,
    pub session_id: String,
}

/// Resolve the session of an image upload; images need a spreadsheet first.
fn existing_session(state: &AppState, raw: Option<&str>) -> Result<SessionId> {
    let raw = raw
        .ok_or_else(|| AppError::BadRequest("Missing form field: session_id".to_string()))?;
    let session_id = SessionId::parse(raw)?;
    if !state.sessions.contains(&session_id) {
        return Err(AppError::BadRequest(
            "Session not found. Upload Excel file first.".to_string(),
        ));
    }
    Ok(session_id)
}

/// Images accepted so far by one upload request.
#[derive(Default)]
struct StagedImages {
    session_id: Option<String>,
    uploaded: Vec<String>,
    skipped: Vec<String>,
}

/// Write each image part to `staging` as it arrives.
async fn stage_images(
    state: &AppState,
    mut parts: UploadStream,
    staging: &Path,
) -> Result<StagedImages> {
    let mut staged = StagedImages::default();

    while let Some(part) = parts.next_part().await? {
        let file = match part {
            UploadPart::SessionId(id) => {
                staged.session_id = Some(id);
                continue;
            }
            UploadPart::File(file) => file,
        };

        let name = sanitize_filename(&file.filename)
            .filter(|n| sniff::is_supported_image_name(n) && sniff::is_image_content(&file.bytes));
        let Some(name) = name else {
            staged.skipped.push(file.filename);
            continue;
        };

        state.storage.write_file(staging, &name, &file.bytes).await?;
        if !staged.uploaded.contains(&name) {
            staged.uploaded.push(name);
        }
    }

    Ok(staged)
}

/// Store individual images. Unsupported or non-image files are skipped.
///
/// Parts go to a staging directory one at a time and move into the session
/// once the whole request is read, since `session_id` may follow the files.
async fn upload_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadImagesResponse>> {
    let parts = UploadStream::new(
        multipart,
        state.config.max_file_size_bytes(),
        state.config.max_images_per_upload,
    );
    let staging = state.storage.staging_dir();

    let staged = stage_images(&state, parts, &staging)
        .await
        .and_then(|staged| {
            let session_id = existing_session(&state, staged.session_id.as_deref())?;
            Ok((session_id, staged))
        });
    let (session_id, staged) = match staged {
        Ok(ok) => ok,
        Err(e) => {
            state.storage.discard(&staging).await?;
            return Err(e);
        }
    };

    state
        .storage
        .adopt_staged(&staging, &state.storage.image_dir(&session_id), &staged.uploaded)
        .await?;

    state.sessions.record_images(&session_id, &staged.uploaded);
    tracing::info!(
        session_id = %session_id,
        uploaded = staged.uploaded.len(),
        skipped = staged.skipped.len(),
        "Images uploaded"
    );

    Ok(Json(UploadImagesResponse {
        message: format!("Successfully uploaded {} images", staged.uploaded.len()),
        uploaded_files: staged.uploaded,
        skipped_files: staged.skipped,
        session_id: session_id.to_string(),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadZipResponse {
    pub message: String,
    pub extracted_files: Vec<String>,
    pub skipped_files: Vec<String>,
    pub session_id: String,
}

/// Extract the images of an uploaded ZIP archive into the session.
async fn upload_images_zip(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadZipResponse>> {
    let mut form = UploadForm::read(multipart, state.config.max_file_size_bytes(), 1).await?;
    let session_id = existing_session(&state, form.session_id.as_deref())?;
    let file = form.single_file()?;

    if !sniff::is_zip_name(&file.filename) {
        return Err(AppError::BadRequest("Only ZIP files are supported".to_string()));
    }
    if !sniff::is_zip_content(&file.bytes) {
        return Err(AppError::BadRequest("Invalid ZIP file".to_string()));
    }

    let dest = state.storage.image_dir(&session_id);
    let max_images = state.config.max_images_per_upload;
    let max_entry_bytes = state.config.max_file_size_bytes() as u64;

    let outcome = tokio::task::spawn_blocking(move || {
        archive::extract_images(&file.bytes, &dest, max_images, max_entry_bytes)
    })
    .await??;

    state
        .sessions
        .record_images(&session_id, &outcome.extracted);
    tracing::info!(
        session_id = %session_id,
        extracted = outcome.extracted.len(),
        skipped = outcome.skipped.len(),
        "Image archive extracted"
    );

    Ok(Json(UploadZipResponse {
        message: format!(
            "Successfully extracted {} images from ZIP",
            outcome.extracted.len()
        ),
        extracted_files: outcome.extracted,
        skipped_files: outcome.skipped,
        session_id: session_id.to_string(),
    }))
}
