// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Preview, processing and result routes.

use crate::error::{AppError, Result};
use crate::models::{ExcelPreview, PlantDatabase, ProcessingStatus, SessionId};
use crate::routes::form::FormFields;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

// Largest sheet the xlsx format allows.
const MAX_SHEET_ROW: usize = 1_048_575;
const MAX_SHEET_COL: usize = 16_383;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/preview/excel/{session_id}", get(preview_excel))
        .route("/process/data", post(process_data))
        .route("/data/{session_id}", get(get_plant_data))
        .route("/status/{session_id}", get(get_status))
}

/// Look up a session or fail with 404.
pub(crate) fn load_session(state: &AppState, raw_id: &str) -> Result<(SessionId, ProcessingStatus)> {
    let session_id = SessionId::parse(raw_id)?;
    let status = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    Ok((session_id, status))
}

fn uploaded_excel_path(status: &ProcessingStatus) -> Result<String> {
    status
        .excel_path
        .clone()
        .filter(|_| status.excel_uploaded)
        .ok_or_else(|| AppError::BadRequest("Excel file not uploaded".to_string()))
}

// ─── Preview ─────────────────────────────────────────────────

/// Raw view of the uploaded spreadsheet so the client can locate the table.
async fn preview_excel(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ExcelPreview>> {
    let (session_id, status) = load_session(&state, &session_id)?;
    let path = uploaded_excel_path(&status)?;

    let excel = state.excel.clone();
    let preview = tokio::task::spawn_blocking(move || excel.preview(path)).await??;

    tracing::debug!(session_id = %session_id, sheets = preview.sheet_names.len(), "Preview served");
    Ok(Json(preview))
}

// ─── Processing ──────────────────────────────────────────────

/// Processing request, sent as a multipart or urlencoded form.
#[derive(Debug, Validate)]
pub struct ProcessDataForm {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
    #[validate(range(max = MAX_SHEET_ROW))]
    pub start_row: usize,
    #[validate(range(max = MAX_SHEET_COL))]
    pub start_col: usize,
    #[validate(length(min = 1, max = 255))]
    pub ref_photo_column: String,
    #[validate(length(min = 1, max = 31))]
    pub sheet_name: Option<String>,
}

impl TryFrom<FormFields> for ProcessDataForm {
    type Error = AppError;

    fn try_from(fields: FormFields) -> Result<Self> {
        let index = |name: &str| -> Result<usize> {
            fields.require(name)?.trim().parse().map_err(|_| {
                AppError::BadRequest(format!("{name} must be a non-negative integer"))
            })
        };

        let form = Self {
            session_id: fields.require("session_id")?.trim().to_string(),
            start_row: index("start_row")?,
            start_col: index("start_col")?,
            ref_photo_column: fields.require("ref_photo_column")?.trim().to_string(),
            sheet_name: fields.optional("sheet_name").map(str::to_string),
        };

        form.validate()
            .map_err(|e| AppError::BadRequest(format!("Invalid form: {e}")))?;
        Ok(form)
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProcessDataResponse {
    pub message: String,
    pub database: PlantDatabase,
    pub session_id: String,
}

/// Map spreadsheet rows to images and publish the resulting database.
async fn process_data(
    State(state): State<Arc<AppState>>,
    fields: FormFields,
) -> Result<Json<ProcessDataResponse>> {
    let form = ProcessDataForm::try_from(fields)?;
    let (session_id, status) = load_session(&state, &form.session_id)?;

    if !status.excel_uploaded || !status.images_uploaded {
        return Err(AppError::BadRequest(
            "Both Excel and images must be uploaded first".to_string(),
        ));
    }
    let excel_path = uploaded_excel_path(&status)?;

    tracing::info!(
        session_id = %session_id,
        start_row = form.start_row,
        start_col = form.start_col,
        ref_photo_column = %form.ref_photo_column,
        "Processing session"
    );

    let worker_state = state.clone();
    let worker_session = session_id.clone();
    let database = tokio::task::spawn_blocking(move || -> Result<PlantDatabase> {
        let table = worker_state.excel.extract_table(
            excel_path,
            form.start_row,
            form.start_col,
            form.sheet_name.as_deref(),
        )?;
        let images = worker_state
            .images
            .scan(worker_state.storage.image_dir(&worker_session));
        Ok(worker_state
            .mapper
            .map(&table, &images, &form.ref_photo_column, &worker_session)?)
    })
    .await??;

    let output_path = state.storage.write_database(&session_id, &database).await?;
    let published = state.storage.publish_images(&session_id).await?;
    state.sessions.complete(
        &session_id,
        &output_path.to_string_lossy(),
        database.plants.len(),
    );

    tracing::info!(
        session_id = %session_id,
        plants = database.plants.len(),
        published,
        "Session processed"
    );

    Ok(Json(ProcessDataResponse {
        message: "Data processed successfully".to_string(),
        database,
        session_id: session_id.to_string(),
    }))
}

// ─── Results ─────────────────────────────────────────────────

/// Processed plant database for a session.
async fn get_plant_data(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<PlantDatabase>> {
    let (session_id, status) = load_session(&state, &session_id)?;
    if !status.processing_complete {
        return Err(AppError::BadRequest(
            "Data processing not complete".to_string(),
        ));
    }

    state
        .storage
        .read_database(&session_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Processed data not found".to_string()))
}

/// Processing status for a session.
async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ProcessingStatus>> {
    let (_, status) = load_session(&state, &session_id)?;
    Ok(Json(status))
}
