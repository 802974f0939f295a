// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Published image serving and session deletion.

use crate::error::{AppError, Result};
use crate::models::SessionId;
use crate::routes::process::load_session;
use crate::services::{cleanup, sniff};
use crate::storage::sanitize_filename;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/image/{session_id}/{filename}", get(get_image))
        .route("/session/{session_id}", delete(cleanup_session))
}

/// Serve a published image with a content type sniffed from its bytes.
async fn get_image(
    State(state): State<Arc<AppState>>,
    Path((session_id, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::NotFound("Image not found".to_string());

    let session_id = SessionId::parse(&session_id)?;
    let filename = sanitize_filename(&filename)
        .filter(|clean| *clean == filename)
        .ok_or_else(not_found)?;

    let path = state.storage.static_dir(&session_id).join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(e.into()),
    };

    let content_type = sniff::image_mime(&bytes).unwrap_or("application/octet-stream");
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CleanupResponse {
    pub message: String,
}

/// Delete every file and the status of a session.
async fn cleanup_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<CleanupResponse>> {
    let (session_id, _) = load_session(&state, &session_id)?;
    cleanup::purge_session(&state, &session_id).await?;

    Ok(Json(CleanupResponse {
        message: "Session cleaned up successfully".to_string(),
    }))
}
