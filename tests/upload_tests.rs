// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upload endpoint tests: validation, content sniffing and limits.

use axum::http::StatusCode;
use common::{png_bytes, send, survey_workbook, zip_bytes, MultipartBody};

mod common;

#[tokio::test]
async fn test_excel_upload_starts_session() {
    let app = common::create_test_app().await;

    let request = MultipartBody::new()
        .file("file", "survey.xlsx", &survey_workbook())
        .text("session_id", "sess-1")
        .post("/upload/excel");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Excel file uploaded successfully");
    assert_eq!(body["session_id"], "sess-1");
    assert!(app.dir.path().join("uploads/excel/sess-1/survey.xlsx").is_file());

    let (status, body) = send(&app, common::get("/status/sess-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["excel_uploaded"], true);
    assert_eq!(body["excel_filename"], "survey.xlsx");
    assert_eq!(body["images_uploaded"], false);
}

#[tokio::test]
async fn test_excel_upload_rejects_other_extensions() {
    let app = common::create_test_app().await;

    let request = MultipartBody::new()
        .text("session_id", "sess-1")
        .file("file", "survey.csv", b"a,b,c\n")
        .post("/upload/excel");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Only Excel files are supported");
}

#[tokio::test]
async fn test_excel_upload_rejects_forged_content() {
    let app = common::create_test_app().await;

    let request = MultipartBody::new()
        .text("session_id", "sess-1")
        .file("file", "survey.xlsx", &png_bytes(2, 2))
        .post("/upload/excel");
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn test_excel_upload_rejects_bad_session_id() {
    let app = common::create_test_app().await;

    let request = MultipartBody::new()
        .text("session_id", "../escape")
        .file("file", "survey.xlsx", &survey_workbook())
        .post("/upload/excel");
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!app.dir.path().join("uploads/escape").exists());
}

#[tokio::test]
async fn test_excel_upload_requires_session_id() {
    let app = common::create_test_app().await;

    let request = MultipartBody::new()
        .file("file", "survey.xlsx", &survey_workbook())
        .post("/upload/excel");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Missing form field: session_id");
}

#[tokio::test]
async fn test_file_size_limit() {
    let app = common::create_test_app_with(|config| config.max_file_size_mb = 1).await;
    let oversized = vec![0u8; 1024 * 1024 + 1];

    let request = MultipartBody::new()
        .text("session_id", "sess-1")
        .file("file", "survey.xlsx", &oversized)
        .post("/upload/excel");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "payload_too_large");
}

#[tokio::test]
async fn test_images_require_existing_session() {
    let app = common::create_test_app().await;

    let request = MultipartBody::new()
        .text("session_id", "unknown")
        .file("files", "IMG_001.png", &png_bytes(2, 2))
        .post("/upload/images");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Session not found. Upload Excel file first.");
}

#[tokio::test]
async fn test_images_skip_unsupported_files() {
    let app = common::create_test_app().await;
    common::upload_survey(&app, "sess-1").await;
    let png = png_bytes(2, 2);

    let request = MultipartBody::new()
        .text("session_id", "sess-1")
        .file("files", "IMG_001.png", &png)
        .file("files", "notes.txt", b"field notes")
        .file("files", "fake.jpg", b"definitely text")
        .post("/upload/images");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully uploaded 1 images");
    assert_eq!(body["uploaded_files"], serde_json::json!(["IMG_001.png"]));
    assert_eq!(body["skipped_files"], serde_json::json!(["notes.txt", "fake.jpg"]));
    assert!(app.dir.path().join("uploads/images/sess-1/IMG_001.png").is_file());
    assert!(!app.dir.path().join("uploads/images/sess-1/fake.jpg").exists());

    let (_, status) = send(&app, common::get("/status/sess-1")).await;
    assert_eq!(status["images_uploaded"], true);
    assert_eq!(status["image_count"], 1);
}

#[tokio::test]
async fn test_images_count_limit() {
    let app = common::create_test_app_with(|config| config.max_images_per_upload = 2).await;
    common::upload_survey(&app, "sess-1").await;
    let png = png_bytes(2, 2);

    let request = MultipartBody::new()
        .text("session_id", "sess-1")
        .file("files", "a.png", &png)
        .file("files", "b.png", &png)
        .file("files", "c.png", &png)
        .post("/upload/images");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Too many files: at most 2 per upload");
    assert_eq!(staged_uploads(&app), 0);
    assert!(!app.dir.path().join("uploads/images/sess-1/a.png").exists());
}

/// Request directories still sitting in the upload staging area.
fn staged_uploads(app: &common::TestApp) -> usize {
    std::fs::read_dir(app.dir.path().join("uploads/.staging"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_images_session_id_after_files() {
    let app = common::create_test_app().await;
    common::upload_survey(&app, "sess-1").await;
    let png = png_bytes(2, 2);

    let request = MultipartBody::new()
        .file("files", "IMG_001.png", &png)
        .file("files", "IMG_001.png", &png)
        .file("files", "002.png", &png)
        .text("session_id", "sess-1")
        .post("/upload/images");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uploaded_files"], serde_json::json!(["IMG_001.png", "002.png"]));
    assert!(app.dir.path().join("uploads/images/sess-1/002.png").is_file());
    assert_eq!(staged_uploads(&app), 0);
}

#[tokio::test]
async fn test_images_unknown_session_leaves_nothing_behind() {
    let app = common::create_test_app().await;

    let request = MultipartBody::new()
        .file("files", "IMG_001.png", &png_bytes(2, 2))
        .text("session_id", "ghost")
        .post("/upload/images");
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(staged_uploads(&app), 0);
    assert!(!app.dir.path().join("uploads/images/ghost").exists());
}

#[tokio::test]
async fn test_zip_upload_extracts_images() {
    let app = common::create_test_app().await;
    common::upload_survey(&app, "sess-1").await;
    let png = png_bytes(2, 2);
    let archive = zip_bytes(&[
        ("field/IMG_001.png", png.as_slice()),
        ("field/002.png", png.as_slice()),
        ("field/readme.txt", &b"hi"[..]),
    ]);

    let request = MultipartBody::new()
        .text("session_id", "sess-1")
        .file("file", "photos.zip", &archive)
        .post("/upload/images-zip");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully extracted 2 images from ZIP");
    assert_eq!(
        body["extracted_files"],
        serde_json::json!(["IMG_001.png", "002.png"])
    );
    assert_eq!(body["skipped_files"], serde_json::json!(["field/readme.txt"]));

    let image_dir = app.dir.path().join("uploads/images/sess-1");
    assert!(image_dir.join("IMG_001.png").is_file());
    assert!(!image_dir.join("photos.zip").exists());
    assert!(!image_dir.join("field").exists());
}

#[tokio::test]
async fn test_zip_upload_validation() {
    let app = common::create_test_app().await;
    common::upload_survey(&app, "sess-1").await;

    let request = MultipartBody::new()
        .text("session_id", "sess-1")
        .file("file", "photos.rar", b"Rar!")
        .post("/upload/images-zip");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Only ZIP files are supported");

    let request = MultipartBody::new()
        .text("session_id", "sess-1")
        .file("file", "photos.zip", b"not a zip at all")
        .post("/upload/images-zip");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Invalid ZIP file");
}
