// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use plantdb_api::config::Config;
use plantdb_api::routes::create_router;
use plantdb_api::AppState;
use serde_json::Value;
use std::io::{Cursor, Write};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Router plus state over a throwaway data directory.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub dir: TempDir,
}

/// Create a test app with the default test config.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

/// Create a test app, adjusting the config first.
#[allow(dead_code)]
pub async fn create_test_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::test_default();
    config.data_dir = dir.path().to_path_buf();
    adjust(&mut config);

    let state = Arc::new(AppState::new(config));
    state
        .storage
        .ensure_layout()
        .await
        .expect("Failed to create scaffold");

    TestApp {
        router: create_router(state.clone()),
        state,
        dir,
    }
}

/// Send a request and decode the JSON body (Null when the body is not JSON).
#[allow(dead_code)]
pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Hand-built multipart/form-data body.
#[allow(dead_code)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

#[allow(dead_code)]
impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "plantdb-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        write!(
            self.body,
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            self.boundary, name, value
        )
        .unwrap();
        self
    }

    pub fn file(mut self, name: &str, filename: &str, bytes: &[u8]) -> Self {
        write!(
            self.body,
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            self.boundary, name, filename
        )
        .unwrap();
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn post(mut self, uri: &str) -> Request<Body> {
        write!(self.body, "--{}--\r\n", self.boundary).unwrap();
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

/// A small PNG image.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// A ZIP archive holding the given entries.
#[allow(dead_code)]
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use zip::write::{FileOptions, ZipWriter};

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file::<_, ()>(*name, FileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Survey workbook: a title in A1, a blank row, then the table at B3.
///
/// Sheet "Plants" (0-based): header row 2, columns 1..=8.
#[allow(dead_code)]
pub fn survey_workbook() -> Vec<u8> {
    use rust_xlsxwriter::Workbook;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Plants").unwrap();
    sheet.write_string(0, 0, "Field survey 2024").unwrap();

    let headers = [
        "Ref Photo",
        "Species Name",
        "Family",
        "Y_Proj",
        "X_Proj",
        "Altitude",
        "Slope",
        "Exposure",
    ];
    for (i, h) in headers.iter().enumerate() {
        sheet.write_string(2, 1 + i as u16, *h).unwrap();
    }

    // IMG_001 -> IMG_001.png (exact), photo_002 -> 002.png (partial),
    // 3 -> plant_3.png (partial), NOPE_999 has no photo.
    let rows: [(&str, &str, &str, f64, f64, f64, Option<f64>, &str); 4] = [
        ("IMG_001", "Quercus agrifolia", "Fagaceae", 4150000.5, 560000.25, 120.0, Some(12.0), "N"),
        ("photo_002", "Salvia mellifera", "Lamiaceae", 4150010.0, 560010.0, 95.0, None, "S"),
        ("", "Arbutus menziesii", "Ericaceae", 4150020.0, 560020.0, 310.0, Some(3.5), "E"),
        ("NOPE_999", "Nobody", "Nullaceae", 1.0, 1.0, 1.0, None, "W"),
    ];
    for (offset, (reference, species, family, y, x, alt, slope, exposure)) in
        rows.iter().enumerate()
    {
        let r = 3 + offset as u32;
        if reference.is_empty() {
            sheet.write_number(r, 1, 3.0).unwrap();
        } else {
            sheet.write_string(r, 1, *reference).unwrap();
        }
        sheet.write_string(r, 2, *species).unwrap();
        sheet.write_string(r, 3, *family).unwrap();
        sheet.write_number(r, 4, *y).unwrap();
        sheet.write_number(r, 5, *x).unwrap();
        sheet.write_number(r, 6, *alt).unwrap();
        if let Some(slope) = slope {
            sheet.write_number(r, 7, *slope).unwrap();
        }
        sheet.write_string(r, 8, *exposure).unwrap();
    }

    let notes = workbook.add_worksheet();
    notes.set_name("Notes").unwrap();
    notes.write_string(0, 0, "collected by the spring crew").unwrap();

    workbook.save_to_buffer().unwrap()
}

/// Upload the survey workbook for `session_id`.
#[allow(dead_code)]
pub async fn upload_survey(app: &TestApp, session_id: &str) {
    let request = MultipartBody::new()
        .text("session_id", session_id)
        .file("file", "survey.xlsx", &survey_workbook())
        .post("/upload/excel");
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

/// Upload the three survey photos for `session_id`.
#[allow(dead_code)]
pub async fn upload_survey_photos(app: &TestApp, session_id: &str) {
    let png = png_bytes(4, 3);
    let request = MultipartBody::new()
        .text("session_id", session_id)
        .file("files", "IMG_001.png", &png)
        .file("files", "002.png", &png)
        .file("files", "plant_3.png", &png)
        .post("/upload/images");
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}
