// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CORS behavior for the wildcard and explicit origin configurations.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request};
use tower::ServiceExt;

mod common;

async fn headers_for(app: &common::TestApp, method: Method, origin: &str) -> HeaderMap {
    let mut request = Request::builder()
        .method(method.clone())
        .uri("/health")
        .header(header::ORIGIN, origin);
    if method == Method::OPTIONS {
        request = request.header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST");
    }
    let response = app
        .router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    response.headers().clone()
}

#[tokio::test]
async fn test_listed_origin_gets_credentials() {
    let app = common::create_test_app().await;

    let headers = headers_for(&app, Method::GET, "http://localhost:3000").await;

    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_unlisted_origin_is_not_allowed() {
    let app = common::create_test_app().await;

    let headers = headers_for(&app, Method::GET, "https://evil.example").await;

    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_wildcard_origin_without_credentials() {
    let app =
        common::create_test_app_with(|config| config.cors_origins = vec!["*".to_string()]).await;

    let headers = headers_for(&app, Method::GET, "https://anywhere.example").await;

    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
}

#[tokio::test]
async fn test_preflight_allows_post() {
    let app = common::create_test_app().await;

    let headers = headers_for(&app, Method::OPTIONS, "http://localhost:3000").await;

    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"), "{methods}");
    assert!(methods.contains("DELETE"), "{methods}");
}
