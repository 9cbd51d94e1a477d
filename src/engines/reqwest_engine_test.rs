// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::config::settings::Settings;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> ReqwestFetcher {
    let settings = Settings::with_defaults().unwrap();
    ReqwestFetcher::new(&settings.fetch).unwrap()
}

#[tokio::test]
async fn test_reqwest_fetcher_basic_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<html><body>Test content</body></html>"),
        )
        .mount(&server)
        .await;

    let response = fetcher()
        .fetch(&format!("{}/test", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.body.contains("Test content"));
    assert!(response.content_type.contains("text/html"));
    assert!(response.final_url.ends_with("/test"));
}

#[tokio::test]
async fn test_reqwest_fetcher_reports_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/error", server.uri());
    let response = fetcher().fetch(&url).await.unwrap();
    assert_eq!(response.status, 500);

    let asset = fetcher().fetch_asset(&url).await;
    assert!(matches!(asset, Err(EngineError::Status { status: 500, .. })));
}

#[tokio::test]
async fn test_reqwest_fetcher_downloads_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .mount(&server)
        .await;

    let asset = fetcher()
        .fetch_asset(&format!("{}/a.png", server.uri()))
        .await
        .unwrap();

    assert_eq!(asset.content_type, "image/png");
    assert_eq!(asset.data, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_reqwest_fetcher_rejects_invalid_url() {
    let result = fetcher().fetch("not a url").await;
    assert!(matches!(result, Err(EngineError::InvalidUrl(_))));
}
