// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{create_test_service, mount_page, paragraphs};

const AMP_RUNTIME: &str = "https://cdn.ampproject.org/v0.js";

#[tokio::test]
async fn test_longer_amp_alternate_wins() {
    // Given: 正文被截断的页面，AMP版本包含完整正文
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/story",
        format!(
            r#"<html><head><title>Story</title><link rel="amphtml" href="/story.amp"></head>
            <body><article>{}<p>Subscribe to continue reading.</p></article></body></html>"#,
            paragraphs(1)
        ),
    )
    .await;
    mount_page(
        &server,
        "/story.amp",
        format!(
            r#"<html><head><title>Story</title><link rel="canonical" href="/story">
            <script async src="{}"></script></head>
            <body><article>{}</article><amp-ad width="300" height="250">ad</amp-ad></body></html>"#,
            AMP_RUNTIME,
            paragraphs(5)
        ),
    )
    .await;

    // When: 抓取普通页面
    let task = create_test_service()
        .scrape(&format!("{}/story", base))
        .await
        .unwrap();

    // Then: 使用AMP版本的正文和地址
    assert_eq!(task.actual_url.as_deref(), Some(format!("{}/story.amp", base).as_str()));
    assert_eq!(task.alt_url.as_deref(), Some(format!("{}/story.amp", base).as_str()));
    let html = task.html();
    assert!(html.contains("(4)"));
    assert!(!html.contains("Subscribe to continue reading"));
    assert!(!html.contains("amp-ad"));
}

#[tokio::test]
async fn test_amp_entry_fetches_canonical() {
    // Given: 从AMP地址开始，规范页面的正文更长
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/news.amp",
        format!(
            r#"<html><head><link rel="canonical" href="/news"><script async src="{}"></script></head>
            <body><article>{}</article></body></html>"#,
            AMP_RUNTIME,
            paragraphs(1)
        ),
    )
    .await;
    mount_page(
        &server,
        "/news",
        format!(
            r#"<html><head><title>News</title></head><body><article>{}</article></body></html>"#,
            paragraphs(4)
        ),
    )
    .await;

    // When: 抓取AMP地址
    let task = create_test_service()
        .scrape(&format!("{}/news.amp", base))
        .await
        .unwrap();

    // Then: 规范页面成为主文档并胜出
    assert_eq!(task.actual_url.as_deref(), Some(format!("{}/news", base).as_str()));
    assert_eq!(task.alt_url.as_deref(), Some(format!("{}/news.amp", base).as_str()));
    assert_eq!(task.title, "News");
    assert!(task.html().contains("(3)"));
}

#[tokio::test]
async fn test_broken_amp_alternate_is_ignored() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/page",
        format!(
            r#"<html><head><title>Page</title><link rel="amphtml" href="/page.amp"></head>
            <body><article>{}</article></body></html>"#,
            paragraphs(2)
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/page.amp"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let task = create_test_service()
        .scrape(&format!("{}/page", base))
        .await
        .unwrap();

    assert_eq!(task.actual_url.as_deref(), Some(format!("{}/page", base).as_str()));
    assert!(task.alt_url.is_none());
    assert!(task.html().contains("(1)"));
}
