// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use distillrs::presentation::renderer::{HtmlRenderer, Renderer};
use distillrs::utils::errors::PipelineError;
use distillrs::utils::url_utils::parse_store_key;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{create_test_service, mount_asset, mount_page, paragraphs, PARAGRAPH};

fn article_page(base: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head>
        <title>Great Article | Example News</title>
        <meta property="og:site_name" content="Example News">
        <meta property="og:image" content="/img/cover.jpg">
        <meta name="description" content="A short summary.">
        <meta property="article:published_time" content="2024-03-01T10:00:00Z">
        <link rel="canonical" href="{base}/article">
        <link rel="alternate" type="application/rss+xml" href="/feed.xml">
        <script>var tracker = 1;</script>
        </head><body>
        <nav><a href="/">Home</a> <a href="/world">Navigation World</a></nav>
        <article>
          <h1>Great Article</h1>
          <p>{p}</p>
          <img src="/img/photo.png" alt="Photo">
          {more}
          <p>Read the <a href="/next">next story</a> for more, as the plan continues to change.</p>
        </article>
        <footer>Copyright Example News</footer>
        </body></html>"#,
        base = base,
        p = PARAGRAPH,
        more = paragraphs(3),
    )
}

#[tokio::test]
async fn test_scrape_article_end_to_end() {
    // Given: 一个带导航、页脚、主图和正文图片的文章页面
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/article", article_page(&base)).await;
    mount_asset(&server, "/img/photo.png", "image/png", b"photo-bytes").await;
    mount_asset(&server, "/img/cover.jpg", "image/jpeg", b"cover-bytes").await;

    // When: 执行完整流水线
    let task = create_test_service()
        .scrape(&format!("{}/article", base))
        .await
        .expect("scrape should succeed");

    // Then: 元数据被提取，标题去掉了站点名
    assert_eq!(task.status_code, Some(200));
    assert_eq!(task.title, "Great Article");
    assert_eq!(task.site_name, "Example News");
    assert_eq!(task.site, "127.0.0.1");
    assert_eq!(task.site_scheme, "http");
    assert_eq!(task.description, "A short summary.");
    assert!(task.pub_date.is_some());
    assert_eq!(task.canonical_url.as_deref(), Some(format!("{}/article", base).as_str()));
    let feeds: Vec<String> = task.feeds().into_iter().map(|f| f.url).collect();
    assert_eq!(feeds, vec![format!("{}/feed.xml", base)]);

    // 正文只保留文章内容，链接被解析为绝对地址
    let html = task.html();
    assert!(html.contains("The committee met on Tuesday"));
    assert!(!html.contains("Navigation World"));
    assert!(!html.contains("Copyright Example News"));
    assert!(!html.contains("tracker"));
    assert!(html.contains(&format!(r#"href="{}/next""#, base)));
    assert!(task.word_count > 100);

    // 两张图片都已下载，地址改写为存储地址
    let images = task.images();
    assert_eq!(images.len(), 2);
    assert!(html.contains(r#"src="store://"#));
    assert!(!html.contains("/img/photo.png"));
    let main_image = task.image_url.clone().expect("main image");
    let key = parse_store_key(&main_image).expect("main image stored");
    let cover = task.get_asset(key).await.unwrap();
    assert_eq!(cover.data, b"cover-bytes");
    assert_eq!(cover.content_type, "image/jpeg");
}

#[tokio::test]
async fn test_rendered_page_inlines_images() {
    // Given: 已完成抓取的文章
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/article", article_page(&base)).await;
    mount_asset(&server, "/img/photo.png", "image/png", b"photo-bytes").await;
    mount_asset(&server, "/img/cover.jpg", "image/jpeg", b"cover-bytes").await;
    let task = create_test_service()
        .scrape(&format!("{}/article", base))
        .await
        .unwrap();

    // When: 渲染为HTML
    let renderer = HtmlRenderer::new();
    let page = String::from_utf8(renderer.render(&task).await.unwrap()).unwrap();

    // Then: 图片以 data URI 内联，页脚指向原始页面
    assert_eq!(renderer.content_type(), "text/html; charset=utf-8");
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<title>Great Article</title>"));
    assert!(page.contains("src=\"data:image/png;base64,cGhvdG8tYnl0ZXM=\""));
    assert!(!page.contains("store://"));
    assert!(page.contains(&format!(
        r#"<a href="{}/article" title="Great Article">view original site</a>"#,
        base
    )));
}

#[tokio::test]
async fn test_missing_image_keeps_original_src() {
    let server = MockServer::start().await;
    let base = server.uri();
    let body = format!(
        r#"<html><head><title>Photos</title></head><body><article>{}<img src="/img/gone.png" alt="Gone"></article></body></html>"#,
        paragraphs(3)
    );
    mount_page(&server, "/photos", body).await;
    Mock::given(method("GET"))
        .and(path("/img/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let task = create_test_service()
        .scrape(&format!("{}/photos", base))
        .await
        .unwrap();

    assert!(task.images().is_empty());
    assert!(task.html().contains(&format!(r#"src="{}/img/gone.png""#, base)));
}

#[tokio::test]
async fn test_http_error_fails_scrape() {
    // Given: 返回404的页面
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html><body>Not found</body></html>"))
        .mount(&server)
        .await;

    // When: 抓取
    let result = create_test_service()
        .scrape(&format!("{}/missing", server.uri()))
        .await;

    // Then: 返回状态码错误
    match result {
        Err(PipelineError::HttpStatus { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected HTTP status error, got {:?}", other.map(|t| t.url)),
    }
}

#[tokio::test]
async fn test_empty_page_fails_scrape() {
    let server = MockServer::start().await;
    mount_page(&server, "/blank", "   \n ".to_string()).await;

    let result = create_test_service()
        .scrape(&format!("{}/blank", server.uri()))
        .await;

    assert!(matches!(result, Err(PipelineError::EmptyDocument(_))));
}

#[tokio::test]
async fn test_meta_refresh_is_followed() {
    // Given: 通过 meta refresh 跳转到文章的页面
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/short",
        r#"<html><head><meta http-equiv="Refresh" content="0; URL='/article'"></head><body></body></html>"#
            .to_string(),
    )
    .await;
    mount_page(&server, "/article", article_page(&base)).await;
    mount_asset(&server, "/img/photo.png", "image/png", b"photo-bytes").await;
    mount_asset(&server, "/img/cover.jpg", "image/jpeg", b"cover-bytes").await;

    // When: 抓取短链接
    let task = create_test_service()
        .scrape(&format!("{}/short", base))
        .await
        .unwrap();

    // Then: 内容来自跳转后的页面
    assert_eq!(task.actual_url.as_deref(), Some(format!("{}/article", base).as_str()));
    assert_eq!(task.title, "Great Article");
    assert!(task.html().contains("The committee met on Tuesday"));
}
