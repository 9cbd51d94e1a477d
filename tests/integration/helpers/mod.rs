// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use distillrs::application::scrape::{ScrapeOptions, ScrapeService};
use distillrs::config::settings::Settings;
use distillrs::content::rules::PatternRules;
use distillrs::engines::reqwest_engine::ReqwestFetcher;
use distillrs::infrastructure::storage::InMemoryAssetStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 足够长、带逗号的段落，保证被正文提取选中
pub const PARAGRAPH: &str = "The committee met on Tuesday to review the proposal, and after a long \
discussion, the members agreed that the plan should move forward with several changes, \
including a revised budget and a longer timeline for the second phase of construction.";

/// 使用真实抓取器和内存存储的抓取服务
pub fn create_test_service() -> ScrapeService {
    let settings = Settings::with_defaults().expect("default settings");
    let fetcher = ReqwestFetcher::new(&settings.fetch).expect("fetcher");
    ScrapeService::new(
        Arc::new(fetcher),
        Arc::new(InMemoryAssetStore::new()),
        Arc::new(PatternRules::builtin().expect("builtin rules")),
        ScrapeOptions {
            download_images: true,
            ..ScrapeOptions::default()
        },
    )
}

/// 挂载一个HTML页面
pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// 挂载一个二进制资源
pub async fn mount_asset(server: &MockServer, route: &str, content_type: &str, data: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_bytes(data.to_vec()),
        )
        .mount(server)
        .await;
}

/// 由若干段落组成的正文
pub fn paragraphs(n: usize) -> String {
    (0..n).map(|i| format!("<p>{} ({})</p>", PARAGRAPH, i)).collect()
}
