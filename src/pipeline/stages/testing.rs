// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::models::task::Task;
use crate::engines::traits::{AssetResponse, EngineError, FetchResponse, Fetcher};
use crate::infrastructure::storage::InMemoryAssetStore;

/// 按URL返回预设内容的抓取器
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, FetchResponse>,
    assets: HashMap<String, AssetResponse>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: &str) -> Self {
        self.page_with(url, url, 200, body)
    }

    pub fn page_with(mut self, url: &str, final_url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchResponse {
                final_url: final_url.to_string(),
                status,
                content_type: "text/html".to_string(),
                body: body.to_string(),
            },
        );
        self
    }

    pub fn asset(mut self, url: &str, content_type: &str, data: &[u8]) -> Self {
        self.assets.insert(
            url.to_string(),
            AssetResponse {
                content_type: content_type.to_string(),
                data: data.to_vec(),
            },
        );
        self
    }

    /// 按请求顺序记录的URL
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, EngineError> {
        self.requests.lock().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| EngineError::Status {
            status: 404,
            url: url.to_string(),
        })
    }

    async fn fetch_asset(&self, url: &str) -> Result<AssetResponse, EngineError> {
        self.requests.lock().push(url.to_string());
        self.assets.get(url).cloned().ok_or_else(|| EngineError::Status {
            status: 404,
            url: url.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn new_task(url: &str) -> Task {
    Task::new(url, Arc::new(InMemoryAssetStore::new()))
}
