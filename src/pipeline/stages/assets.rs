// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::models::task::{ImageInfo, Task};
use crate::engines::traits::Fetcher;
use crate::pipeline::{Outcome, Stage};
use crate::utils::url_utils::{parse_store_key, scheme_of, store_url};

/// 默认并行下载数
pub const DEFAULT_CONCURRENCY: usize = 4;

/// 图片下载阶段
///
/// 正文中的图片和文章主图并发下载到资源存储。全部下载结束后，
/// 再把成功下载的图片地址改写为 `store://<key>`；单张图片失败只记录日志，
/// 对应的 `img` 保持不变。
pub struct DownloadImagesStage {
    fetcher: Arc<dyn Fetcher>,
    concurrency: usize,
}

impl DownloadImagesStage {
    pub fn new(fetcher: Arc<dyn Fetcher>, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// 下载一张图片并写入存储，返回存储键
    async fn download(&self, task: &Task, src: &str) -> Option<String> {
        let url = match task.resolve_url(src) {
            Ok(url) => url,
            Err(e) => {
                warn!(task = %task.id, module = "assets", src = %src, error = %e, "Failed to resolve image URL");
                return None;
            }
        };
        let response = match self.fetcher.fetch_asset(&url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(task = %task.id, module = "assets", url = %url, error = %e, "Failed to download image");
                return None;
            }
        };

        let key = Uuid::new_v4().to_string();
        let info = ImageInfo {
            key: key.clone(),
            content_type: response.content_type,
            original_url: url.clone(),
            content_url: store_url(&key),
        };
        match task.add_image(info, &response.data).await {
            Ok(true) => {
                debug!(task = %task.id, module = "assets", url = %url, key = %key, bytes = response.data.len(), "Stored image");
                Some(key)
            }
            // 同一地址已经下载过
            Ok(false) => task
                .images()
                .into_iter()
                .find(|i| i.original_url == url)
                .map(|i| i.key),
            Err(e) => {
                warn!(task = %task.id, module = "assets", url = %url, error = %e, "Failed to store image");
                None
            }
        }
    }
}

/// 需要下载的图片地址，按出现顺序去重
fn image_sources(task: &Task) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    let mut push = |src: &str| {
        let src = src.trim();
        if src.is_empty() || parse_store_key(src).is_some() || scheme_of(src).as_deref() == Some("data") {
            return;
        }
        if !sources.iter().any(|s| s == src) {
            sources.push(src.to_string());
        }
    };

    if let Some(doc) = task.document.as_ref() {
        for img in doc.select(&["img"]) {
            if let Some(src) = doc.attr(img, "src") {
                push(src);
            }
        }
    }
    if let Some(image) = task.image_url.as_deref() {
        push(image);
    }
    sources
}

#[async_trait]
impl Stage for DownloadImagesStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "assets", "Download images");

        let sources = image_sources(task);
        if sources.is_empty() {
            return Outcome::Continue;
        }

        let shared: &Task = &*task;
        let stored: HashMap<String, String> = stream::iter(sources)
            .map(|src| async move {
                let key = self.download(shared, &src).await;
                (src, key)
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|(src, key)| async move { key.map(|k| (src, k)) })
            .collect()
            .await;

        // 所有下载都已结束，此后才读取和改写任务
        if let Some(doc) = task.document.as_mut() {
            for img in doc.select(&["img"]) {
                let key = doc
                    .attr(img, "src")
                    .and_then(|src| stored.get(src.trim()))
                    .cloned();
                if let Some(key) = key {
                    doc.set_attr(img, "src", &store_url(&key));
                }
            }
        }
        if let Some(key) = task
            .image_url
            .as_deref()
            .and_then(|src| stored.get(src.trim()))
        {
            task.image_url = Some(store_url(key));
        }

        info!(task = %task.id, module = "assets", images = stored.len(), "Downloaded images");
        Outcome::Continue
    }

    fn name(&self) -> &str {
        "assets"
    }
}
