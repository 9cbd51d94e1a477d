// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::document::DocumentModel;
use crate::domain::repositories::asset_repository::{AssetStore, StorageError, StoredAsset};

/// 图片记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// 存储键
    pub key: String,
    /// 内容类型
    pub content_type: String,
    /// 原始URL
    pub original_url: String,
    /// 存储后的URL（`store://<key>`）
    pub content_url: String,
}

/// 订阅源记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedInfo {
    pub url: String,
    pub title: String,
}

/// 附件记录（音频、视频等）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclosure {
    /// 附件类型，如 `audio`
    pub kind: String,
    pub title: String,
    pub url: String,
    pub content_type: String,
    pub description: String,
}

/// 任务实体
///
/// 一次抓取作业的全部状态。任务创建时只有URL，由流水线各阶段逐步填充，
/// 完成后交给渲染器或直接丢弃。
///
/// 除 `images`、`feeds`、`enclosures` 外的字段同一时刻只由一个阶段写入；
/// 这三个集合可能被并发的下载任务追加，因此由任务内部的互斥锁保护，
/// 并按原始URL去重。
pub struct Task {
    /// 任务唯一标识符，重启时保持不变
    pub id: Uuid,
    /// 请求的URL
    pub url: String,
    /// 重定向后实际获取的URL
    pub actual_url: Option<String>,
    /// 页面声明的规范URL
    pub canonical_url: Option<String>,
    /// HTTP状态码
    pub status_code: Option<u16>,
    pub title: String,
    pub description: String,
    pub author: String,
    pub pub_date: Option<DateTime<Utc>>,
    /// 站点主机名（不含 `www.`）
    pub site: String,
    pub site_scheme: String,
    pub site_name: String,
    /// 文章主图URL
    pub image_url: Option<String>,
    /// 任务创建时间
    pub retrieved: DateTime<Utc>,
    pub word_count: usize,
    /// 主文档，抓取成功后存在
    pub document: Option<DocumentModel>,
    /// 备用（AMP）文档
    pub alt_document: Option<DocumentModel>,
    /// 备用文档的URL
    pub alt_url: Option<String>,
    store: Arc<dyn AssetStore>,
    images: Mutex<Vec<ImageInfo>>,
    feeds: Mutex<Vec<FeedInfo>>,
    enclosures: Mutex<Vec<Enclosure>>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("actual_url", &self.actual_url)
            .field("title", &self.title)
            .field("word_count", &self.word_count)
            .field("images", &self.images.lock().len())
            .finish_non_exhaustive()
    }
}

impl Task {
    /// 创建只包含URL的新任务
    pub fn new(url: impl Into<String>, store: Arc<dyn AssetStore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            actual_url: None,
            canonical_url: None,
            status_code: None,
            title: String::new(),
            description: String::new(),
            author: String::new(),
            pub_date: None,
            site: String::new(),
            site_scheme: String::new(),
            site_name: String::new(),
            image_url: None,
            retrieved: Utc::now(),
            word_count: 0,
            document: None,
            alt_document: None,
            alt_url: None,
            store,
            images: Mutex::new(Vec::new()),
            feeds: Mutex::new(Vec::new()),
            enclosures: Mutex::new(Vec::new()),
        }
    }

    /// 清空所有派生字段，只保留ID、存储和创建时间
    pub fn reset(&mut self) {
        debug!(task = %self.id, url = %self.url, "Reset task state");
        self.url.clear();
        self.actual_url = None;
        self.canonical_url = None;
        self.status_code = None;
        self.title.clear();
        self.description.clear();
        self.author.clear();
        self.pub_date = None;
        self.site.clear();
        self.site_scheme.clear();
        self.site_name.clear();
        self.image_url = None;
        self.word_count = 0;
        self.document = None;
        self.alt_document = None;
        self.alt_url = None;
        self.images.get_mut().clear();
        self.feeds.get_mut().clear();
        self.enclosures.get_mut().clear();
    }

    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    /// 内容的"最佳"URL：实际URL优先，其次规范URL，最后是请求的URL
    pub fn content_url(&self) -> &str {
        self.actual_url
            .as_deref()
            .or(self.canonical_url.as_deref())
            .unwrap_or(self.url.as_str())
    }

    /// 以内容URL为基准解析（可能是相对的）URL
    pub fn resolve_url(&self, href: &str) -> Result<String, url::ParseError> {
        let base = Url::parse(self.content_url())?;
        Ok(base.join(href)?.to_string())
    }

    /// 主文档 `<html>` 元素的内部HTML
    pub fn html(&self) -> String {
        self.document
            .as_ref()
            .map(DocumentModel::document_html)
            .unwrap_or_default()
    }

    /// 解析HTML并替换主文档
    pub fn set_html(&mut self, html: &str) {
        self.document = Some(DocumentModel::parse(html));
    }

    /// 解析HTML并替换备用文档
    pub fn set_alt_html(&mut self, html: &str) {
        self.alt_document = Some(DocumentModel::parse(html));
    }

    /// 保存图片数据并追加图片记录
    ///
    /// 同一原始URL只记录一次，重复时返回 `Ok(false)`。
    pub async fn add_image(&self, info: ImageInfo, data: &[u8]) -> Result<bool, StorageError> {
        if self.has_image(&info.original_url) {
            return Ok(false);
        }
        self.store.put(&info.key, &info.content_type, data).await?;

        let mut images = self.images.lock();
        if images.iter().any(|i| i.original_url == info.original_url) {
            return Ok(false);
        }
        images.push(info);
        Ok(true)
    }

    fn has_image(&self, original_url: &str) -> bool {
        self.images
            .lock()
            .iter()
            .any(|i| i.original_url == original_url)
    }

    /// 图片记录的快照
    pub fn images(&self) -> Vec<ImageInfo> {
        self.images.lock().clone()
    }

    /// 追加订阅源，同一URL只记录一次
    pub fn add_feed(&self, feed: FeedInfo) -> bool {
        let mut feeds = self.feeds.lock();
        if feeds.iter().any(|f| f.url == feed.url) {
            return false;
        }
        feeds.push(feed);
        true
    }

    pub fn feeds(&self) -> Vec<FeedInfo> {
        self.feeds.lock().clone()
    }

    /// 追加附件，同一URL只记录一次
    pub fn add_enclosure(&self, enclosure: Enclosure) -> bool {
        let mut enclosures = self.enclosures.lock();
        if enclosures.iter().any(|e| e.url == enclosure.url) {
            return false;
        }
        enclosures.push(enclosure);
        true
    }

    pub fn enclosures(&self) -> Vec<Enclosure> {
        self.enclosures.lock().clone()
    }

    pub async fn get_asset(&self, key: &str) -> Result<StoredAsset, StorageError> {
        self.store.get(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryAssetStore;

    fn new_task(url: &str) -> Task {
        Task::new(url, Arc::new(InMemoryAssetStore::new()))
    }

    fn image(n: usize) -> ImageInfo {
        ImageInfo {
            key: format!("key-{}", n),
            content_type: "image/png".to_string(),
            original_url: format!("https://example.com/{}.png", n),
            content_url: format!("store://key-{}", n),
        }
    }

    #[test]
    fn test_content_url_preference() {
        let mut task = new_task("https://example.com/a");
        assert_eq!(task.content_url(), "https://example.com/a");

        task.canonical_url = Some("https://example.com/canonical".to_string());
        assert_eq!(task.content_url(), "https://example.com/canonical");

        task.actual_url = Some("https://example.com/actual".to_string());
        assert_eq!(task.content_url(), "https://example.com/actual");
    }

    #[test]
    fn test_resolve_url_against_content_url() {
        let mut task = new_task("https://example.com/a/b");
        task.actual_url = Some("https://other.org/x/y".to_string());
        assert_eq!(task.resolve_url("z.png").unwrap(), "https://other.org/x/z.png");
    }

    #[tokio::test]
    async fn test_reset_keeps_id_and_store() {
        let mut task = new_task("https://example.com/a");
        let id = task.id;
        task.title = "title".to_string();
        task.set_html("<p>x</p>");
        task.add_image(image(1), b"data").await.unwrap();
        task.add_feed(FeedInfo {
            url: "https://example.com/feed".to_string(),
            title: "feed".to_string(),
        });

        task.reset();

        assert_eq!(task.id, id);
        assert!(task.url.is_empty());
        assert!(task.title.is_empty());
        assert!(task.document.is_none());
        assert!(task.images().is_empty());
        assert!(task.feeds().is_empty());
        // 存储内容不随任务重置
        assert!(task.get_asset("key-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_add_image_deduplicates_by_original_url() {
        let task = new_task("https://example.com/a");
        assert!(task.add_image(image(1), b"a").await.unwrap());
        let mut duplicate = image(1);
        duplicate.key = "other".to_string();
        assert!(!task.add_image(duplicate, b"b").await.unwrap());
        assert_eq!(task.images().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_image_appends() {
        // Given: 多个并发写入者共享同一个任务
        let task = Arc::new(new_task("https://example.com/a"));
        let n = 64;

        // When: 每个写入者追加一条不同的图片记录
        let handles: Vec<_> = (0..n)
            .map(|i| {
                let task = Arc::clone(&task);
                tokio::spawn(async move { task.add_image(image(i), b"bytes").await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        // Then: 所有写入完成后恰好有 n 条记录
        let images = task.images();
        assert_eq!(images.len(), n);
        for i in 0..n {
            assert!(task.get_asset(&format!("key-{}", i)).await.is_ok());
        }
    }

    #[test]
    fn test_enclosures_deduplicate_by_url() {
        let task = new_task("https://example.com/a");
        let enclosure = Enclosure {
            kind: "audio".to_string(),
            title: "episode".to_string(),
            url: "https://example.com/a.mp3".to_string(),
            content_type: "audio/mpeg".to_string(),
            description: String::new(),
        };
        assert!(task.add_enclosure(enclosure.clone()));
        assert!(!task.add_enclosure(enclosure));
        assert_eq!(task.enclosures().len(), 1);
    }
}
