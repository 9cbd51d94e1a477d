// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use html_escape::{encode_double_quoted_attribute, encode_text};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::models::task::Task;
use crate::domain::repositories::asset_repository::StorageError;
use crate::utils::url_utils::parse_store_key;

const STYLE: &str = "body{max-width:42em;margin:2em auto;padding:0 1em;\
font-family:Georgia,serif;line-height:1.5;color:#222}\
img{max-width:100%;height:auto}\
footer{margin-top:3em;font-size:.85em;color:#666;border-top:1px solid #ddd}";

/// 渲染错误类型
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("任务没有文档")]
    MissingDocument,

    #[error("读取资源失败: {0}")]
    Storage(#[from] StorageError),
}

/// 渲染器特质
///
/// 每种输出格式一个实现，只读取已完成的任务
#[async_trait]
pub trait Renderer: Send + Sync {
    /// 渲染任务
    async fn render(&self, task: &Task) -> Result<Vec<u8>, RenderError>;

    /// 输出内容类型
    fn content_type(&self) -> &'static str;
}

/// 独立的HTML页面
///
/// `store://` 图片以 base64 data URI 内联，末尾附带获取时间和原始链接。
#[derive(Debug, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }

    /// 把存储中的图片内联为 data URI；读取失败的图片保留原地址
    async fn inline_images(&self, task: &Task) -> Result<String, RenderError> {
        let mut doc = task.document.clone().ok_or(RenderError::MissingDocument)?;
        for img in doc.select(&["img"]) {
            let Some(key) = doc.attr(img, "src").and_then(parse_store_key).map(str::to_string) else {
                continue;
            };
            match task.get_asset(&key).await {
                Ok(asset) => {
                    let uri = format!("data:{};base64,{}", asset.content_type, STANDARD.encode(&asset.data));
                    doc.set_attr(img, "src", &uri);
                }
                Err(e) => warn!(task = %task.id, module = "render", key = %key, error = %e, "Failed to inline image"),
            }
        }
        Ok(doc.body_html())
    }
}

#[async_trait]
impl Renderer for HtmlRenderer {
    async fn render(&self, task: &Task) -> Result<Vec<u8>, RenderError> {
        debug!(task = %task.id, module = "render", "Render HTML");
        let content = self.inline_images(task).await?;

        let mut out = String::with_capacity(content.len() + 1024);
        out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
        out.push_str(&format!("<title>{}</title>", encode_text(&task.title)));
        out.push_str(&format!("<style>{}</style></head><body>", STYLE));
        if !task.title.is_empty() {
            out.push_str(&format!("<h1>{}</h1>", encode_text(&task.title)));
        }
        out.push_str(&content);

        let original = task.actual_url.as_deref().unwrap_or(task.url.as_str());
        out.push_str("<footer><p>Retrieved on ");
        out.push_str(&format!(
            "<time datetime=\"{}\">{}</time>",
            task.retrieved.to_rfc3339(),
            task.retrieved.format("%a %b %e %H:%M:%S %Y")
        ));
        out.push_str(&format!(
            " | <a href=\"{}\"",
            encode_double_quoted_attribute(original)
        ));
        if !task.title.is_empty() {
            out.push_str(&format!(
                " title=\"{}\"",
                encode_double_quoted_attribute(&task.title)
            ));
        }
        out.push_str(">view original site</a></p></footer></body></html>\n");

        Ok(out.into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::models::task::ImageInfo;
    use crate::infrastructure::storage::InMemoryAssetStore;

    #[tokio::test]
    async fn test_render_inlines_stored_images() {
        // Given: 任务中有一张已存储的图片和一张外部图片
        let mut task = Task::new("https://example.com/a", Arc::new(InMemoryAssetStore::new()));
        task.title = "Fish & Chips".to_string();
        task.add_image(
            ImageInfo {
                key: "k1".to_string(),
                content_type: "image/png".to_string(),
                original_url: "https://example.com/a.png".to_string(),
                content_url: "store://k1".to_string(),
            },
            b"abc",
        )
        .await
        .unwrap();
        task.set_html(r#"<p>text</p><img src="store://k1"><img src="https://cdn.example.com/b.png">"#);

        // When: 渲染
        let html = String::from_utf8(HtmlRenderer::new().render(&task).await.unwrap()).unwrap();

        // Then: 存储的图片被内联，外部图片保持不变
        assert!(html.contains(r#"<img src="data:image/png;base64,YWJj">"#));
        assert!(html.contains(r#"<img src="https://cdn.example.com/b.png">"#));
        assert!(html.contains("<title>Fish &amp; Chips</title>"));
        assert!(html.contains(r#"<a href="https://example.com/a" title="Fish &amp; Chips">view original site</a>"#));
        assert!(html.contains("<footer>"));
    }

    #[tokio::test]
    async fn test_missing_asset_keeps_src() {
        let mut task = Task::new("https://example.com/a", Arc::new(InMemoryAssetStore::new()));
        task.set_html(r#"<img src="store://unknown">"#);

        let html = String::from_utf8(HtmlRenderer::new().render(&task).await.unwrap()).unwrap();

        assert!(html.contains(r#"src="store://unknown""#));
        assert!(!html.contains(" title="));
    }

    #[tokio::test]
    async fn test_render_without_document() {
        let task = Task::new("https://example.com/a", Arc::new(InMemoryAssetStore::new()));
        assert!(matches!(
            HtmlRenderer::new().render(&task).await,
            Err(RenderError::MissingDocument)
        ));
    }
}
