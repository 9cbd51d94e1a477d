// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::document::DocumentModel;
use crate::domain::models::task::Task;
use crate::engines::traits::{FetchResponse, Fetcher};
use crate::pipeline::{Outcome, Stage};
use crate::readable::amp::{find_amp_url, find_canonical_url, is_amp_document};
use crate::utils::errors::PipelineError;
use crate::utils::url_utils;

/// 抓取阶段
///
/// 获取主文档，跟随一次 `<meta http-equiv="refresh">` 跳转。
/// 页面本身是AMP时，它成为备用文档并改为抓取规范URL作为主文档；
/// 否则尝试抓取 `link rel="amphtml"` 指向的AMP版本作为备用文档。
pub struct FetchStage {
    fetcher: Arc<dyn Fetcher>,
}

impl FetchStage {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// 抓取页面，只接受2xx状态码和非空内容
    async fn fetch_page(&self, url: &str) -> Result<FetchResponse, PipelineError> {
        let response = self.fetcher.fetch(url).await?;
        if !(200..300).contains(&response.status) {
            return Err(PipelineError::HttpStatus {
                status: response.status,
                url: response.final_url,
            });
        }
        if response.body.trim().is_empty() {
            return Err(PipelineError::EmptyDocument(response.final_url));
        }
        debug!(
            module = "fetch",
            url = %response.final_url,
            status = response.status,
            content_type = %response.content_type,
            bytes = response.body.len(),
            "Fetched page"
        );
        Ok(response)
    }

    async fn fetch(&self, task: &mut Task) -> Result<(), PipelineError> {
        let mut response = self.fetch_page(&task.url).await?;
        let mut doc = DocumentModel::parse(&response.body);

        if let Some(target) = find_refresh_url(&doc) {
            let redirect = resolve_against(&response.final_url, &target)?;
            info!(task = %task.id, module = "fetch", url = %redirect, "Redirect from <meta>");
            response = self.fetch_page(&redirect).await?;
            doc = DocumentModel::parse(&response.body);
        }
        task.status_code = Some(response.status);

        if is_amp_document(&doc) {
            // is_amp_document 已确认规范链接存在
            let href = find_canonical_url(&doc).unwrap_or_default();
            let canonical = resolve_against(&response.final_url, &href)?;
            debug!(
                task = %task.id,
                module = "fetch",
                url = %response.final_url,
                canonical = %canonical,
                "Initial URL is AMP, fetching canonical"
            );
            task.alt_document = Some(doc);
            task.alt_url = Some(response.final_url);

            let primary = self.fetch_page(&canonical).await?;
            task.status_code = Some(primary.status);
            task.set_html(&primary.body);
            task.actual_url = Some(primary.final_url);
            return Ok(());
        }

        let amp_href = find_amp_url(&doc);
        task.document = Some(doc);
        task.actual_url = Some(response.final_url);

        if let Some(href) = amp_href {
            self.fetch_alternate(task, &href).await;
        }
        Ok(())
    }

    /// 抓取AMP版本，失败只记录日志
    async fn fetch_alternate(&self, task: &mut Task, href: &str) {
        let amp_url = match task.resolve_url(href) {
            Ok(u) => u,
            Err(e) => {
                warn!(task = %task.id, module = "fetch", href = %href, error = %e, "Failed to resolve AMP URL");
                return;
            }
        };
        info!(task = %task.id, module = "fetch", url = %amp_url, "Fetch AMP version");

        match self.fetch_page(&amp_url).await {
            Ok(response) => {
                task.set_alt_html(&response.body);
                task.alt_url = Some(response.final_url);
            }
            Err(e) => {
                info!(task = %task.id, module = "fetch", url = %amp_url, error = %e, "Failed to fetch AMP version");
            }
        }
    }
}

#[async_trait]
impl Stage for FetchStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(
            task = %task.id,
            module = "fetch",
            url = %task.url,
            fetcher = self.fetcher.name(),
            "Fetch content"
        );
        self.fetch(task).await.into()
    }

    fn name(&self) -> &str {
        "fetch"
    }
}

fn resolve_against(base: &str, href: &str) -> Result<String, PipelineError> {
    let base = Url::parse(base)?;
    Ok(url_utils::resolve_url(&base, href)?.to_string())
}

/// `<meta http-equiv="refresh" content="N;url=...">` 中的跳转地址
///
/// 只有秒数没有地址的刷新不算跳转。
pub fn find_refresh_url(doc: &DocumentModel) -> Option<String> {
    doc.select(&["meta"])
        .into_iter()
        .filter(|m| {
            doc.attr(*m, "http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
        })
        .find_map(|m| doc.attr(m, "content").and_then(parse_refresh))
}

fn parse_refresh(content: &str) -> Option<String> {
    let (_, target) = content.split_once(';')?;
    let target = target.trim();
    let prefix = target.get(..4)?;
    if !prefix.eq_ignore_ascii_case("url=") {
        return None;
    }
    let url = target[4..].trim().trim_matches(|c| c == '\'' || c == '"');
    (!url.is_empty()).then(|| url.to_string())
}
