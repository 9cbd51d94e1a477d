// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::content::clean::{clean_document, strip_from_title};
use crate::content::normalize::{
    compact_headings, deduplicate_image, deduplicate_title, fix_inline_whitespace,
    flatten_headings, trim_blocks,
};
use crate::content::prepare::prepare_document;
use crate::content::resolve::resolve_document_urls;
use crate::content::rules::{PatternRules, RuleSet};
use crate::content::sanitize::sanitize_html;
use crate::content::special::collect_json_ld;
use crate::domain::models::task::Task;
use crate::pipeline::{Outcome, Stage};
use crate::utils::errors::PipelineError;
use crate::utils::url_utils;

/// 预处理阶段
///
/// 在正文提取之前删除样板内容，主文档和备用文档都会处理。
pub struct PrepareStage {
    rules: Arc<PatternRules>,
}

impl PrepareStage {
    pub fn new(rules: Arc<PatternRules>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Stage for PrepareStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "content", "Prepare HTML");

        // JSON-LD 位于 script 中，必须在规则删除脚本之前读取
        collect_json_ld(task);

        if let Some(doc) = task.document.as_mut() {
            prepare_document(doc, &self.rules);
        }
        if let Some(doc) = task.alt_document.as_mut() {
            prepare_document(doc, &self.rules);
        }
        Outcome::Continue
    }

    fn name(&self) -> &str {
        "prepare"
    }
}

/// URL解析阶段
///
/// 主文档按内容URL解析，备用文档按自己的URL解析，主图地址同样变为绝对地址。
#[derive(Debug, Default)]
pub struct ResolveStage;

impl ResolveStage {
    pub fn new() -> Self {
        Self
    }

    fn resolve(&self, task: &mut Task) -> Result<(), PipelineError> {
        let base = Url::parse(task.content_url())?;

        if let Some(image) = task.image_url.clone() {
            match url_utils::resolve_url(&base, &image) {
                Ok(resolved) => task.image_url = Some(resolved.to_string()),
                Err(e) => {
                    warn!(task = %task.id, module = "content", image = %image, error = %e, "Failed to resolve image URL")
                }
            }
        }

        if let Some(doc) = task.document.as_mut() {
            resolve_document_urls(doc, &base);
        }

        let alt_base = task
            .alt_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or(base);
        if let Some(doc) = task.alt_document.as_mut() {
            resolve_document_urls(doc, &alt_base);
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for ResolveStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "content", url = %task.content_url(), "Resolve URLs");
        self.resolve(task).into()
    }

    fn name(&self) -> &str {
        "resolve"
    }
}

/// 清理阶段
///
/// 对提取出的正文应用元素和属性白名单，并整理标题。
pub struct CleanStage {
    rules: Arc<RuleSet>,
}

impl CleanStage {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Stage for CleanStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "content", "Clean HTML");

        if let Some(doc) = task.document.as_mut() {
            clean_document(doc, &self.rules);
        }
        task.title = strip_from_title(&task.title, &task.site_name);
        Outcome::Continue
    }

    fn name(&self) -> &str {
        "clean"
    }
}

/// 规范化阶段
#[derive(Debug, Default)]
pub struct NormalizeStage;

impl NormalizeStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for NormalizeStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "content", "Normalize HTML");

        let title = task.title.clone();
        let image = task.image_url.clone().unwrap_or_default();
        if let Some(doc) = task.document.as_mut() {
            fix_inline_whitespace(doc);
            trim_blocks(doc);
            deduplicate_image(doc, &image);
            deduplicate_title(doc, &title);
            compact_headings(doc);
            flatten_headings(doc);
        }
        Outcome::Continue
    }

    fn name(&self) -> &str {
        "normalize"
    }
}

/// 安全过滤阶段
///
/// 序列化后重新解析，再次应用白名单。
pub struct SanitizeStage {
    rules: Arc<RuleSet>,
}

impl SanitizeStage {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Stage for SanitizeStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "content", "Sanitize HTML");

        let html = task.html();
        let clean = sanitize_html(&html, &self.rules);
        task.set_html(&clean);
        Outcome::Continue
    }

    fn name(&self) -> &str {
        "sanitize"
    }
}
