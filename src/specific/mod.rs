// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 站点特定处理
//!
//! 部分站点的正文不在常规结构中（内嵌在JSON里、分散在多个区块中，
//! 或者页面只是指向文章的落地页），由对应的提取器在通用处理之前改写文档。

use std::sync::Arc;

use crate::document::{DocumentModel, NodeId};
use crate::domain::models::task::Task;
use crate::pipeline::Outcome;

mod bloomberg;
mod linkedin;
mod stackoverflow;

pub use bloomberg::BloombergExtractor;
pub use linkedin::LinkedinExtractor;
pub use stackoverflow::StackExchangeExtractor;

/// 站点提取器特质
pub trait SiteExtractor: Send + Sync {
    /// 是否处理该主机（不含 `www.`）
    fn matches(&self, host: &str) -> bool;

    /// 改写任务的主文档，可以请求以新URL重启流水线
    fn apply(&self, task: &mut Task) -> Outcome;

    fn name(&self) -> &'static str;
}

/// 内置的站点提取器
pub fn default_extractors() -> Vec<Arc<dyn SiteExtractor>> {
    vec![
        Arc::new(BloombergExtractor),
        Arc::new(StackExchangeExtractor),
        Arc::new(LinkedinExtractor),
    ]
}

/// 元素的 class 中是否有满足条件的名称
pub(crate) fn has_class_where<F>(doc: &DocumentModel, node: NodeId, pred: F) -> bool
where
    F: Fn(&str) -> bool,
{
    doc.attr(node, "class")
        .is_some_and(|c| c.split_whitespace().any(pred))
}

pub(crate) fn has_class(doc: &DocumentModel, node: NodeId, class: &str) -> bool {
    has_class_where(doc, node, |c| c == class)
}

/// `scope` 之内带有给定 class 的元素，按文档顺序
pub(crate) fn find_by_class(doc: &DocumentModel, scope: NodeId, class: &str) -> Vec<NodeId> {
    doc.descendants(scope)
        .into_iter()
        .filter(|n| doc.is_element(*n) && has_class(doc, *n, class))
        .collect()
}

/// 清空 `body` 并放入一个空的 `<article>`，返回该元素
pub(crate) fn replace_body(doc: &mut DocumentModel) -> Option<NodeId> {
    let body = doc.body()?;
    doc.clear_children(body);
    let article = doc.create_element("article", Vec::new());
    doc.append(body, article);
    Some(article)
}

/// 追加一个只包含文本的元素
pub(crate) fn append_text_element(doc: &mut DocumentModel, parent: NodeId, name: &str, text: &str) {
    let element = doc.create_element(name, Vec::new());
    let text = doc.create_text(text);
    doc.append(element, text);
    doc.append(parent, element);
}
