// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 提取后的清理
//!
//! 按 [`RuleSet`] 白名单删除不需要的元素和属性，再去掉清理后残留的空元素。

use std::collections::HashSet;

use tracing::{debug, info};

use crate::content::picture::resolve_pictures;
use crate::content::rules::RuleSet;
use crate::document::{DocumentModel, NodeId, VOID_ELEMENTS};
use crate::utils::url_utils::{normalize_link, scheme_of};

const SUPPORTED_IMAGE_SCHEMES: &[&str] = &["http", "https", "data"];

// 没有子元素时失去意义的容器
const CONTAINERS: &[&str] = &["ol", "ul", "table"];

// 即使为空也保留的元素
const KEEP_EMPTY: &[&str] = &["html", "body", "td", "th"];

const TITLE_SEPARATORS: &[&str] = &["|", "-", "–", "—", ":", "·", "/"];

/// 对文档执行全部清理步骤
pub fn clean_document(doc: &mut DocumentModel, rules: &RuleSet) {
    let pictures = resolve_pictures(doc);
    normalize_urls(doc);
    remove_unsupported_schemes(doc);

    let removed = rules.remove_disallowed(doc);
    let unwrapped = unwrap_tags(doc, rules);
    rules.strip_attributes(doc);
    debug!(module = "content", pictures, removed, unwrapped, "Applied allow-lists");

    drop_orphaned_elements(doc);
    remove_unwanted_punctuation(doc);
    drop_empty_elements(doc);
    drop_childless_parents(doc);
    doc.merge_text_nodes();
}

/// 规范化所有 `href` 和 `src` 属性值
pub fn normalize_urls(doc: &mut DocumentModel) {
    for node in doc.elements() {
        for attr in ["href", "src"] {
            let Some(value) = doc.attr(node, attr).filter(|v| !v.is_empty()) else {
                continue;
            };
            let normalized = normalize_link(value);
            if normalized != value {
                doc.set_attr(node, attr, &normalized);
            }
        }
    }
}

/// 删除 `src` 使用不支持协议的图片
///
/// 相对URL会在之后解析，因此保留。
pub fn remove_unsupported_schemes(doc: &mut DocumentModel) {
    for img in doc.select(&["img"]) {
        let Some(scheme) = doc.attr(img, "src").and_then(scheme_of) else {
            continue;
        };
        if !SUPPORTED_IMAGE_SCHEMES.contains(&scheme.as_str()) {
            info!(module = "content", scheme = %scheme, "Removing image with unsupported scheme in src");
            doc.remove(img);
        }
    }
}

/// 解包灰名单元素和没有 `href` 的链接，返回解包的元素数
pub fn unwrap_tags(doc: &mut DocumentModel, rules: &RuleSet) -> usize {
    let mut unwrapped = rules.unwrap_grey(doc);
    for anchor in doc.select(&["a"]) {
        if doc.attr(anchor, "href").unwrap_or_default().is_empty() {
            doc.unwrap(anchor);
            unwrapped += 1;
        }
    }
    unwrapped
}

/// 删除失去父元素的元素，例如不在 `figure` 中的 `figcaption`
pub fn drop_orphaned_elements(doc: &mut DocumentModel) {
    for caption in doc.select(&["figcaption"]) {
        if !doc.has_ancestor(caption, "figure") {
            doc.remove(caption);
        }
    }
}

/// 删除只包含分隔符 `|` 的段落
pub fn remove_unwanted_punctuation(doc: &mut DocumentModel) {
    for p in doc.select(&["p"]) {
        if doc.text(p).trim() == "|" {
            doc.remove(p);
        }
    }
}

/// 删除没有文本也不包含空元素（`img`、`br` 等）的元素
pub fn drop_empty_elements(doc: &mut DocumentModel) {
    // 逆前序即子节点先于父节点，一次遍历标记出有内容的节点
    let mut filled: HashSet<NodeId> = HashSet::new();
    for node in doc.descendants(doc.root()).into_iter().rev() {
        let own = match doc.text_of(node) {
            Some(text) => !text.trim().is_empty(),
            None => doc.is_named(node, VOID_ELEMENTS),
        };
        if own || doc.children(node).iter().any(|c| filled.contains(c)) {
            filled.insert(node);
        }
    }

    doc.walk_elements(|doc, node| {
        if !filled.contains(&node) && !doc.is_named(node, KEEP_EMPTY) {
            doc.remove(node);
        }
    });
}

/// 删除没有子元素的列表和表格，其中的文本一并删除
pub fn drop_childless_parents(doc: &mut DocumentModel) {
    for node in doc.select(CONTAINERS) {
        if doc.element_children(node).is_empty() {
            doc.remove(node);
        }
    }
}

/// 从标题中去掉站点名前缀或后缀
///
/// 没有站点名匹配时，如果标题恰好包含一个 `|`，保留较长的部分。
pub fn strip_from_title(title: &str, site_name: &str) -> String {
    let site_name = site_name.trim();
    if !site_name.is_empty() {
        let stripped = title
            .strip_suffix(site_name)
            .map(|rest| (rest.trim_end(), true))
            .or_else(|| title.strip_prefix(site_name).map(|rest| (rest.trim_start(), false)));
        if let Some((rest, is_suffix)) = stripped {
            for sep in TITLE_SEPARATORS {
                let candidate = if is_suffix {
                    rest.strip_suffix(sep)
                } else {
                    rest.strip_prefix(sep)
                };
                if let Some(candidate) = candidate.map(str::trim).filter(|c| !c.is_empty()) {
                    return candidate.to_string();
                }
            }
        }
    }

    let mut parts = title.split('|');
    if let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) {
        let longer = if a.chars().count() > b.chars().count() { a } else { b };
        return longer.trim().to_string();
    }
    title.to_string()
}
