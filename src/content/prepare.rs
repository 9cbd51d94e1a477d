// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 正文提取前的预处理
//!
//! 去掉更容易在提取前识别的内容（页面框架、广告、跟踪像素、导航），
//! 并把懒加载图片、`<noscript>` 等修正为普通标记，便于后续提取。

use std::collections::HashMap;

use tracing::debug;

use crate::content::picture::{convert_amp_img, fix_special_srcs, resolve_srcsets};
use crate::content::rules::PatternRules;
use crate::content::special::resolve_iframes;
use crate::document::{DocumentModel, NodeId};

/// 对单个文档执行全部预处理步骤
///
/// 主文档和备用文档分别调用。
pub fn prepare_document(doc: &mut DocumentModel, rules: &PatternRules) {
    // 可能一次去掉大部分HTML
    use_main(doc);

    resolve_noscript_images(doc);
    unwrap_noscript(doc);

    let dropped = rules.apply(doc);
    debug!(module = "content", dropped, "Applied pattern rules");
    drop_link_clouds(doc);
    drop_tracking_pixels(doc);

    resolve_iframes(doc);
    unwrap_divs(doc);
    drop_nav_lists(doc);
    fix_special_srcs(doc);
    convert_amp_img(doc);
    resolve_srcsets(doc);
}

/// 文档中恰好有一个 `<main>` 时，用它替换 `<body>` 的全部内容
pub fn use_main(doc: &mut DocumentModel) {
    let mains = doc.select(&["main"]);
    let (Some(body), [main]) = (doc.body(), mains.as_slice()) else {
        return;
    };
    let main = *main;
    doc.clear_children(body);
    doc.append(body, main);
    debug!(module = "content", "Replaced content with <main> element");
}

/// 用 `<noscript>` 的内容替换它本身
///
/// 启用脚本解析时 `<noscript>` 的内容是原始文本，需要重新作为HTML解析。
pub fn unwrap_noscript(doc: &mut DocumentModel) {
    doc.walk_elements(|doc, node| {
        if doc.is_named(node, &["noscript"]) {
            replace_with_content(doc, node);
        }
    });
}

fn replace_with_content(doc: &mut DocumentModel, noscript: NodeId) {
    if doc.element_children(noscript).is_empty() {
        let markup = doc.text(noscript);
        let nodes = doc.parse_fragment(&markup);
        doc.replace_with_nodes(noscript, nodes);
    } else {
        doc.unwrap(noscript);
    }
}

/// `<noscript>` 前面只有一个 `img`/`picture` 兄弟元素时，认为它包含真正的图片
///
/// ```html
/// <img src="placeholder.jpg" data-lazy-src="actual.jpg" />
/// <noscript><img src="actual.jpg" /></noscript>
/// ```
pub fn resolve_noscript_images(doc: &mut DocumentModel) {
    for noscript in doc.select(&["noscript"]) {
        let siblings = doc.prev_element_siblings(noscript);
        let [sibling] = siblings.as_slice() else {
            continue;
        };
        if doc.is_named(*sibling, &["img", "picture"]) {
            doc.remove(*sibling);
            replace_with_content(doc, noscript);
        }
    }
}

/// 只包含一个子元素的 `div` 去掉外层
pub fn unwrap_divs(doc: &mut DocumentModel) {
    doc.walk_elements(|doc, node| {
        if doc.is_named(node, &["div"]) && doc.element_children(node).len() == 1 {
            doc.unwrap(node);
        }
    });
}

fn visible_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// 每个节点的可见文本长度和其中链接文本的长度
///
/// 逆前序遍历，子节点先于父节点汇总。
fn text_lengths(doc: &DocumentModel) -> HashMap<NodeId, (usize, usize)> {
    let mut lengths: HashMap<NodeId, (usize, usize)> = HashMap::new();
    for node in doc.descendants(doc.root()).into_iter().rev() {
        let mut total = doc.text_of(node).map(visible_len).unwrap_or(0);
        let mut links = 0;
        for c in doc.children(node) {
            let (t, l) = lengths.get(&c).copied().unwrap_or((0, 0));
            total += t;
            links += l;
            if doc.is_named(c, &["a"]) {
                links += t;
            }
        }
        lengths.insert(node, (total, links));
    }
    lengths
}

/// 删除链接文本占全部文本一半以上的 `div`（"链接云"）
pub fn drop_link_clouds(doc: &mut DocumentModel) {
    // 祖先先于后代判断，被删除子树中的节点不再访问，预先统计的长度保持有效
    let lengths = text_lengths(doc);
    doc.walk_elements(|doc, node| {
        if !doc.is_named(node, &["div"]) {
            return;
        }
        let (total, link_len) = lengths.get(&node).copied().unwrap_or((0, 0));
        if link_len > 0 && link_len * 2 >= total {
            debug!(module = "content", link_len, total, "Remove link cloud");
            doc.remove(node);
        }
    });
}

/// 删除用于导航的列表
///
/// 列表项中第一个链接的文本超过该项文本一半时视为纯链接项，
/// 纯链接项不少于其他项时删除整个列表。
pub fn drop_nav_lists(doc: &mut DocumentModel) {
    doc.walk_elements(|doc, list| {
        if !doc.is_named(list, &["ul", "ol"]) {
            return;
        }
        let items = doc.select_within(list, &["li"]);
        if items.is_empty() {
            return;
        }

        let mut link_only = 0;
        let mut others = 0;
        for item in items {
            let link = doc
                .select_within(item, &["a"])
                .first()
                .map(|a| visible_len(&doc.text(*a)))
                .unwrap_or(0);
            let total = visible_len(&doc.text(item));
            if total > 0 && link * 2 > total {
                link_only += 1;
            } else {
                others += 1;
            }
        }

        if link_only >= others {
            debug!(module = "content", link_only, others, "Remove list with mostly link content");
            doc.remove(list);
        }
    });
}

fn dimension(doc: &DocumentModel, img: NodeId, name: &str) -> Option<u64> {
    doc.attr(img, name)?.trim().parse().ok()
}

/// 删除宽或高不超过1像素的图片（跟踪像素）
///
/// 只比较存在且能解析的尺寸，没有声明尺寸的图片保留。
pub fn drop_tracking_pixels(doc: &mut DocumentModel) {
    for img in doc.select(&["img"]) {
        let width = dimension(doc, img, "width");
        let height = dimension(doc, img, "height");
        if width.is_some_and(|w| w <= 1) || height.is_some_and(|h| h <= 1) {
            debug!(
                module = "content",
                width = ?width,
                height = ?height,
                src = doc.attr(img, "src").unwrap_or_default(),
                "Remove suspected tracking pixel"
            );
            doc.remove(img);
        }
    }
}
