// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 结构规范化
//!
//! 各个处理步骤相互独立，只对单个文档操作。

use std::collections::BTreeSet;

use tracing::debug;

use crate::document::{DocumentModel, NodeId};

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "del", "em", "i", "ins", "kbd", "mark", "q",
    "s", "small", "strong", "sub", "sup", "time", "u", "var",
];

// caption, th, td 并非块级元素，但同样可以去掉首尾空白
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "aside", "ul", "ol", "li", "dl", "dd", "dt",
    "blockquote", "pre", "figure", "figcaption", "table", "caption", "th", "td",
];

fn heading_level(doc: &DocumentModel, node: NodeId) -> Option<usize> {
    let name = doc.name(node)?;
    HEADINGS.iter().position(|h| *h == name).map(|i| i + 1)
}

/// 把行内元素内部的首尾空格移到相邻的文本节点
///
/// `foo<em> bar </em>baz` 变为 `foo <em>bar</em> baz`。
/// 只在行内元素的首/尾子节点和相邻兄弟节点都是文本时移动。
pub fn fix_inline_whitespace(doc: &mut DocumentModel) {
    for node in doc.select(INLINE_ELEMENTS) {
        let text = doc.text(node);
        let prefix = text.starts_with(' ');
        let suffix = text.ends_with(' ');
        if !prefix && !suffix {
            continue;
        }

        if prefix {
            let first = doc.first_child(node).filter(|c| doc.is_text(*c));
            let prev = doc.prev_sibling(node).filter(|s| doc.is_text(*s));
            if let (Some(first), Some(prev)) = (first, prev) {
                move_space(doc, first, prev, false);
            }
        }

        if suffix {
            let last = doc.last_child(node).filter(|c| doc.is_text(*c));
            let next = doc.next_sibling(node).filter(|s| doc.is_text(*s));
            if let (Some(last), Some(next)) = (last, next) {
                move_space(doc, last, next, true);
            }
        }
    }
}

fn move_space(doc: &mut DocumentModel, inner: NodeId, outer: NodeId, trailing: bool) {
    let inner_text = doc.text_of(inner).unwrap_or_default().to_string();
    let outer_text = doc.text_of(outer).unwrap_or_default().to_string();
    if trailing {
        let trimmed = inner_text.strip_suffix(' ').unwrap_or(&inner_text);
        doc.set_text(inner, trimmed);
        doc.set_text(outer, &format!(" {}", outer_text));
    } else {
        let trimmed = inner_text.strip_prefix(' ').unwrap_or(&inner_text);
        doc.set_text(inner, trimmed);
        doc.set_text(outer, &format!("{} ", outer_text));
    }
}

/// 去掉块级元素内部标记的首尾空白
pub fn trim_blocks(doc: &mut DocumentModel) {
    for node in doc.select(BLOCK_ELEMENTS) {
        if let Some(first) = doc.first_child(node).filter(|c| doc.is_text(*c)) {
            let trimmed = doc.text_of(first).unwrap_or_default().trim_start().to_string();
            doc.set_text(first, &trimmed);
        }
        if let Some(last) = doc.last_child(node).filter(|c| doc.is_text(*c)) {
            let trimmed = doc.text_of(last).unwrap_or_default().trim_end().to_string();
            doc.set_text(last, &trimmed);
        }
    }
}

/// 删除文本与标题相同（忽略大小写和首尾空白）的标题元素
pub fn deduplicate_title(doc: &mut DocumentModel, title: &str) {
    let title = title.trim().to_lowercase();
    if title.is_empty() {
        return;
    }
    for heading in doc.select(HEADINGS) {
        if doc.text(heading).trim().to_lowercase() == title {
            debug!(module = "content", title = %title, "Remove heading duplicating title");
            doc.remove(heading);
        }
    }
}

/// 删除与文章主图相同的正文图片
pub fn deduplicate_image(doc: &mut DocumentModel, image_url: &str) {
    if image_url.is_empty() {
        return;
    }
    for img in doc.select(&["img"]) {
        if doc.attr(img, "src") == Some(image_url) {
            debug!(module = "content", src = image_url, "Remove image duplicating main image");
            doc.remove(img);
        }
    }
}

/// 压缩标题层级
///
/// 出现的最低层级变为 `h1`，层级之间的空缺被填补，顺序保持不变，
/// 例如 {1,3,6} 变为 {1,2,3}。先统计出现的层级，再一次性改写。
pub fn compact_headings(doc: &mut DocumentModel) {
    let headings = doc.select(HEADINGS);
    let present: BTreeSet<usize> = headings
        .iter()
        .filter_map(|h| heading_level(doc, *h))
        .collect();

    let mut target = [0usize; 7];
    for (rank, level) in present.iter().enumerate() {
        target[*level] = rank + 1;
    }

    for heading in headings {
        let Some(level) = heading_level(doc, heading) else {
            continue;
        };
        let new_level = target[level];
        if new_level != level {
            doc.rename(heading, HEADINGS[new_level - 1]);
        }
    }
}

/// 去掉标题内部的所有标记，只保留文本
pub fn flatten_headings(doc: &mut DocumentModel) {
    for heading in doc.select(HEADINGS) {
        for node in doc.descendants(heading) {
            if doc.is_element(node) {
                doc.unwrap(node);
            }
        }
    }
}
