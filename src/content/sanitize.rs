// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 防御性清理
//!
//! 在所有修改完成后，对序列化结果重新解析并再次应用白名单，
//! 不依赖之前清理步骤的正确性。

use crate::content::rules::RuleSet;
use crate::document::DocumentModel;
use crate::utils::url_utils::scheme_of;

// 连同内容一起删除的元素
const DROP_WITH_CONTENT: &[&str] = &[
    "head", "script", "style", "iframe", "object", "embed", "template", "svg", "math", "noscript",
    "noembed", "noframes", "title", "frame", "frameset", "textarea", "select",
];

const UNSAFE_SCHEMES: &[&str] = &["javascript", "vbscript"];

/// 清理HTML，返回 `<body>` 的内部HTML
pub fn sanitize_html(html: &str, rules: &RuleSet) -> String {
    let mut doc = DocumentModel::parse(html);
    sanitize_document(&mut doc, rules);
    doc.body_html()
}

/// 就地清理文档
pub fn sanitize_document(doc: &mut DocumentModel, rules: &RuleSet) {
    doc.walk_elements(|doc, node| {
        if doc.is_named(node, DROP_WITH_CONTENT) {
            doc.remove(node);
        }
    });

    doc.walk_elements(|doc, node| {
        let Some(tag) = doc.name(node).map(str::to_string) else {
            return;
        };
        if !rules.is_kept(&tag) {
            doc.unwrap(node);
            return;
        }

        doc.retain_attrs(node, |attr, value| {
            rules.is_attr_allowed(&tag, attr) && !is_unsafe_url(value)
        });
        match tag.as_str() {
            "a" if doc.attr(node, "href").is_none() => doc.unwrap(node),
            "img" if doc.attr(node, "src").is_none() => doc.remove(node),
            _ => {}
        }
    });
    doc.merge_text_nodes();
}

fn is_unsafe_url(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    scheme_of(&compact).is_some_and(|s| UNSAFE_SCHEMES.contains(&s.as_str()))
}
