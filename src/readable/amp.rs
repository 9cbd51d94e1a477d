// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::document::{DocumentModel, NodeId};

/// AMP运行时脚本的地址前缀
pub const AMP_RUNTIME_PREFIX: &str = "https://cdn.ampproject.org/";

fn has_rel(doc: &DocumentModel, link: NodeId, rel: &str) -> bool {
    doc.attr(link, "rel")
        .is_some_and(|v| v.split_whitespace().any(|r| r.eq_ignore_ascii_case(rel)))
}

fn link_href(doc: &DocumentModel, rel: &str) -> Option<String> {
    doc.select(&["link"])
        .into_iter()
        .filter(|l| has_rel(doc, *l, rel))
        .find_map(|l| doc.attr(l, "href").filter(|h| !h.is_empty()).map(str::to_string))
}

/// 第一个 `link rel="amphtml"` 的地址
pub fn find_amp_url(doc: &DocumentModel) -> Option<String> {
    link_href(doc, "amphtml")
}

/// 第一个 `link rel="canonical"` 的地址
pub fn find_canonical_url(doc: &DocumentModel) -> Option<String> {
    link_href(doc, "canonical")
}

/// 判断文档本身是否为AMP页面
///
/// 需要同时满足：有 `head`、有 `body`、有规范链接、
/// 引用了AMP运行时脚本。任何单个特征都不足以判断。
pub fn is_amp_document(doc: &DocumentModel) -> bool {
    if doc.head().is_none() || doc.body().is_none() {
        return false;
    }
    if find_canonical_url(doc).is_none() {
        return false;
    }
    doc.select(&["script"]).into_iter().any(|s| {
        doc.attr(s, "src")
            .is_some_and(|src| src.starts_with(AMP_RUNTIME_PREFIX))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMP_PAGE: &str = r#"<html><head>
        <link rel="canonical" href="https://example.com/doc.html">
        <script async src="https://cdn.ampproject.org/v0.js"></script>
        </head><body><p>text</p></body></html>"#;

    #[test]
    fn test_find_amp_url() {
        let doc = DocumentModel::parse(
            r#"<head><link rel="amphtml" href="https://example.com/amp.html"></head>"#,
        );
        assert_eq!(find_amp_url(&doc).as_deref(), Some("https://example.com/amp.html"));

        let doc = DocumentModel::parse(
            r#"<head><link rel="canonical" href="https://example.com/doc.html"></head>"#,
        );
        assert_eq!(find_amp_url(&doc), None);

        // rel 不区分大小写，href 区分
        let doc = DocumentModel::parse(
            r#"<head><LINK REL="AMPHTML" HREF="https://example.com/AMP.html"></head>"#,
        );
        assert_eq!(find_amp_url(&doc).as_deref(), Some("https://example.com/AMP.html"));

        // 使用第一个
        let doc = DocumentModel::parse(
            r#"<head><link rel="amphtml" href="https://example.com/amp.html">
            <link rel="amphtml" href="https://example.com/duplicate.html"></head>"#,
        );
        assert_eq!(find_amp_url(&doc).as_deref(), Some("https://example.com/amp.html"));
    }

    #[test]
    fn test_is_amp_document() {
        assert!(is_amp_document(&DocumentModel::parse(AMP_PAGE)));
    }

    #[test]
    fn test_single_signal_is_not_enough() {
        // 只有规范链接
        let doc = DocumentModel::parse(
            r#"<html><head><link rel="canonical" href="https://example.com/doc.html"></head><body></body></html>"#,
        );
        assert!(!is_amp_document(&doc));

        // 只有运行时脚本
        let doc = DocumentModel::parse(
            r#"<html><head><script src="https://cdn.ampproject.org/v0.js"></script></head><body></body></html>"#,
        );
        assert!(!is_amp_document(&doc));

        // 其他来源的脚本
        let doc = DocumentModel::parse(&AMP_PAGE.replace("cdn.ampproject.org", "cdn.example.org"));
        assert!(!is_amp_document(&doc));
    }
}
