// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing::warn;
use url::Url;

use crate::document::DocumentModel;
use crate::utils::url_utils::resolve_url;

const URL_ATTRIBUTES: &[(&str, &str)] = &[("a", "href"), ("img", "src")];

/// 以 `base` 为基准把链接和图片地址解析为绝对URL
///
/// 单个地址解析失败时记录日志并保持原值。
pub fn resolve_document_urls(doc: &mut DocumentModel, base: &Url) {
    for (tag, attr) in URL_ATTRIBUTES {
        for node in doc.select(&[*tag]) {
            let Some(value) = doc.attr(node, attr).map(str::to_string) else {
                continue;
            };
            match resolve_url(base, &value) {
                Ok(resolved) => doc.set_attr(node, attr, resolved.as_str()),
                Err(e) => {
                    warn!(module = "content", url = %value, error = %e, "Failed to resolve URL");
                }
            }
        }
    }
}
