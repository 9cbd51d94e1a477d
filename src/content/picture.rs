// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 响应式图片解析
//!
//! 从 `<picture>` 的 `<source>` 描述和 `srcset` 候选中选出一个具体的图片URL。

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::document::{DocumentModel, NodeId};

// 只识别第一个宽度条件
static WIDTH_MEDIA_QUERY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((min-width|max-width|width):\s*([0-9]+)px\)").expect("valid media query pattern")
});

/// 由JavaScript框架写入真实地址的图片属性
const SPECIAL_SRC_ATTRS: &[&str] = &["ix-path"];

/// 无效的 `srcset` 选项
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SrcsetError {
    #[error("srcset option has too many parts: {0:?}")]
    TooManyParts(String),

    #[error("invalid srcset descriptor: {0:?}")]
    InvalidDescriptor(String),
}

/// `srcset` 中的一个候选
#[derive(Debug, Clone, PartialEq)]
pub struct SrcCandidate {
    pub url: String,
    /// 宽度描述（`200w`）
    pub width: Option<u64>,
    /// 像素密度描述（`2x`）
    pub density: Option<f64>,
}

/// 解析单个 `srcset` 选项，格式为 `URL [宽度w|密度x]`
pub fn parse_srcset_option(option: &str) -> Result<SrcCandidate, SrcsetError> {
    let parts: Vec<&str> = option.split_whitespace().collect();
    let (url, descriptor) = match parts.as_slice() {
        [url] => (*url, None),
        [url, descriptor] => (*url, Some(*descriptor)),
        _ => return Err(SrcsetError::TooManyParts(option.to_string())),
    };

    let mut candidate = SrcCandidate {
        url: url.to_string(),
        width: None,
        density: None,
    };

    match descriptor {
        Some(d) if d.ends_with('w') => {
            let width = d
                .trim_end_matches('w')
                .parse::<u64>()
                .map_err(|_| SrcsetError::InvalidDescriptor(d.to_string()))?;
            candidate.width = Some(width);
        }
        Some(d) if d.ends_with('x') => {
            let density = d
                .trim_end_matches('x')
                .parse::<f64>()
                .map_err(|_| SrcsetError::InvalidDescriptor(d.to_string()))?;
            candidate.density = Some(density);
        }
        // 其他描述符忽略，只保留URL
        _ => {}
    }

    Ok(candidate)
}

/// 解析一个或多个 `srcset` 字符串
///
/// 空选项跳过；无效选项记录警告后丢弃，不影响其他选项
pub fn parse_srcset<'a, I>(values: I) -> Vec<SrcCandidate>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(|v| v.split(','))
        .filter(|o| !o.trim().is_empty())
        .filter_map(|o| match parse_srcset_option(o) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                warn!(module = "content", error = %e, "Invalid srcset");
                None
            }
        })
        .collect()
}

/// 媒体查询中的宽度条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaQuery {
    pub min_width: Option<u32>,
    pub width: Option<u32>,
    pub max_width: Option<u32>,
}

impl MediaQuery {
    /// 解析媒体查询
    ///
    /// 只识别出现的第一个 `(min-width|max-width|width: Npx)` 条件，
    /// 其余条件和逻辑运算符都被忽略；缺少 `px` 单位时不匹配
    pub fn parse(media: &str) -> Self {
        let mut query = Self::default();
        let Some(captures) = WIDTH_MEDIA_QUERY.captures(media) else {
            return query;
        };

        let value = match captures[2].parse::<u32>() {
            Ok(0) => return query,
            Ok(v) => v,
            Err(e) => {
                warn!(
                    module = "content",
                    media = media,
                    error = %e,
                    "Failed to parse integer from media query"
                );
                return query;
            }
        };

        match &captures[1] {
            "min-width" => query.min_width = Some(value),
            "max-width" => query.max_width = Some(value),
            _ => query.width = Some(value),
        }
        query
    }

    pub fn is_empty(&self) -> bool {
        self.min_width.is_none() && self.width.is_none() && self.max_width.is_none()
    }

    /// 所有宽度条件中的最大值
    pub fn constraint(&self) -> Option<u32> {
        [self.min_width, self.width, self.max_width]
            .into_iter()
            .flatten()
            .max()
    }
}

/// 一个 `<source>` 描述
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub content_type: Option<String>,
    pub media: MediaQuery,
    pub candidates: Vec<SrcCandidate>,
}

impl Source {
    fn from_element(doc: &DocumentModel, node: NodeId) -> Self {
        let srcset = doc.attr(node, "srcset").unwrap_or_default();
        // 懒加载脚本使用的属性
        let data_srcset = doc.attr(node, "data-srcset").unwrap_or_default();
        Self {
            content_type: doc.attr(node, "type").map(str::to_string),
            media: MediaQuery::parse(doc.attr(node, "media").unwrap_or_default()),
            candidates: parse_srcset([srcset, data_srcset]),
        }
    }
}

/// 按媒体查询筛选描述
///
/// 任一描述带有宽度条件时，只保留条件值最大的那一个；否则全部保留
pub fn filter_by_media(sources: Vec<Source>) -> Vec<Source> {
    let mut best: Option<(u32, usize)> = None;
    for (i, source) in sources.iter().enumerate() {
        if let Some(w) = source.media.constraint() {
            if best.map_or(true, |(max, _)| w > max) {
                best = Some((w, i));
            }
        }
    }

    match best {
        Some((_, i)) => sources.into_iter().nth(i).into_iter().collect(),
        None => sources,
    }
}

/// 选择最佳候选
///
/// 宽度最大者优先；都没有宽度时取密度最大者；都没有时取第一个
pub fn select_candidate(candidates: &[SrcCandidate]) -> Option<&SrcCandidate> {
    let mut by_width: Option<&SrcCandidate> = None;
    let mut by_density: Option<&SrcCandidate> = None;

    for c in candidates {
        if let Some(w) = c.width.filter(|w| *w > 0) {
            if by_width.and_then(|b| b.width).map_or(true, |max| w > max) {
                by_width = Some(c);
            }
        } else if let Some(d) = c.density.filter(|d| *d > 0.0) {
            if by_density.and_then(|b| b.density).map_or(true, |max| d > max) {
                by_density = Some(c);
            }
        }
    }

    by_width.or(by_density).or(candidates.first())
}

/// 解析一个 `<picture>` 元素
///
/// 成功时设置 `img` 的 `src`、删除 `<source>` 并解包 `<picture>`；
/// 没有可用候选时保持标记不变并返回 `false`
pub fn resolve_picture(doc: &mut DocumentModel, picture: NodeId) -> bool {
    let images = doc.select_within(picture, &["img"]);
    let [img] = images.as_slice() else {
        warn!(
            module = "content",
            count = images.len(),
            "Expected exactly one img element in <picture>"
        );
        return false;
    };
    let img = *img;

    let source_nodes = doc.select_within(picture, &["source"]);
    let sources: Vec<Source> = source_nodes
        .iter()
        .map(|s| Source::from_element(doc, *s))
        .filter(|s| !s.candidates.is_empty())
        .collect();

    let candidates: Vec<SrcCandidate> = filter_by_media(sources)
        .into_iter()
        .flat_map(|s| s.candidates)
        .collect();

    let Some(winner) = select_candidate(&candidates) else {
        warn!(module = "content", "No suitable src found for <picture>");
        return false;
    };

    debug!(module = "content", src = %winner.url, "Resolved <picture>");
    doc.set_attr(img, "src", &winner.url);
    for s in source_nodes {
        doc.remove(s);
    }
    doc.unwrap(picture);
    true
}

/// 解析文档中所有的 `<picture>` 元素
pub fn resolve_pictures(doc: &mut DocumentModel) -> usize {
    let mut resolved = 0;
    doc.walk_elements(|doc, node| {
        if doc.is_named(node, &["picture"]) && resolve_picture(doc, node) {
            resolved += 1;
        }
    });
    resolved
}

/// 用 `img` 自身的 `srcset`/`data-srcset` 中的最佳候选替换 `src`
pub fn resolve_srcsets(doc: &mut DocumentModel) {
    for img in doc.select(&["img"]) {
        let srcset = doc.attr(img, "srcset").unwrap_or_default();
        let data_srcset = doc.attr(img, "data-srcset").unwrap_or_default();
        let candidates = parse_srcset([srcset, data_srcset]);
        if let Some(winner) = select_candidate(&candidates) {
            let url = winner.url.clone();
            debug!(
                module = "content",
                src = %url,
                old = doc.attr(img, "src").unwrap_or_default(),
                "Replaced image src from srcset"
            );
            doc.set_attr(img, "src", &url);
        }
    }
}

/// 把 `amp-img` 转换为普通的 `img`，保留属性并丢弃子节点
pub fn convert_amp_img(doc: &mut DocumentModel) {
    doc.walk_elements(|doc, node| {
        if doc.is_named(node, &["amp-img"]) {
            let attrs = doc.attrs(node).to_vec();
            let img = doc.create_element("img", attrs);
            doc.replace(node, img);
        }
    });
}

/// 用框架专用属性中的真实地址替换 `src`
pub fn fix_special_srcs(doc: &mut DocumentModel) {
    for img in doc.select(&["img"]) {
        for name in SPECIAL_SRC_ATTRS {
            let Some(value) = doc.attr(img, name).filter(|v| !v.is_empty()) else {
                continue;
            };
            let value = value.to_string();
            debug!(module = "content", src = %value, "Fixed src");
            doc.set_attr(img, "src", &value);
        }
    }
}
