// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Readability 风格的正文提取
//!
//! 1. 删除脚本、样式等不含正文的元素和"不太可能"是正文的元素
//! 2. 不含块级子元素的 `div` 视为段落
//! 3. 按段落长度和逗号数计分，分数累加到父元素和祖父元素
//! 4. 按 class/id 加权，再按链接密度缩放
//! 5. 取最高分元素及达到阈值的兄弟元素，包裹在 `<article>` 中

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{Article, ContentExtractor};
use crate::document::{DocumentModel, NodeId};
use crate::utils::errors::ExtractError;

static UNLIKELY_CANDIDATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote",
    )
    .expect("valid unlikely candidates pattern")
});

static MAYBE_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)and|article|body|column|content|main|shadow")
        .expect("valid maybe candidate pattern")
});

static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story",
    )
    .expect("valid positive pattern")
});

static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)-ad-|hidden|^hid$| hid$| hid |^hid |banner|combx|comment|com-|contact|foot|footer|footnote|gdpr|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget",
    )
    .expect("valid negative pattern")
});

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.( |$)").expect("valid sentence end pattern"));

const NON_CONTENT: &[&str] = &[
    "script", "style", "noscript", "link", "meta", "template", "iframe", "object", "embed", "form",
    "input", "button", "select", "textarea", "svg",
];

const TAGS_TO_SCORE: &[&str] = &["section", "h2", "h3", "h4", "h5", "h6", "p", "td", "pre"];

// div 中出现这些元素时不视为段落
const DIV_TO_P_ELEMENTS: &[&str] = &[
    "blockquote", "dl", "div", "img", "ol", "p", "pre", "table", "ul", "figure", "section",
    "article",
];

// 从不因 class/id 被当作不太可能的候选删除
const NEVER_UNLIKELY: &[&str] = &["html", "body", "a", "article", "main"];

const MIN_PARAGRAPH_LENGTH: usize = 25;
const CLASS_WEIGHT: f64 = 25.0;

/// Readability 风格的正文提取器
#[derive(Debug, Clone, Default)]
pub struct ReadabilityExtractor;

impl ReadabilityExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ContentExtractor for ReadabilityExtractor {
    fn extract(&self, source: &DocumentModel) -> Result<Article, ExtractError> {
        let mut doc = source.clone();
        let title = extract_title(&doc);
        let body = doc.body().ok_or(ExtractError::MissingBody)?;

        for node in doc.select(NON_CONTENT) {
            doc.remove(node);
        }
        remove_unlikely_candidates(&mut doc, body);
        convert_divs_to_paragraphs(&mut doc, body);

        let scores = score_paragraphs(&doc, body);
        let top = top_candidate(&doc, &scores).unwrap_or(body);

        let selected = if top == body {
            doc.children(body)
        } else {
            collect_siblings(&doc, top, &scores)
        };

        let mut content = String::from("<article>");
        let mut text = String::new();
        for node in &selected {
            content.push_str(&doc.outer_html(*node));
            text.push_str(&doc.text(*node));
        }
        content.push_str("</article>");

        let text_length = text.trim().chars().count();
        if text_length == 0 {
            return Err(ExtractError::NoContent);
        }
        debug!(module = "readable", text_length, nodes = selected.len(), "Extracted article");

        Ok(Article {
            title,
            content,
            text_length,
        })
    }
}

/// 按链接密度缩放后的最高分候选
fn top_candidate(doc: &DocumentModel, scores: &HashMap<NodeId, f64>) -> Option<NodeId> {
    scores
        .iter()
        .map(|(node, score)| (*node, score * (1.0 - link_density(doc, *node))))
        // 分数相同时取文档顺序靠前的
        .min_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)))
        .map(|(node, _)| node)
}

/// 标题：`og:title`、`<title>`、第一个 `h1`，依次回退
pub fn extract_title(doc: &DocumentModel) -> String {
    let og_title = doc.select(&["meta"]).into_iter().find_map(|m| {
        let property = doc.attr(m, "property").or_else(|| doc.attr(m, "name"))?;
        if property.eq_ignore_ascii_case("og:title") {
            doc.attr(m, "content").map(str::trim).filter(|c| !c.is_empty())
        } else {
            None
        }
    });
    if let Some(title) = og_title {
        return title.to_string();
    }

    ["title", "h1"]
        .iter()
        .filter_map(|tag| doc.find_first(tag))
        .map(|node| doc.text(node).trim().to_string())
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn class_and_id(doc: &DocumentModel, node: NodeId) -> String {
    format!(
        "{} {}",
        doc.attr(node, "class").unwrap_or_default(),
        doc.attr(node, "id").unwrap_or_default()
    )
}

fn remove_unlikely_candidates(doc: &mut DocumentModel, body: NodeId) {
    doc.walk_elements_within(body, |doc, node| {
        if doc.is_named(node, NEVER_UNLIKELY) {
            return;
        }
        let match_string = class_and_id(doc, node);
        if match_string.trim().is_empty() {
            return;
        }
        if UNLIKELY_CANDIDATES.is_match(&match_string)
            && !MAYBE_CANDIDATE.is_match(&match_string)
            && !doc.has_ancestor(node, "table")
            && !doc.has_ancestor(node, "code")
        {
            debug!(module = "readable", candidate = %match_string.trim(), "Remove unlikely candidate");
            doc.remove(node);
        }
    });
}

fn convert_divs_to_paragraphs(doc: &mut DocumentModel, body: NodeId) {
    for div in doc.select_within(body, &["div"]) {
        let has_block = doc
            .descendants(div)
            .into_iter()
            .any(|d| doc.is_named(d, DIV_TO_P_ELEMENTS));
        if !has_block && !doc.text(div).trim().is_empty() {
            doc.rename(div, "p");
        }
    }
}

fn class_weight(doc: &DocumentModel, node: NodeId) -> f64 {
    let mut weight = 0.0;
    for attr in ["class", "id"] {
        let Some(value) = doc.attr(node, attr).filter(|v| !v.is_empty()) else {
            continue;
        };
        if NEGATIVE.is_match(value) {
            weight -= CLASS_WEIGHT;
        }
        if POSITIVE.is_match(value) {
            weight += CLASS_WEIGHT;
        }
    }
    weight
}

fn initial_score(doc: &DocumentModel, node: NodeId) -> f64 {
    let base = match doc.name(node).unwrap_or_default() {
        "div" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    base + class_weight(doc, node)
}

fn score_paragraphs(doc: &DocumentModel, body: NodeId) -> HashMap<NodeId, f64> {
    let mut scores: HashMap<NodeId, f64> = HashMap::new();

    for paragraph in doc.select_within(body, TAGS_TO_SCORE) {
        let text = doc.text(paragraph);
        let text = text.trim();
        let length = text.chars().count();
        if length < MIN_PARAGRAPH_LENGTH {
            continue;
        }

        let commas = text.matches(',').count() as f64;
        let content_score = 1.0 + commas + (length as f64 / 100.0).floor().min(3.0);

        let mut ancestor = doc.parent(paragraph);
        for level in 0..3 {
            let Some(node) = ancestor.filter(|a| doc.is_element(*a)) else {
                break;
            };
            let divider = match level {
                0 => 1.0,
                1 => 2.0,
                n => n as f64 * 3.0,
            };
            let score = scores
                .entry(node)
                .or_insert_with(|| initial_score(doc, node));
            *score += content_score / divider;

            if node == body {
                break;
            }
            ancestor = doc.parent(node);
        }
    }
    scores
}

/// 链接文本占元素文本的比例
fn link_density(doc: &DocumentModel, node: NodeId) -> f64 {
    let total = doc.text(node).trim().chars().count();
    if total == 0 {
        return 0.0;
    }
    let links: usize = doc
        .select_within(node, &["a"])
        .into_iter()
        .map(|a| doc.text(a).trim().chars().count())
        .sum();
    links as f64 / total as f64
}

/// 最高分候选及其达到阈值的兄弟元素，按文档顺序
fn collect_siblings(doc: &DocumentModel, top: NodeId, scores: &HashMap<NodeId, f64>) -> Vec<NodeId> {
    let Some(parent) = doc.parent(top) else {
        return vec![top];
    };
    let top_score = scores.get(&top).copied().unwrap_or_default();
    let threshold = (top_score * 0.2).max(10.0);
    let top_class = doc.attr(top, "class").filter(|c| !c.is_empty());

    doc.element_children(parent)
        .into_iter()
        .filter(|sibling| {
            if *sibling == top {
                return true;
            }
            let mut bonus = 0.0;
            if top_class.is_some() && doc.attr(*sibling, "class") == top_class {
                bonus += top_score * 0.2;
            }
            if let Some(score) = scores.get(sibling) {
                if score + bonus >= threshold {
                    return true;
                }
            }
            if !doc.is_named(*sibling, &["p"]) {
                return false;
            }
            let text = doc.text(*sibling);
            let text = text.trim();
            let length = text.chars().count();
            let density = link_density(doc, *sibling);
            (length > 80 && density < 0.25)
                || (length > 0 && length <= 80 && density == 0.0 && SENTENCE_END.is_match(text))
        })
        .collect()
}
