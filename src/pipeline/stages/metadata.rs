// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info};
use url::Url;

use crate::document::DocumentModel;
use crate::domain::models::task::Task;
use crate::pipeline::{Outcome, Stage};

const DESCRIPTION_PREF: &[&str] = &[
    "description",
    "og:description",
    "twitter:description",
    "sailthru.description",
    "preview",
    "krux:description",
];

const IMAGE_PREF: &[&str] = &[
    "og:image:secure_url",
    "og:image:url",
    "og:image",
    "link/image_src",
    "twitter:image",
    "twitter:image:src",
];

const URL_PREF: &[&str] = &["link/canonical", "canonicalURL", "og:url", "twitter:url"];

const AUTHOR_PREF: &[&str] = &[
    "author",
    "article:author",
    "book:author",
    "twitter:creator",
    "parsely-author",
    "sailthru.author",
];

const PUB_DATE_PREF: &[&str] = &[
    "article:published_time",
    "article:modified_time",
    "og:updated_time",
    "date",
    "last-modified",
    "iso-8601-publish-date",
    "parsely-pub-date",
    "sailthru.date",
];

const SITE_NAME_PREF: &[&str] = &["og:site_name", "application-name", "twitter:site"];

// 图标的优先顺序
const ICON_RELS: &[&str] = &["icon", "apple-touch-icon", "mask-icon", "shortcut icon"];

const HOST_PREFIXES: &[&str] = &["www.", "www1.", "www2."];

/// 从 `meta`/`link` 标签收集到的原始值，键为标签名称
#[derive(Debug, Default)]
struct Metadata {
    title: String,
    values: HashMap<String, String>,
}

impl Metadata {
    fn read(doc: &DocumentModel) -> Self {
        let mut m = Metadata::default();

        for meta in doc.select(&["meta"]) {
            // name 和 property 同时存在时使用 name
            let name = doc
                .attr(meta, "name")
                .filter(|n| !n.is_empty())
                .or_else(|| doc.attr(meta, "property"))
                .unwrap_or_default();
            let content = doc.attr(meta, "content").unwrap_or_default();
            if name.is_empty() || content.is_empty() {
                continue;
            }
            m.values
                .entry(name.to_string())
                .or_insert_with(|| content.to_string());
        }

        for link in doc.select(&["link"]) {
            let href = doc.attr(link, "href").unwrap_or_default();
            if href.is_empty() {
                continue;
            }
            let key = match doc.attr(link, "rel") {
                Some("canonical") => "link/canonical",
                Some("image_src") => "link/image_src",
                _ => continue,
            };
            m.values
                .entry(key.to_string())
                .or_insert_with(|| href.to_string());
        }

        if let Some(title) = doc.find_first("title") {
            m.title = doc.text(title).trim().to_string();
        }
        m
    }

    /// 按优先顺序取第一个存在的值
    fn preferred(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.values.get(*k))
            .map(String::as_str)
    }
}

/// 元数据阶段
///
/// 从文档头部读取标题、描述、主图、规范URL、作者和发布时间，
/// 并根据规范URL（或内容URL）确定站点。没有主图时依次回退到
/// 正文中的第一张图片和站点图标。
#[derive(Debug, Default)]
pub struct MetadataStage;

impl MetadataStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for MetadataStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "metadata", url = %task.content_url(), "Extract metadata");

        let Some(doc) = task.document.as_ref() else {
            return Outcome::Continue;
        };
        let m = Metadata::read(doc);
        let fallback_image = fallback_image(doc);
        apply_metadata(&m, task);

        if task.image_url.is_none() {
            if let Some(image) = fallback_image {
                debug!(task = %task.id, module = "metadata", image = %image, "Use fallback image");
                task.image_url = Some(image);
            }
        }
        set_site(task);

        Outcome::Continue
    }

    fn name(&self) -> &str {
        "metadata"
    }
}

fn apply_metadata(m: &Metadata, task: &mut Task) {
    if !m.title.is_empty() {
        task.title = m.title.clone();
    }
    if let Some(v) = m.preferred(DESCRIPTION_PREF) {
        task.description = v.to_string();
    }
    if let Some(v) = m.preferred(IMAGE_PREF) {
        task.image_url = Some(v.to_string());
    }
    if let Some(v) = m.preferred(URL_PREF) {
        task.canonical_url = Some(v.to_string());
    }
    if let Some(v) = m.preferred(AUTHOR_PREF) {
        task.author = v.to_string();
    }
    if let Some(v) = m.preferred(SITE_NAME_PREF) {
        task.site_name = v.to_string();
    }
    // 只看优先级最高的日期，解析失败时不再尝试其他来源
    if let Some(v) = m.preferred(PUB_DATE_PREF) {
        task.pub_date = parse_date(v);
    }
}

fn set_site(task: &mut Task) {
    let source = task
        .canonical_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| task.content_url());
    let Ok(url) = Url::parse(source) else {
        return;
    };
    let mut host = url.host_str().unwrap_or_default();
    for prefix in HOST_PREFIXES {
        if let Some(stripped) = host.strip_prefix(prefix) {
            host = stripped;
        }
    }
    task.site = host.to_string();
    task.site_scheme = url.scheme().to_string();
}

/// 解析发布时间：RFC 3339、RFC 2822、`YYYY-MM-DD hh:mm:ssZ`、`YYYY-MM-DD`
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%SZ") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// 没有声明主图时的回退：正文第一张图片，其次是最大的站点图标
fn fallback_image(doc: &DocumentModel) -> Option<String> {
    let from_content = doc.body().and_then(|body| {
        doc.select_within(body, &["img"])
            .into_iter()
            .find_map(|img| doc.attr(img, "src").filter(|s| !s.is_empty()))
            .map(str::to_string)
    });
    from_content.or_else(|| best_icon(doc))
}

struct Icon<'a> {
    rel_rank: usize,
    href: &'a str,
    area: u32,
}

fn best_icon(doc: &DocumentModel) -> Option<String> {
    let mut icons: Vec<Icon> = doc
        .select(&["link"])
        .into_iter()
        .filter_map(|link| {
            let rel = doc.attr(link, "rel")?;
            let rel_rank = ICON_RELS.iter().position(|r| r.eq_ignore_ascii_case(rel))?;
            let href = doc.attr(link, "href").filter(|h| !h.is_empty())?;
            let area = doc.attr(link, "sizes").map(icon_area).unwrap_or(0);
            Some(Icon {
                rel_rank,
                href,
                area,
            })
        })
        .collect();

    // 有尺寸的按面积从大到小，其余按 rel 的优先顺序；sort_by 是稳定排序
    icons.sort_by(|a, b| match (a.area, b.area) {
        (0, 0) => a.rel_rank.cmp(&b.rel_rank),
        (0, _) => std::cmp::Ordering::Greater,
        (_, 0) => std::cmp::Ordering::Less,
        _ => b.area.cmp(&a.area),
    });
    icons.first().map(|i| i.href.to_string())
}

fn icon_area(sizes: &str) -> u32 {
    let lower = sizes.to_ascii_lowercase();
    let Some((w, h)) = lower.split_once('x') else {
        return 0;
    };
    match (w.trim().parse::<u32>(), h.trim().parse::<u32>()) {
        (Ok(w), Ok(h)) => w.saturating_mul(h),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stages::testing::new_task;
    use chrono::TimeZone;

    async fn run_with(url: &str, html: &str) -> Task {
        let mut task = new_task(url);
        task.actual_url = Some(url.to_string());
        task.set_html(html);
        let outcome = MetadataStage::new().run(&mut task).await;
        assert!(matches!(outcome, Outcome::Continue));
        task
    }

    #[tokio::test]
    async fn test_read_metadata() {
        let html = r#"<html><head>
            <title> The Title </title>
            <meta name="description" content="The Description">
            <meta property="og:description" content="OG Description">
            <meta property="og:image" content="https://example.com/og.png">
            <meta property="og:image:secure_url" content="https://example.com/secure.png">
            <link rel="canonical" href="https://www.example.com/canonical">
            <meta property="og:url" content="https://example.com/og-url">
            <meta name="author" content="Jane Doe">
            <meta property="og:site_name" content="Example Site">
            <meta property="article:published_time" content="2021-03-04T05:06:07+01:00">
            </head><body><p>text</p></body></html>"#;

        let task = run_with("https://www2.example.org/article", html).await;

        assert_eq!(task.title, "The Title");
        assert_eq!(task.description, "The Description");
        assert_eq!(task.image_url.as_deref(), Some("https://example.com/secure.png"));
        assert_eq!(task.canonical_url.as_deref(), Some("https://www.example.com/canonical"));
        assert_eq!(task.author, "Jane Doe");
        assert_eq!(task.site_name, "Example Site");
        assert_eq!(
            task.pub_date,
            Some(Utc.with_ymd_and_hms(2021, 3, 4, 4, 6, 7).unwrap())
        );
        // 站点取自规范URL
        assert_eq!(task.site, "example.com");
        assert_eq!(task.site_scheme, "https");
    }

    #[tokio::test]
    async fn test_site_from_content_url() {
        let task = run_with("http://www1.example.org/a", "<html><body></body></html>").await;
        assert_eq!(task.site, "example.org");
        assert_eq!(task.site_scheme, "http");
        assert!(task.title.is_empty());
        assert!(task.pub_date.is_none());
    }

    #[tokio::test]
    async fn test_fallback_image_from_content() {
        let html = r#"<html><head><link rel="icon" href="/favicon.ico"></head>
            <body><img src=""><img src="/first.png"><img src="/second.png"></body></html>"#;
        let task = run_with("https://example.com/a", html).await;
        assert_eq!(task.image_url.as_deref(), Some("/first.png"));
    }

    #[tokio::test]
    async fn test_fallback_image_from_largest_icon() {
        let html = r#"<html><head>
            <link rel="icon" href="/small.png" sizes="16x16">
            <link rel="shortcut icon" href="/favicon.ico">
            <link rel="apple-touch-icon" href="/large.png" sizes="180X180">
            </head><body><p>no images</p></body></html>"#;
        let task = run_with("https://example.com/a", html).await;
        assert_eq!(task.image_url.as_deref(), Some("/large.png"));
    }

    #[test]
    fn test_icon_preference_without_sizes() {
        let doc = DocumentModel::parse(
            r#"<head><link rel="shortcut icon" href="/favicon.ico"><link rel="mask-icon" href="/mask.svg"></head>"#,
        );
        assert_eq!(best_icon(&doc).as_deref(), Some("/mask.svg"));
    }

    #[test]
    fn test_parse_date() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_date("2020-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_date("2020-01-02 03:04:05Z"), Some(expected));
        assert_eq!(parse_date("Thu, 02 Jan 2020 03:04:05 +0000"), Some(expected));
        assert_eq!(
            parse_date("2020-01-02"),
            Some(Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("yesterday"), None);
    }

    #[tokio::test]
    async fn test_unparseable_preferred_date() {
        let html = r#"<html><head>
            <meta property="article:published_time" content="not a date">
            <meta name="date" content="2020-01-02">
            </head><body></body></html>"#;
        let task = run_with("https://example.com/a", html).await;
        assert!(task.pub_date.is_none());
    }
}
