// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 嵌入内容和结构化数据
//!
//! - YouTube 嵌入的 `iframe` 替换为缩略图加链接
//! - JSON-LD 中的 `Audio` 对象转为附件

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::document::{DocumentModel, NodeId};
use crate::domain::models::task::{Enclosure, Task};

const YOUTUBE_THUMBNAIL_QUALITY: &str = "mqdefault";

/// 替换所有已知视频站点的嵌入 `iframe`
pub fn resolve_iframes(doc: &mut DocumentModel) {
    for iframe in doc.select(&["iframe"]) {
        let Some(src) = doc.attr(iframe, "src").map(str::to_string) else {
            continue;
        };
        debug!(module = "content", src = %src, "Found iframe");

        // 协议相对的嵌入地址很常见
        let absolute = if src.starts_with("//") {
            format!("https:{}", src)
        } else {
            src.clone()
        };
        let url = match Url::parse(&absolute) {
            Ok(url) => url,
            Err(e) => {
                warn!(module = "content", src = %src, error = %e, "Failed to parse iframe src");
                continue;
            }
        };

        let host = url.host_str().unwrap_or_default();
        if host.strip_prefix("www.").unwrap_or(host) == "youtube.com" {
            youtube_video(doc, iframe, &url);
        }
    }
}

fn youtube_video(doc: &mut DocumentModel, iframe: NodeId, src: &Url) {
    // https://www.youtube.com/embed/lC8T4HXrkpk?feature=oembed
    let segments: Vec<&str> = src
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    let video_id = match segments.as_slice() {
        ["embed", id, ..] if !id.is_empty() => id.to_string(),
        _ => return,
    };

    let caption_text = match doc.attr(iframe, "title").filter(|t| !t.is_empty()) {
        Some(title) => format!("Watch the video {:?} on YouTube.", title),
        None => "Watch this video on YouTube.".to_string(),
    };

    let img = doc.create_element(
        "img",
        vec![
            (
                "src".to_string(),
                format!(
                    "https://img.youtube.com/vi/{}/{}.jpg",
                    video_id, YOUTUBE_THUMBNAIL_QUALITY
                ),
            ),
            ("width".to_string(), "400".to_string()),
        ],
    );
    let link = doc.create_element(
        "a",
        vec![(
            "href".to_string(),
            format!("https://youtube.com/watch?v={}", video_id),
        )],
    );
    let text = doc.create_text(&caption_text);
    doc.append(link, text);
    let caption = doc.create_element("figcaption", Vec::new());
    doc.append(caption, link);

    let figure = doc.create_element("figure", Vec::new());
    doc.append(figure, img);
    doc.append(figure, caption);
    doc.replace(iframe, figure);
    debug!(module = "content", video = %video_id, "Replaced YouTube iframe");
}

/// 从主文档的 JSON-LD 脚本中收集附件，返回新增的附件数
///
/// 必须在预处理删除 `script` 元素之前调用。
pub fn collect_json_ld(task: &Task) -> usize {
    let Some(doc) = task.document.as_ref() else {
        return 0;
    };

    let mut added = 0;
    for script in doc.select(&["script"]) {
        if doc.attr(script, "type") != Some("application/ld+json") {
            continue;
        }
        let value: Value = match serde_json::from_str(&doc.text(script)) {
            Ok(value) => value,
            Err(e) => {
                warn!(module = "content", error = %e, "Failed to parse JSON-LD");
                continue;
            }
        };

        let objects = match value {
            Value::Array(items) => items,
            other => vec![other],
        };
        for object in &objects {
            if let Some(enclosure) = audio_enclosure(task, object) {
                if task.add_enclosure(enclosure) {
                    info!(task = %task.id, module = "content", "Add audio enclosure");
                    added += 1;
                }
            }
        }
    }
    added
}

fn audio_enclosure(task: &Task, object: &Value) -> Option<Enclosure> {
    if object.get("@type").and_then(Value::as_str) != Some("Audio") {
        return None;
    }
    let content_url = object.get("contentUrl").and_then(Value::as_str)?;
    let url = task.resolve_url(content_url).ok()?;
    let field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(Enclosure {
        kind: "audio".to_string(),
        title: field("name"),
        url,
        content_type: field("encodingFormat"),
        description: field("description"),
    })
}
