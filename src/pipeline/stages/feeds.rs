// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::models::task::{FeedInfo, Task};
use crate::pipeline::{Outcome, Stage};

const FEED_TYPES: &[&str] = &["application/rss+xml", "application/atom+xml", "text/xml"];

/// 订阅源发现阶段
///
/// 收集 `link rel="alternate"` 中类型为 RSS/Atom 的链接。
/// `body` 中的链接同样接受，相对地址按内容URL解析。
#[derive(Debug, Default)]
pub struct FeedStage;

impl FeedStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for FeedStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "rss", "Find feeds");

        let Some(doc) = task.document.as_ref() else {
            return Outcome::Continue;
        };
        let links: Vec<(String, String)> = doc
            .select(&["link"])
            .into_iter()
            .filter(|l| {
                doc.attr(*l, "rel")
                    .is_some_and(|r| r.trim().eq_ignore_ascii_case("alternate"))
            })
            .filter(|l| {
                doc.attr(*l, "type").is_some_and(|t| {
                    FEED_TYPES
                        .iter()
                        .any(|ft| t.trim().eq_ignore_ascii_case(ft))
                })
            })
            .filter_map(|l| {
                let href = doc.attr(l, "href").filter(|h| !h.trim().is_empty())?;
                let title = doc.attr(l, "title").unwrap_or_default();
                Some((href.trim().to_string(), title.to_string()))
            })
            .collect();

        for (href, title) in links {
            let url = match task.resolve_url(&href) {
                Ok(u) => u,
                Err(e) => {
                    warn!(task = %task.id, module = "rss", href = %href, error = %e, "Failed to resolve feed URL");
                    continue;
                }
            };
            if task.add_feed(FeedInfo { url: url.clone(), title }) {
                info!(task = %task.id, module = "rss", rss = %url, "Found feed link");
            }
        }
        Outcome::Continue
    }

    fn name(&self) -> &str {
        "feeds"
    }
}
