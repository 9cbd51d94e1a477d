// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Deserialize;
use tracing::debug;

use super::{replace_body, SiteExtractor};
use crate::document::DocumentModel;
use crate::domain::models::task::Task;
use crate::pipeline::Outcome;

/// `<script data-component-props="ArticleBody">` 中的JSON
#[derive(Debug, Deserialize)]
struct ArticleBody {
    #[serde(default)]
    body: Option<String>,
}

/// bloomberg.com：正文以JSON形式放在脚本中
#[derive(Debug, Default)]
pub struct BloombergExtractor;

impl BloombergExtractor {
    fn article_body(doc: &DocumentModel) -> Option<Result<ArticleBody, serde_json::Error>> {
        doc.select(&["script"])
            .into_iter()
            .find(|s| {
                doc.attr(*s, "type") == Some("application/json")
                    && doc.attr(*s, "data-component-props") == Some("ArticleBody")
            })
            .map(|s| serde_json::from_str(&doc.text(s)))
    }
}

impl SiteExtractor for BloombergExtractor {
    fn matches(&self, host: &str) -> bool {
        host == "bloomberg.com"
    }

    fn apply(&self, task: &mut Task) -> Outcome {
        debug!(task = %task.id, module = "specific", src = %task.content_url(), "Apply bloomberg");

        let Some(doc) = task.document.as_mut() else {
            return Outcome::Continue;
        };
        let body = match Self::article_body(doc) {
            Some(Ok(ArticleBody { body: Some(body) })) => body,
            Some(Ok(_)) | None => return Outcome::Continue,
            Some(Err(e)) => {
                debug!(task = %task.id, module = "specific", error = %e, "Failed to parse JSON-Article-Data");
                return Outcome::Continue;
            }
        };

        if let Some(article) = replace_body(doc) {
            doc.append_html(article, &body);
            debug!(task = %task.id, module = "specific", "Replaced content");
        }
        Outcome::Continue
    }

    fn name(&self) -> &'static str {
        "bloomberg"
    }
}
