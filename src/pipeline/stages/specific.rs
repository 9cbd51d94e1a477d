// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::domain::models::task::Task;
use crate::pipeline::{Outcome, Stage};
use crate::specific::{default_extractors, SiteExtractor};
use crate::utils::errors::PipelineError;
use crate::utils::url_utils::site_host;

/// 站点特定处理阶段
///
/// 按内容URL的主机选择第一个匹配的提取器。
pub struct SiteSpecificStage {
    extractors: Vec<Arc<dyn SiteExtractor>>,
}

impl Default for SiteSpecificStage {
    fn default() -> Self {
        Self::new(default_extractors())
    }
}

impl SiteSpecificStage {
    pub fn new(extractors: Vec<Arc<dyn SiteExtractor>>) -> Self {
        Self { extractors }
    }
}

#[async_trait]
impl Stage for SiteSpecificStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "specific", "Apply site-specific rules");

        let host = match Url::parse(task.content_url()) {
            Ok(url) => site_host(&url).unwrap_or_default(),
            Err(e) => return Outcome::Fail(PipelineError::InvalidUrl(e)),
        };
        match self.extractors.iter().find(|e| e.matches(&host)) {
            Some(extractor) => {
                debug!(task = %task.id, module = "specific", host = %host, extractor = extractor.name(), "Site extractor matched");
                extractor.apply(task)
            }
            None => Outcome::Continue,
        }
    }

    fn name(&self) -> &str {
        "specific"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stages::testing::new_task;

    struct Tagging;

    impl SiteExtractor for Tagging {
        fn matches(&self, host: &str) -> bool {
            host == "example.com"
        }

        fn apply(&self, task: &mut Task) -> Outcome {
            task.title = "tagged".to_string();
            Outcome::Continue
        }

        fn name(&self) -> &'static str {
            "tagging"
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_host_without_www() {
        let stage = SiteSpecificStage::new(vec![Arc::new(Tagging)]);

        let mut task = new_task("https://www.example.com/a");
        stage.run(&mut task).await;
        assert_eq!(task.title, "tagged");

        let mut task = new_task("https://sub.example.com/a");
        stage.run(&mut task).await;
        assert!(task.title.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_fails() {
        let stage = SiteSpecificStage::default();
        let mut task = new_task("::");
        assert!(matches!(
            stage.run(&mut task).await,
            Outcome::Fail(PipelineError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_linkedin_shared_article_requests_restart() {
        let stage = SiteSpecificStage::default();
        let mut task = new_task("https://www.linkedin.com/posts/x");
        task.set_html(
            r#"<html><body><div class="share-article"><a class="mini-card__title-link" href="/redir">a</a></div></body></html>"#,
        );

        match stage.run(&mut task).await {
            Outcome::Restart(url) => assert_eq!(url, "https://www.linkedin.com/redir"),
            other => panic!("expected restart, got {:?}", other),
        }
    }
}
