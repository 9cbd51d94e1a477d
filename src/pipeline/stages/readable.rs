// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::models::task::Task;
use crate::pipeline::{Outcome, Stage};
use crate::readable::{select_candidate, Candidate, ContentExtractor};
use crate::utils::errors::{ExtractError, PipelineError};

/// 正文提取阶段
///
/// 主文档和备用文档分别提取正文，正文最长的候选替换工作文档，
/// 同时用它的标题覆盖任务标题（包括空标题），并把它的来源URL作为任务的实际URL。
pub struct ReadableStage {
    extractor: Arc<dyn ContentExtractor>,
}

impl ReadableStage {
    pub fn new(extractor: Arc<dyn ContentExtractor>) -> Self {
        Self { extractor }
    }

    fn candidates(&self, task: &Task) -> Vec<Candidate> {
        let mut candidates = Vec::with_capacity(2);

        let primary = match task.document.as_ref() {
            Some(doc) => self.extractor.extract(doc),
            None => Err(ExtractError::MissingBody),
        };
        candidates.push(Candidate::new(task.content_url(), primary));

        if let Some(doc) = task.alt_document.as_ref() {
            let url = task.alt_url.as_deref().unwrap_or_else(|| task.content_url());
            candidates.push(Candidate::new(url, self.extractor.extract(doc)));
        }
        candidates
    }

    fn apply(&self, task: &mut Task) -> Result<(), PipelineError> {
        let (url, article) = select_candidate(self.candidates(task))?;
        debug!(task = %task.id, module = "readable", url = %url, title = %article.title, "Use article");

        task.set_html(&article.content);
        task.title = article.title;
        task.actual_url = Some(url);
        Ok(())
    }
}

#[async_trait]
impl Stage for ReadableStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "readable", url = %task.content_url(), "Apply readability");
        self.apply(task).into()
    }

    fn name(&self) -> &str {
        "readable"
    }
}
