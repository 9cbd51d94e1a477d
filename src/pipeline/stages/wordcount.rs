// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::domain::models::task::Task;
use crate::pipeline::{Outcome, Stage};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word pattern"));

/// 统计文本中的单词数
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// 字数统计阶段
#[derive(Debug, Default)]
pub struct WordCountStage;

impl WordCountStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for WordCountStage {
    async fn run(&self, task: &mut Task) -> Outcome {
        info!(task = %task.id, module = "metadata", url = %task.content_url(), "Count words");

        let text = task
            .document
            .as_ref()
            .map(|d| d.body_text())
            .unwrap_or_default();
        task.word_count = count_words(&text);
        debug!(task = %task.id, words = task.word_count, "Counted words");

        Outcome::Continue
    }

    fn name(&self) -> &str {
        "wordcount"
    }
}
