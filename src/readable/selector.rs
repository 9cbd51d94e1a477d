// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing::{info, warn};

use super::Article;
use crate::utils::errors::{ExtractError, PipelineError};

/// 一个参与选择的候选文档
#[derive(Debug, Clone)]
pub struct Candidate {
    /// 候选文档的来源URL
    pub url: String,
    /// 提取结果
    pub result: Result<Article, ExtractError>,
}

impl Candidate {
    pub fn new(url: impl Into<String>, result: Result<Article, ExtractError>) -> Self {
        Self {
            url: url.into(),
            result,
        }
    }
}

/// 选出正文最长的候选文档，返回（来源URL, 文章）
///
/// 提取失败的候选被排除而不是按0计分；长度相同时保留靠前的候选；
/// 全部失败时返回 [`PipelineError::NoCandidate`]。
pub fn select_candidate(candidates: Vec<Candidate>) -> Result<(String, Article), PipelineError> {
    let total = candidates.len();
    let mut best: Option<(String, Article)> = None;

    for candidate in candidates {
        let article = match candidate.result {
            Ok(article) => article,
            Err(e) => {
                warn!(module = "readable", url = %candidate.url, error = %e, "Readability failed for candidate");
                continue;
            }
        };
        let better = best
            .as_ref()
            .map_or(true, |(_, b)| article.text_length > b.text_length);
        if better {
            best = Some((candidate.url, article));
        }
    }

    let (url, article) = best.ok_or(PipelineError::NoCandidate)?;
    info!(
        module = "readable",
        url = %url,
        alternatives = total,
        length = article.text_length,
        "Selected best article by text length"
    );
    Ok((url, article))
}
