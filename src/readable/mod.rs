// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 正文提取
//!
//! 每个候选文档（主文档和可选的AMP备用文档）独立提取正文，
//! 再由 [`selector`] 按正文长度选出最终结果。

use crate::document::DocumentModel;
use crate::utils::errors::ExtractError;

/// AMP文档识别
pub mod amp;

/// Readability 风格的正文提取器
pub mod readability;

/// 候选文档选择
pub mod selector;

pub use readability::ReadabilityExtractor;
pub use selector::{select_candidate, Candidate};

/// 提取出的文章
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// 文章标题
    pub title: String,
    /// 正文HTML，最外层为 `<article>`
    pub content: String,
    /// 正文文本长度（字符数）
    pub text_length: usize,
}

/// 正文提取器接口
///
/// 实现不得修改输入文档。
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, doc: &DocumentModel) -> Result<Article, ExtractError>;
}
