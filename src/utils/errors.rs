// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::engines::traits::EngineError;

/// 流水线错误类型
///
/// 只有致命错误才会以该类型出现，可恢复的问题在最小范围内记录日志后跳过。
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("抓取失败: {0}")]
    Fetch(#[from] EngineError),

    #[error("HTTP状态异常: {status} ({url})")]
    HttpStatus { status: u16, url: String },

    #[error("文档为空: {0}")]
    EmptyDocument(String),

    #[error("没有可用的正文候选")]
    NoCandidate,

    #[error("URL解析失败: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("重启次数超过上限: {0}")]
    TooManyRestarts(usize),
}

/// 正文提取错误类型
///
/// 表示单个候选文档提取失败，只要还有其他候选成功就不会中止流水线。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("文档没有body元素")]
    MissingBody,

    #[error("未找到正文内容")]
    NoContent,
}

/// 规则文件错误类型
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("规则文件解析失败: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("规则文件读取失败: {0}")]
    Io(#[from] std::io::Error),
}
