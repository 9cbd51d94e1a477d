// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::domain::models::task::Task;
use crate::utils::errors::PipelineError;

/// 阶段执行结果
#[derive(Debug)]
pub enum Outcome {
    /// 继续执行下一个阶段
    Continue,
    /// 重置任务并从第一个阶段重新开始处理新的URL
    Restart(String),
    /// 中止流水线
    Fail(PipelineError),
}

impl From<PipelineError> for Outcome {
    fn from(err: PipelineError) -> Self {
        Outcome::Fail(err)
    }
}

impl From<Result<(), PipelineError>> for Outcome {
    fn from(result: Result<(), PipelineError>) -> Self {
        match result {
            Ok(()) => Outcome::Continue,
            Err(e) => Outcome::Fail(e),
        }
    }
}

/// 流水线阶段
///
/// 阶段按顺序对同一个任务执行，同一时刻只有一个阶段持有任务的可变引用。
#[async_trait]
pub trait Stage: Send + Sync {
    /// 执行阶段
    async fn run(&self, task: &mut Task) -> Outcome;

    /// 获取阶段名称
    fn name(&self) -> &str;
}
