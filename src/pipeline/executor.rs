// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::stage::{Outcome, Stage};
use crate::domain::models::task::Task;
use crate::utils::errors::PipelineError;

/// 默认允许的重启次数
pub const DEFAULT_MAX_RESTARTS: usize = 3;

/// 流水线执行器
///
/// 按顺序执行阶段。某个阶段请求重启时，重置任务、设置新的URL，
/// 然后从第一个阶段重新开始；原来这一轮中剩余的阶段不再执行。
pub struct PipelineExecutor {
    stages: Vec<Arc<dyn Stage>>,
    max_restarts: usize,
}

impl PipelineExecutor {
    /// 创建执行器
    ///
    /// # 参数
    ///
    /// * `stages` - 按执行顺序排列的阶段
    /// * `max_restarts` - 一次执行中允许的最大重启次数
    pub fn new(stages: Vec<Arc<dyn Stage>>, max_restarts: usize) -> Self {
        Self {
            stages,
            max_restarts,
        }
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// 对任务执行全部阶段
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 所有阶段执行完成
    /// * `Err(PipelineError)` - 某个阶段失败，或重启次数超过上限
    pub async fn execute(&self, task: &mut Task) -> Result<(), PipelineError> {
        let mut restarts = 0;

        'run: loop {
            for stage in &self.stages {
                debug!(task = %task.id, stage = stage.name(), "Run stage");
                match stage.run(task).await {
                    Outcome::Continue => {}
                    Outcome::Restart(url) => {
                        restarts += 1;
                        if restarts > self.max_restarts {
                            warn!(
                                task = %task.id,
                                stage = stage.name(),
                                url = %url,
                                max_restarts = self.max_restarts,
                                "Restart limit reached"
                            );
                            return Err(PipelineError::TooManyRestarts(self.max_restarts));
                        }
                        info!(
                            task = %task.id,
                            stage = stage.name(),
                            from = %task.url,
                            to = %url,
                            "Restart pipeline with new URL"
                        );
                        task.reset();
                        task.url = url;
                        continue 'run;
                    }
                    Outcome::Fail(err) => {
                        warn!(task = %task.id, stage = stage.name(), error = %err, "Stage failed");
                        return Err(err);
                    }
                }
            }
            return Ok(());
        }
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
