// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 任务流水线
//!
//! [`PipelineExecutor`] 按顺序对一个 [`Task`](crate::domain::models::task::Task)
//! 执行 [`Stage`] 列表，并负责重启语义。
mod executor;
mod stage;

/// 内置阶段
pub mod stages;

pub use executor::{PipelineExecutor, DEFAULT_MAX_RESTARTS};
pub use stage::{Outcome, Stage};
