// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 任务（task）：一次抓取作业的全部可变状态，以及它收集的图片、订阅源和附件记录
pub mod task;
