// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心数据结构：
/// - 领域模型（models）：任务及其收集的记录
/// - 仓库接口（repositories）：资源存储抽象接口
pub mod models;
pub mod repositories;
