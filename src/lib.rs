// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 组装流水线并对外提供抓取服务
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 内容处理模块
///
/// 规则引擎、图片解析、清理、规范化和安全过滤
pub mod content;

/// 文档模块
///
/// 拥有解析后DOM树的文档模型
pub mod document;

/// 领域模块
///
/// 包含任务实体和资源存储接口
pub mod domain;

/// 引擎模块
///
/// 页面和资源的抓取实现
pub mod engines;

/// 基础设施模块
///
/// 资源存储实现
pub mod infrastructure;

/// 流水线模块
///
/// 阶段定义、执行器和内置阶段
pub mod pipeline;

/// 表示层模块
///
/// 把完成的任务渲染为输出格式
pub mod presentation;

/// 正文提取模块
pub mod readable;

/// 站点特定处理模块
pub mod specific;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
