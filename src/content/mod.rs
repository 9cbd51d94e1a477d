// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 预处理：提取正文前去掉页面框架和干扰内容
pub mod prepare;

/// 清理：按白名单删除元素和属性
pub mod clean;

/// 结构规范化
pub mod normalize;

/// 防御性清理
pub mod sanitize;

/// URL解析
pub mod resolve;

/// 响应式图片解析
pub mod picture;

/// 声明式规则引擎
pub mod rules;

/// 嵌入内容和结构化数据
pub mod special;
