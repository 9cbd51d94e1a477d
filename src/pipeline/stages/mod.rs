// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 流水线阶段实现
//!
//! 执行顺序：抓取 → 元数据 → 订阅源 → 站点规则 → 预处理 → URL解析 →
//! 正文提取 → 清理 → 规范化 → 安全过滤 → 字数统计 → 图片下载

mod assets;
mod content;
mod feeds;
mod fetch;
mod metadata;
mod readable;
mod specific;
mod wordcount;

#[cfg(test)]
pub(crate) mod testing;

pub use assets::{DownloadImagesStage, DEFAULT_CONCURRENCY};
pub use content::{CleanStage, NormalizeStage, PrepareStage, ResolveStage, SanitizeStage};
pub use feeds::FeedStage;
pub use fetch::{find_refresh_url, FetchStage};
pub use metadata::MetadataStage;
pub use readable::ReadableStage;
pub use specific::SiteSpecificStage;
pub use wordcount::WordCountStage;
