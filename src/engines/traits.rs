// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },
    /// 无效URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// 页面抓取响应
///
/// 内容已完成解压和字符集解码
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// 跟随重定向后的最终URL
    pub final_url: String,
    /// HTTP状态码
    pub status: u16,
    /// 内容类型
    pub content_type: String,
    /// 解码后的文本内容
    pub body: String,
}

/// 二进制资源响应
#[derive(Debug, Clone)]
pub struct AssetResponse {
    /// 内容类型
    pub content_type: String,
    /// 原始字节
    pub data: Vec<u8>,
}

/// 抓取器特质
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// 抓取页面
    ///
    /// 非成功状态码不视为错误，由调用方根据 `status` 判断
    async fn fetch(&self, url: &str) -> Result<FetchResponse, EngineError>;

    /// 下载二进制资源，非成功状态码返回 `EngineError::Status`
    async fn fetch_asset(&self, url: &str) -> Result<AssetResponse, EngineError>;

    /// 抓取器名称
    fn name(&self) -> &'static str;
}
