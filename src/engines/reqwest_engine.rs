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

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, SET_COOKIE};
use tracing::{debug, info};

use crate::config::settings::FetchSettings;
use crate::engines::traits::{AssetResponse, EngineError, FetchResponse, Fetcher};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGES: &str = "en-US,en;q=0.9,de;q=0.8";

/// 抓取引擎
///
/// 基于reqwest实现的HTTP抓取器，所有请求共享同一个cookie存储，
/// 响应按 `Content-Encoding` 解压、按字符集解码
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// 创建抓取器
    ///
    /// # 参数
    ///
    /// * `settings` - 抓取配置（超时、User-Agent）
    pub fn new(settings: &FetchSettings) -> Result<Self, EngineError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGES));

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, EngineError> {
        reqwest::Url::parse(url).map_err(|e| EngineError::InvalidUrl(format!("{}: {}", url, e)))?;

        let response = self.client.get(url).send().await?;

        // 服务端设置了cookie时带着cookie重试一次
        if !response.status().is_success() && response.headers().contains_key(SET_COOKIE) {
            info!(
                module = "fetch",
                url = url,
                status = response.status().as_u16(),
                "Repeat request with cookies"
            );
            return Ok(self.client.get(url).send().await?);
        }

        Ok(response)
    }
}

fn content_type_of(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("application/octet-stream")
        .to_string()
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 抓取响应
    /// * `Err(EngineError)` - 抓取过程中出现的错误
    async fn fetch(&self, url: &str) -> Result<FetchResponse, EngineError> {
        info!(module = "fetch", url = url, "Fetch URL");
        let start = Instant::now();

        let response = self.get(url).await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = content_type_of(&response);
        let body = response.text().await?;

        debug!(
            module = "fetch",
            url = %final_url,
            status = status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Status {}",
            status
        );

        Ok(FetchResponse {
            final_url,
            status,
            content_type,
            body,
        })
    }

    async fn fetch_asset(&self, url: &str) -> Result<AssetResponse, EngineError> {
        debug!(module = "assets", url = url, "Fetch asset");

        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = content_type_of(&response);
        let data = response.bytes().await?.to_vec();

        Ok(AssetResponse { content_type, data })
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
