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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "DISTILLRS";

/// 应用程序配置设置
///
/// 包含流水线、抓取、资源下载、规则和存储等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 流水线配置
    pub pipeline: PipelineSettings,
    /// 抓取配置
    pub fetch: FetchSettings,
    /// 资源下载配置
    pub assets: AssetSettings,
    /// 规则文件配置
    #[serde(default)]
    pub rules: RuleSettings,
    /// 存储配置
    pub storage: StorageSettings,
}

/// 流水线配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// 是否提取元数据
    pub metadata: bool,
    /// 是否执行正文提取
    pub readability: bool,
    /// 是否清理HTML
    pub clean: bool,
    /// 是否下载图片
    pub download_images: bool,
    /// 单次运行允许的最大重启次数
    pub max_restarts: usize,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// User-Agent
    pub user_agent: String,
}

/// 资源下载配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct AssetSettings {
    /// 并行下载数
    pub concurrency: usize,
}

/// 规则文件配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSettings {
    /// 覆盖内置规则的YAML文件路径
    pub path: Option<String>,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储类型 (memory, local)
    pub storage_type: String,
    /// 本地存储路径 (当 type=local 时使用)
    pub local_path: Option<String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `DISTILLRS__*` 环境变量，后者覆盖前者
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 只包含内置默认值的配置
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::defaults(Config::builder())?.build()?.try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            // Default pipeline switches
            .set_default("pipeline.metadata", true)?
            .set_default("pipeline.readability", true)?
            .set_default("pipeline.clean", true)?
            .set_default("pipeline.download_images", true)?
            .set_default("pipeline.max_restarts", 3)?
            // Default fetch settings
            .set_default("fetch.timeout_secs", 30)?
            .set_default(
                "fetch.user_agent",
                "Mozilla/5.0 (compatible; distillrs/0.1; +https://github.com/Kirky-X)",
            )?
            // Default asset settings
            .set_default("assets.concurrency", 4)?
            // Default Storage settings
            .set_default("storage.storage_type", "memory")?
            .set_default("storage.local_path", "./storage")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
