// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::content::rules::{PatternRules, RuleSet};
use crate::domain::models::task::Task;
use crate::domain::repositories::asset_repository::AssetStore;
use crate::engines::reqwest_engine::ReqwestFetcher;
use crate::engines::traits::Fetcher;
use crate::infrastructure::storage::create_asset_store;
use crate::pipeline::stages::{
    CleanStage, DownloadImagesStage, FeedStage, FetchStage, MetadataStage, NormalizeStage,
    PrepareStage, ReadableStage, ResolveStage, SanitizeStage, SiteSpecificStage, WordCountStage,
    DEFAULT_CONCURRENCY,
};
use crate::pipeline::{PipelineExecutor, Stage, DEFAULT_MAX_RESTARTS};
use crate::readable::{ContentExtractor, ReadabilityExtractor};
use crate::specific::{default_extractors, SiteExtractor};
use crate::utils::errors::PipelineError;

// === Section: Options ===

/// 单次抓取的开关
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// 提取元数据和订阅源
    pub metadata: bool,
    /// 预处理并提取正文
    pub readability: bool,
    /// 清理并规范化正文
    pub clean: bool,
    /// 下载图片到资源存储
    pub download_images: bool,
    /// 重启次数上限
    pub max_restarts: usize,
    /// 并行下载数
    pub concurrency: usize,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            metadata: true,
            readability: true,
            clean: true,
            download_images: false,
            max_restarts: DEFAULT_MAX_RESTARTS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl From<&Settings> for ScrapeOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            metadata: settings.pipeline.metadata,
            readability: settings.pipeline.readability,
            clean: settings.pipeline.clean,
            download_images: settings.pipeline.download_images,
            max_restarts: settings.pipeline.max_restarts,
            concurrency: settings.assets.concurrency,
        }
    }
}

// === Section: Service Definition ===

/// 抓取服务
///
/// 持有抓取器、资源存储和规则，为每个URL创建任务并执行流水线
pub struct ScrapeService {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn AssetStore>,
    patterns: Arc<PatternRules>,
    rules: Arc<RuleSet>,
    extractor: Arc<dyn ContentExtractor>,
    site_extractors: Vec<Arc<dyn SiteExtractor>>,
    options: ScrapeOptions,
}

// === Section: Implementation ===

impl ScrapeService {
    /// 使用默认白名单、Readability 提取器和内置站点提取器创建服务
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn AssetStore>,
        patterns: Arc<PatternRules>,
        options: ScrapeOptions,
    ) -> Self {
        Self {
            fetcher,
            store,
            patterns,
            rules: Arc::new(RuleSet::default()),
            extractor: Arc::new(ReadabilityExtractor::new()),
            site_extractors: default_extractors(),
            options,
        }
    }

    /// 根据配置创建服务
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(&settings.fetch).context("Failed to create fetcher")?;
        let store = create_asset_store(&settings.storage).context("Failed to create asset store")?;
        let patterns = PatternRules::load(settings.rules.path.as_deref())
            .context("Failed to load pattern rules")?;
        info!(module = "main", rules = patterns.len(), storage = %settings.storage.storage_type, "Scrape service configured");

        Ok(Self::new(
            Arc::new(fetcher),
            store,
            Arc::new(patterns),
            ScrapeOptions::from(settings),
        ))
    }

    /// 替换元素和属性白名单
    pub fn with_rules(mut self, rules: Arc<RuleSet>) -> Self {
        self.rules = rules;
        self
    }

    /// 替换正文提取器
    pub fn with_extractor(mut self, extractor: Arc<dyn ContentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// 替换站点提取器
    pub fn with_site_extractors(mut self, extractors: Vec<Arc<dyn SiteExtractor>>) -> Self {
        self.site_extractors = extractors;
        self
    }

    pub fn options(&self) -> &ScrapeOptions {
        &self.options
    }

    /// 按选项组装阶段
    pub fn build_pipeline(&self) -> PipelineExecutor {
        let o = &self.options;
        let mut stages: Vec<Arc<dyn Stage>> = vec![Arc::new(FetchStage::new(self.fetcher.clone()))];

        if o.metadata {
            stages.push(Arc::new(MetadataStage::new()));
            stages.push(Arc::new(FeedStage::new()));
        }
        stages.push(Arc::new(SiteSpecificStage::new(self.site_extractors.clone())));

        if o.readability {
            stages.push(Arc::new(PrepareStage::new(self.patterns.clone())));
        }
        stages.push(Arc::new(ResolveStage::new()));
        if o.readability {
            stages.push(Arc::new(ReadableStage::new(self.extractor.clone())));
        }

        if o.clean {
            stages.push(Arc::new(CleanStage::new(self.rules.clone())));
            stages.push(Arc::new(NormalizeStage::new()));
        }
        stages.push(Arc::new(SanitizeStage::new(self.rules.clone())));
        stages.push(Arc::new(WordCountStage::new()));

        if o.download_images {
            stages.push(Arc::new(DownloadImagesStage::new(
                self.fetcher.clone(),
                o.concurrency,
            )));
        }

        PipelineExecutor::new(stages, o.max_restarts)
    }

    /// 抓取一个URL，返回完成的任务
    pub async fn scrape(&self, url: &str) -> Result<Task, PipelineError> {
        let mut task = Task::new(url, self.store.clone());
        let pipeline = self.build_pipeline();

        if let Err(e) = pipeline.execute(&mut task).await {
            warn!(task = %task.id, module = "main", error = %e, "Scrape failed");
            return Err(e);
        }

        info!(
            task = %task.id,
            module = "main",
            url = %task.content_url(),
            status = ?task.status_code,
            words = task.word_count,
            "Scrape complete"
        );
        Ok(task)
    }
}
