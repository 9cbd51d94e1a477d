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

use std::io::Write;

use anyhow::{bail, Context};
use tracing::info;

use distillrs::application::scrape::ScrapeService;
use distillrs::config::settings::Settings;
use distillrs::presentation::renderer::{HtmlRenderer, Renderer};
use distillrs::utils::telemetry;

const USAGE: &str = "usage: distillrs <url> [output.html]";

/// 主函数
///
/// 抓取一个URL并把结果渲染为独立的HTML页面，写入文件或标准输出
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        bail!(USAGE);
    };
    let output = args.next();
    if args.next().is_some() {
        bail!(USAGE);
    }

    // 1. Initialize logging
    telemetry::init_telemetry(std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json"));
    info!("Starting distillrs...");

    // 2. Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;
    info!("Configuration loaded");

    // 3. Scrape
    let service = ScrapeService::from_settings(&settings)?;
    let task = service
        .scrape(&url)
        .await
        .with_context(|| format!("Failed to scrape {}", url))?;

    // 4. Render
    let html = HtmlRenderer::new()
        .render(&task)
        .await
        .context("Failed to render HTML")?;
    match output {
        Some(path) => {
            std::fs::write(&path, &html).with_context(|| format!("Failed to write {}", path))?;
            info!(path = %path, bytes = html.len(), "Output written");
        }
        None => std::io::stdout().write_all(&html)?,
    }

    Ok(())
}
