//! 批量文章处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量文章的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：连接数据库、创建 OCR / 纠错客户端和图片存储
//! 2. **文章选择**：按筛选条件查询文章 ID，查询结束即关闭连接池
//! 3. **并发控制**：每篇文章一个任务（JoinSet），Semaphore 限制同时处理的数量
//! 4. **结果汇总**：按输入顺序收集结果并生成 `RunReport`
//! 5. **运行超时**：可选的整体超时，超时后取消所有未完成的任务
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单篇文章的细节，委托给 `ArticleFlow`
//! - **失败隔离**：单篇文章的失败只体现在它自己的结果里

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::clients::{CompletionClient, VisionClient};
use crate::config::{Config, Settings};
use crate::error::AppError;
use crate::infrastructure::{ArticleIndex, FsArtifactStore, PostgresArticleIndex};
use crate::models::{ArticleId, ErrorKind, ProcessingResult, SelectionCriteria};
use crate::orchestrator::report::RunReport;
use crate::services::Selector;
use crate::utils::logging::{log_articles_selected, log_startup};
use crate::workflow::{ArticleCtx, ArticleFlow};

/// 应用主结构
pub struct App {
    settings: Settings,
    criteria: SelectionCriteria,
    selector: Selector,
    flow: Arc<ArticleFlow>,
    /// 选择结束后需要关闭的连接池
    postgres: Option<Arc<PostgresArticleIndex>>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config.settings, &config.criteria);

        let postgres = Arc::new(
            PostgresArticleIndex::connect(&config.settings.database_url, config.settings.request_timeout)
                .await
                .context("连接数据库失败")?,
        );

        let vision = VisionClient::new(&config.settings).context("创建 OCR 客户端失败")?;
        let completion = CompletionClient::new(&config.settings).context("创建纠错客户端失败")?;
        let artifacts = FsArtifactStore::new(&config.settings.artifact_dir);

        let flow = ArticleFlow::new(Arc::new(artifacts), Arc::new(vision), Arc::new(completion));

        let mut app = Self::with_components(config, postgres.clone(), flow);
        app.postgres = Some(postgres);
        Ok(app)
    }

    /// 使用给定的组件创建应用
    pub fn with_components(config: Config, index: Arc<dyn ArticleIndex>, flow: ArticleFlow) -> Self {
        Self {
            selector: Selector::new(index, config.schema),
            settings: config.settings,
            criteria: config.criteria,
            flow: Arc::new(flow),
            postgres: None,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<RunReport, AppError> {
        // 选择文章
        let selected = self.selector.select(&self.criteria).await;
        if let Some(postgres) = &self.postgres {
            postgres.close().await;
        }
        let ids = selected?;

        let report = if ids.is_empty() {
            warn!("⚠️ 没有找到符合条件的文章，程序结束");
            RunReport::no_matches()
        } else {
            log_articles_selected(ids.len(), self.settings.max_concurrent_articles);

            let results = match self.settings.run_timeout {
                Some(limit) => tokio::time::timeout(limit, self.process_all(ids))
                    .await
                    .map_err(|_| {
                        error!("❌ 运行超时 ({} 秒)，取消所有未完成的任务", limit.as_secs());
                        AppError::RunTimedOut {
                            secs: limit.as_secs(),
                        }
                    })?,
                None => self.process_all(ids).await,
            };

            RunReport::from_results(results, self.settings.preview_chars)
        };

        // 输出最终统计
        report.log_summary();

        if let Some(path) = &self.settings.report_file {
            report.write_json(path).await?;
        }

        Ok(report)
    }

    /// 并发处理所有文章，结果按输入顺序返回
    ///
    /// 每篇文章恰好得到一个结果；future 被丢弃时 JoinSet 会取消所有任务
    async fn process_all(&self, ids: Vec<ArticleId>) -> Vec<ProcessingResult> {
        let total = ids.len();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_articles));
        let mut tasks = JoinSet::new();

        for (idx, article_id) in ids.iter().enumerate() {
            let ctx = ArticleCtx::new(article_id.clone(), idx + 1, total);
            let flow = self.flow.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                // 信号量不会被关闭
                let _permit = semaphore.acquire_owned().await;
                info!("{} 🚀 开始处理", ctx);
                (idx, flow.run_guarded(&ctx).await)
            });
        }

        let mut slots: Vec<Option<ProcessingResult>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => error!("❌ 任务异常结束: {}", e),
            }
        }

        ids.into_iter()
            .zip(slots)
            .map(|(article_id, slot)| {
                slot.unwrap_or_else(|| {
                    ProcessingResult::failure(article_id, ErrorKind::Unexpected, "任务未返回结果")
                })
            })
            .collect()
    }
}
