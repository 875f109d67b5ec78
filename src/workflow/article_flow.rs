//! 文章处理流程 - 流程层
//!
//! 核心职责：定义"一篇文章"的完整处理流程
//!
//! 流程顺序：
//! 1. 读取扫描图片
//! 2. OCR：图片描述 + 文字识别 → 原始文本
//! 3. 纠错服务 → 纠正后的文本 + token 用量
//! 4. 组装结果
//!
//! 任何一步失败都只产生该文章的 Failure 结果，不会影响其他文章

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info};

use crate::infrastructure::ArtifactStore;
use crate::models::{ArticleId, ArticleSuccess, ErrorKind, ProcessingResult};
use crate::services::{extract_raw_text, CorrectionService, OcrService, SYSTEM_PROMPT};
use crate::utils::logging::truncate_text;
use crate::workflow::article_ctx::ArticleCtx;

/// 文章处理流程
///
/// - 编排 读图 → OCR → 纠错
/// - 不持有任何可变状态，可在多个任务间共享
/// - 只依赖业务能力（services）和工件存储
pub struct ArticleFlow {
    artifacts: Arc<dyn ArtifactStore>,
    ocr: Arc<dyn OcrService>,
    correction: Arc<dyn CorrectionService>,
}

impl ArticleFlow {
    /// 创建新的文章处理流程
    pub fn new(
        artifacts: Arc<dyn ArtifactStore>,
        ocr: Arc<dyn OcrService>,
        correction: Arc<dyn CorrectionService>,
    ) -> Self {
        Self {
            artifacts,
            ocr,
            correction,
        }
    }

    /// 处理单篇文章
    pub async fn process(&self, article_id: &ArticleId) -> ProcessingResult {
        self.run(&ArticleCtx::single(article_id.clone())).await
    }

    /// 按上下文处理单篇文章
    pub async fn run(&self, ctx: &ArticleCtx) -> ProcessingResult {
        // ========== 步骤 1: 读取扫描图片 ==========
        let image = match self.artifacts.read(&ctx.article_id).await {
            Ok(bytes) => bytes,
            Err(e) => return fail(ctx, e.kind(), &e),
        };
        debug!("{} 图片大小: {} 字节", ctx, image.len());

        // ========== 步骤 2: OCR ==========
        info!("{} 🖼️ 正在识别图片...", ctx);
        let analysis = match self.ocr.analyze(&image).await {
            Ok(analysis) => analysis,
            Err(e) => return fail(ctx, ErrorKind::OcrServiceError, &e),
        };

        let raw_text = extract_raw_text(&analysis);
        if let Some(caption) = &analysis.caption {
            info!(
                "{} 描述: '{}', 置信度 {:.4}",
                ctx, caption.text, caption.confidence
            );
        }
        info!("{} ✓ 识别完成，共 {} 个字符", ctx, raw_text.chars().count());

        // ========== 步骤 3: 纠错 ==========
        info!("{} ✍️ 正在纠正拼写...", ctx);
        let completion = match self.correction.complete(SYSTEM_PROMPT, &raw_text).await {
            Ok(completion) => completion,
            Err(e) => return fail(ctx, ErrorKind::CompletionError, &e),
        };

        info!(
            "{} ✓ 纠错完成: {} | tokens {}",
            ctx,
            truncate_text(&completion.text, 40),
            completion.usage.total_tokens
        );

        // ========== 步骤 4: 组装结果 ==========
        ProcessingResult::Success(ArticleSuccess {
            article_id: ctx.article_id.clone(),
            caption: analysis.caption,
            raw_text,
            corrected_text: completion.text,
            token_usage: completion.usage,
        })
    }

    /// 与 `run` 相同，但处理过程中的 panic 会被转换为 Unexpected 失败
    pub async fn run_guarded(&self, ctx: &ArticleCtx) -> ProcessingResult {
        match AssertUnwindSafe(self.run(ctx)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("{} ❌ 处理过程中发生意外错误: {}", ctx, message);
                ProcessingResult::failure(ctx.article_id.clone(), ErrorKind::Unexpected, message)
            }
        }
    }
}

fn fail(ctx: &ArticleCtx, kind: ErrorKind, err: &dyn std::error::Error) -> ProcessingResult {
    error!("{} ❌ {}: {}", ctx, kind, err);
    ProcessingResult::failure(ctx.article_id.clone(), kind, err.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知 panic".to_string()
    }
}
