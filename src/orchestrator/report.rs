//! 运行报告
//!
//! 把所有文章的处理结果汇总为一份报告：按输入顺序列出成功和失败的文章，
//! 并累计 token 用量

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{ArticleId, Caption, ErrorKind, ProcessingResult, TokenUsage};
use crate::utils::logging::truncate_text;

/// 本次运行的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// 没有符合条件的文章
    NoMatches,
    /// 所有文章都已得到结果
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessEntry {
    pub article_id: ArticleId,
    pub caption: Option<Caption>,
    /// 纠错文本的预览
    pub preview: String,
    pub corrected_text: String,
    pub token_usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureEntry {
    pub article_id: ArticleId,
    pub error_kind: ErrorKind,
    pub message: String,
}

/// 运行报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub total: usize,
    pub succeeded: Vec<SuccessEntry>,
    pub failed: Vec<FailureEntry>,
    pub token_totals: TokenUsage,
    pub outcome: RunOutcome,
}

impl RunReport {
    /// 没有匹配文章时的报告
    pub fn no_matches() -> Self {
        Self {
            total: 0,
            succeeded: Vec::new(),
            failed: Vec::new(),
            token_totals: TokenUsage::default(),
            outcome: RunOutcome::NoMatches,
        }
    }

    /// 从按输入顺序排列的结果构建报告
    pub fn from_results(results: Vec<ProcessingResult>, preview_chars: usize) -> Self {
        let total = results.len();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut token_totals = TokenUsage::default();

        for result in results {
            match result {
                ProcessingResult::Success(s) => {
                    token_totals.add(&s.token_usage);
                    succeeded.push(SuccessEntry {
                        preview: truncate_text(&s.corrected_text, preview_chars),
                        article_id: s.article_id,
                        caption: s.caption,
                        corrected_text: s.corrected_text,
                        token_usage: s.token_usage,
                    });
                }
                ProcessingResult::Failure(f) => failed.push(FailureEntry {
                    article_id: f.article_id,
                    error_kind: f.error_kind,
                    message: f.message,
                }),
            }
        }

        Self {
            total,
            succeeded,
            failed,
            token_totals,
            outcome: RunOutcome::Completed,
        }
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// 输出最终统计
    pub fn log_summary(&self) {
        info!("\n{}", "=".repeat(60));
        info!("📊 全部处理完成统计");
        info!(
            "完成时间: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        info!("{}", "=".repeat(60));

        if self.outcome == RunOutcome::NoMatches {
            warn!("⚠️ 没有符合条件的文章");
            info!("{}", "=".repeat(60));
            return;
        }

        info!("✅ 成功: {}/{}", self.success_count(), self.total);
        info!("❌ 失败: {}", self.failure_count());
        info!("🧮 Token 用量: {}", self.token_totals);
        info!("{}", "─".repeat(60));

        for entry in &self.succeeded {
            match &entry.caption {
                Some(caption) => info!(
                    "✓ ID#{} 描述: '{}' ({:.4})",
                    entry.article_id, caption.text, caption.confidence
                ),
                None => info!("✓ ID#{}", entry.article_id),
            }
            info!("    内容: {}", entry.preview);
            info!("    Token: {}", entry.token_usage);
        }

        for entry in &self.failed {
            warn!(
                "✗ ID#{} [{}] {}",
                entry.article_id, entry.error_kind, entry.message
            );
        }

        info!("{}", "=".repeat(60));
    }

    /// 将报告写为格式化的 JSON 文件
    pub async fn write_json(&self, path: &Path) -> Result<(), AppError> {
        let to_report_error = |source: std::io::Error| AppError::Report {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| to_report_error(e.into()))?;
        tokio::fs::write(path, json).await.map_err(to_report_error)?;

        info!("📝 报告已保存至: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleSuccess;

    fn success(id: &str, text: &str, total_tokens: u64) -> ProcessingResult {
        ProcessingResult::Success(ArticleSuccess {
            article_id: ArticleId::new(id),
            caption: None,
            raw_text: text.to_string(),
            corrected_text: text.to_string(),
            token_usage: TokenUsage {
                prompt_tokens: total_tokens / 2,
                completion_tokens: total_tokens - total_tokens / 2,
                total_tokens,
            },
        })
    }

    #[test]
    fn test_from_results_counts_and_order() {
        let results = vec![
            success("3", "third", 10),
            ProcessingResult::failure(ArticleId::new("1"), ErrorKind::ArtifactNotFound, "missing"),
            success("2", "second", 30),
        ];

        let report = RunReport::from_results(results, 100);

        assert_eq!(report.total, 3);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.success_count() + report.failure_count(), report.total);
        let ids: Vec<&str> = report.succeeded.iter().map(|e| e.article_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
        assert_eq!(report.failed[0].error_kind, ErrorKind::ArtifactNotFound);
        assert_eq!(report.token_totals.total_tokens, 40);
    }

    #[test]
    fn test_preview_is_truncated() {
        let long = "x".repeat(150);
        let report = RunReport::from_results(vec![success("1", &long, 1)], 100);

        let entry = &report.succeeded[0];
        assert_eq!(entry.preview.chars().count(), 103);
        assert!(entry.preview.ends_with("..."));
        assert_eq!(entry.corrected_text, long);
    }

    #[test]
    fn test_no_matches_report() {
        let report = RunReport::no_matches();
        assert_eq!(report.total, 0);
        assert_eq!(report.outcome, RunOutcome::NoMatches);
        report.log_summary();
    }

    #[tokio::test]
    async fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let report = RunReport::from_results(
            vec![
                success("7", "hello", 5),
                ProcessingResult::failure(ArticleId::new("8"), ErrorKind::OcrServiceError, "HTTP 429"),
            ],
            100,
        );
        report.write_json(&path).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["total"], 2);
        assert_eq!(written["outcome"], "completed");
        assert_eq!(written["succeeded"][0]["article_id"], "7");
        assert_eq!(written["failed"][0]["error_kind"], "OcrServiceError");
    }

    #[tokio::test]
    async fn test_write_json_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/report.json");

        let err = RunReport::no_matches().write_json(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Report { .. }));
    }
}
