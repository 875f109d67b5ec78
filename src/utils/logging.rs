/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::models::SelectionCriteria;

/// 初始化日志
///
/// 级别由 `RUST_LOG` 控制，默认 `info`；重复调用时保持第一次的设置
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(settings: &Settings, criteria: &SelectionCriteria) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 文章识别纠错模式");
    info!(
        "📅 日期范围: {} ~ {}",
        criteria.start_date(),
        criteria.end_date()
    );
    info!("🔀 筛选模式: {}", criteria.filter_mode());
    info!("📂 图片目录: {}", settings.artifact_dir.display());
    info!("📊 最大并发数: {}", settings.max_concurrent_articles);
    if let Some(limit) = settings.run_timeout {
        info!("⏱️ 运行超时: {} 秒", limit.as_secs());
    }
    info!("{}", "=".repeat(60));
}

/// 记录文章选择结果
pub fn log_articles_selected(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 篇待处理的文章", total);
    info!("📋 最多同时处理 {} 篇\n", max_concurrent);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符）
///
/// # 返回
/// 超出长度时返回前 `max_len` 个字符并追加 `...`
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
