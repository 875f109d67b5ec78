use anyhow::Result;
use article_ocr::utils::logging;
use article_ocr::{App, Config};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    let result = run().await;
    if let Err(e) = &result {
        error!("❌ 运行失败: {:#}", e);
    }
    result
}

async fn run() -> Result<()> {
    // 加载配置
    let config = Config::load().await?;

    // 初始化并运行应用
    let report = App::initialize(config).await?.run().await?;

    if report.failure_count() > 0 {
        warn!("⚠️ 有 {} 篇文章处理失败", report.failure_count());
    }

    Ok(())
}
