//! OCR 服务 - 业务能力层
//!
//! 只负责"看图识字"能力：图片描述 + 全文识别

use async_trait::async_trait;

use crate::error::OcrError;
use crate::models::ImageAnalysis;

/// OCR / 图片描述服务
///
/// 每次调用同时请求描述（caption）和文字识别（read）
#[async_trait]
pub trait OcrService: Send + Sync {
    async fn analyze(&self, image: &[u8]) -> Result<ImageAnalysis, OcrError>;
}

/// 把识别结果拼接成原始文本
///
/// 按返回顺序遍历 块 → 行 → 单词，每个单词后跟一个空格；
/// 没有识别结果时返回空字符串
pub fn extract_raw_text(analysis: &ImageAnalysis) -> String {
    let mut content = String::new();

    if let Some(read) = &analysis.read {
        for block in &read.blocks {
            for line in &block.lines {
                for word in &line.words {
                    content.push_str(&word.text);
                    content.push(' ');
                }
            }
        }
    }

    content
}
