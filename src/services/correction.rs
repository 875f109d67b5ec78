//! 文本纠错服务 - 业务能力层
//!
//! 只负责"改错别字"能力，不关心文本从哪里来

use async_trait::async_trait;

use crate::error::CompletionError;
use crate::models::Completion;

/// 固定的系统指令：纠正拼写，保留原有格式和结构
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant for identifying and correcting any spelling mistakes while preserving the original formatting and structure of the text";

/// 文本纠错服务
///
/// 单轮对话：一条系统指令 + 一条用户消息
#[async_trait]
pub trait CorrectionService: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<Completion, CompletionError>;
}
