use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::analysis::Caption;

/// 文章 ID（不透明字符串，跨运行稳定）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ArticleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ArticleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Token 用量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

impl fmt::Display for TokenUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prompt={} completion={} total={}",
            self.prompt_tokens, self.completion_tokens, self.total_tokens
        )
    }
}

/// 纠错服务的返回
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// 单篇文章失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ArtifactNotFound,
    ArtifactRead,
    OcrServiceError,
    CompletionError,
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ArtifactNotFound => "ArtifactNotFound",
            ErrorKind::ArtifactRead => "ArtifactRead",
            ErrorKind::OcrServiceError => "OcrServiceError",
            ErrorKind::CompletionError => "CompletionError",
            ErrorKind::Unexpected => "Unexpected",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSuccess {
    pub article_id: ArticleId,
    pub caption: Option<Caption>,
    pub raw_text: String,
    pub corrected_text: String,
    pub token_usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleFailure {
    pub article_id: ArticleId,
    pub error_kind: ErrorKind,
    pub message: String,
}

/// 单篇文章的处理结果
///
/// 每个被选中的 ArticleId 恰好对应一个结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessingResult {
    Success(ArticleSuccess),
    Failure(ArticleFailure),
}

impl ProcessingResult {
    pub fn failure(article_id: ArticleId, error_kind: ErrorKind, message: impl Into<String>) -> Self {
        ProcessingResult::Failure(ArticleFailure {
            article_id,
            error_kind,
            message: message.into(),
        })
    }

    pub fn article_id(&self) -> &ArticleId {
        match self {
            ProcessingResult::Success(s) => &s.article_id,
            ProcessingResult::Failure(f) => &f.article_id,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ProcessingResult::Success(_) => None,
            ProcessingResult::Failure(f) => Some(f.error_kind),
        }
    }
}
