//! 错误类型
//!
//! 按层划分：配置 / 选择器 为致命错误，直接终止本次运行；
//! 工件读取 / OCR / 文本纠错 为单篇文章错误，只会变成该文章的 Failure 结果。

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ErrorKind;

/// 应用程序错误类型（顶层，致命）
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 文章选择失败
    #[error("文章选择失败: {0}")]
    Selector(#[from] SelectorError),

    /// 整体运行超时，已取消所有未完成的任务
    #[error("运行超时 ({secs} 秒)，未完成的任务已取消")]
    RunTimedOut { secs: u64 },

    /// 报告写入失败
    #[error("写入报告失败 ({path}): {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少必需配置项（一次性列出全部）
    #[error("缺少必需的配置项: {}", items.join(", "))]
    Missing { items: Vec<String> },

    /// 配置值无法解析
    #[error("配置项 {key} 的值 '{value}' 无效: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    /// 筛选条件文件读取或解析失败
    #[error("无法加载筛选条件文件 {path}: {message}")]
    CriteriaFile { path: PathBuf, message: String },

    /// 日期范围颠倒
    #[error("日期范围无效: start_date {start} 晚于 end_date {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// 表名或列名不是合法的 SQL 标识符
    #[error("非法的 SQL 标识符 ({field}): '{value}'")]
    InvalidIdentifier { field: String, value: String },
}

/// 选择器错误（数据库阶段）
#[derive(Debug, Error)]
pub enum SelectorError {
    /// 数据库不可达
    #[error("无法连接数据库: {message}")]
    Connection { message: String },

    /// 查询本身有问题（例如引用了不存在的列）
    #[error("查询执行失败: {message}")]
    Query { message: String },
}

impl From<sqlx::Error> for SelectorError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => SelectorError::Connection {
                message: err.to_string(),
            },
            other => SelectorError::Query {
                message: other.to_string(),
            },
        }
    }
}

/// 工件（扫描图片）读取错误
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// 文件不存在
    #[error("工件不存在: {path}")]
    NotFound { path: PathBuf },

    /// 文章 ID 不能安全地映射为文件名
    #[error("文章 ID 无法映射为工件路径: '{id}'")]
    InvalidId { id: String },

    /// 读取失败
    #[error("读取工件失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// OCR / 图片描述服务错误
#[derive(Debug, Error)]
pub enum OcrError {
    /// 网络请求失败
    #[error("OCR 请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// 服务返回错误响应
    #[error("OCR 服务返回错误 (HTTP {status}): {message}")]
    BadResponse { status: u16, message: String },

    /// 响应 JSON 无法解析
    #[error("OCR 响应解析失败: {0}")]
    InvalidResponse(String),
}

/// 文本纠错（chat completion）服务错误
#[derive(Debug, Error)]
pub enum CompletionError {
    /// 请求无法构建
    #[error("无法构建纠错请求: {0}")]
    InvalidRequest(String),

    /// API 调用失败（限流、鉴权、请求格式等）
    #[error("纠错服务调用失败 (部署: {deployment}): {message}")]
    ApiCallFailed { deployment: String, message: String },

    /// 返回内容为空
    #[error("纠错服务返回内容为空 (部署: {deployment})")]
    EmptyContent { deployment: String },
}

impl ArtifactError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArtifactError::NotFound { .. } => ErrorKind::ArtifactNotFound,
            ArtifactError::InvalidId { .. } | ArtifactError::ReadFailed { .. } => {
                ErrorKind::ArtifactRead
            }
        }
    }
}

