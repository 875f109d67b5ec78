//! # Article OCR
//!
//! 从新闻数据库中选出文章，识别其扫描图片并纠正拼写的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（数据库连接池、图片目录），只暴露能力
//! - `PostgresArticleIndex` - 执行文章选择查询
//! - `FsArtifactStore` - 按文章 ID 读取扫描图片
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `Selector` - 按日期、版面、主题、关键词选择文章
//! - `OcrService` - 图片描述 + 文字识别
//! - `CorrectionService` - 拼写纠正
//!
//! `clients/` 提供 OCR 和纠错能力的 Azure 实现
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇文章"的完整处理流程
//! - `ArticleCtx` - 上下文封装（文章 ID + 序号）
//! - `ArticleFlow` - 流程编排（读图 → OCR → 纠错）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理资源和并发
//! - `orchestrator/report` - 运行报告
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Settings};
pub use error::AppError;
pub use infrastructure::{ArticleIndex, ArtifactStore, FsArtifactStore, MemoryArticleIndex, NewsRecord};
pub use models::{ArticleId, ErrorKind, FilterMode, ProcessingResult, SelectionCriteria, TableSchema};
pub use orchestrator::{App, RunOutcome, RunReport};
pub use services::{CorrectionService, OcrService, Selector};
pub use workflow::{ArticleCtx, ArticleFlow};
