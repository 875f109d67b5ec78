//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文章处理器
//! - 管理应用生命周期（初始化、选择、运行）
//! - 控制并发数量（Semaphore + JoinSet）
//! - 处理整体运行超时
//!
//! ### `report` - 运行报告
//! - 按输入顺序汇总每篇文章的结果
//! - 输出统计日志，可选写出 JSON 报告
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ArticleId>)
//!     ↓
//! workflow::ArticleFlow (处理单篇文章)
//!     ↓
//! services (能力层：selector / ocr / correction)
//!     ↓
//! infrastructure (基础设施：PgPool、图片存储)
//! ```

pub mod batch_processor;
pub mod report;

// 重新导出主要类型
pub use batch_processor::App;
pub use report::{FailureEntry, RunOutcome, RunReport, SuccessEntry};
