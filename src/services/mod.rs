//! 业务能力层（Services）
//!
//! 描述"我能做什么"：选文章、识别图片、纠正文本

pub mod correction;
pub mod ocr;
pub mod selector;

pub use correction::{CorrectionService, SYSTEM_PROMPT};
pub use ocr::{extract_raw_text, OcrService};
pub use selector::{build_query, Selector};
