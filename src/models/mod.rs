pub mod analysis;
pub mod article;
pub mod criteria;
pub mod loaders;

pub use analysis::{Caption, ImageAnalysis, ReadResult, TextBlock, TextLine, Word};
pub use article::{
    ArticleFailure, ArticleId, ArticleSuccess, Completion, ErrorKind, ProcessingResult, TokenUsage,
};
pub use criteria::{FilterMode, SelectionCriteria, TableSchema};
pub use loaders::{load_criteria_file, LoadedCriteria};
