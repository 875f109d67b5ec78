//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（数据库连接池、文件系统），只暴露能力

pub mod article_index;
pub mod artifact_store;
pub mod memory_index;
pub mod postgres;

pub use article_index::{ArticleFilter, ArticleIndex, NewsRecord, QueryParam, SelectQuery};
pub use artifact_store::{ArtifactStore, FsArtifactStore};
pub use memory_index::MemoryArticleIndex;
pub use postgres::PostgresArticleIndex;
