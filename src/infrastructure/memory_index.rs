//! 内存文章索引
//!
//! 用 `ArticleFilter` 在内存中模拟同一条查询，结果按 ID 排序并去重

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::SelectorError;
use crate::infrastructure::article_index::{ArticleIndex, NewsRecord, SelectQuery};

#[derive(Default, Clone)]
pub struct MemoryArticleIndex {
    records: Arc<RwLock<Vec<NewsRecord>>>,
}

impl MemoryArticleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<NewsRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn insert(&self, record: NewsRecord) {
        self.records.write().await.push(record);
    }
}

#[async_trait]
impl ArticleIndex for MemoryArticleIndex {
    async fn fetch_ids(&self, query: &SelectQuery) -> Result<Vec<String>, SelectorError> {
        let records = self.records.read().await;
        let ids: BTreeSet<String> = records
            .iter()
            .filter(|r| query.filter.matches(r))
            .map(|r| r.id.clone())
            .collect();
        Ok(ids.into_iter().collect())
    }
}
