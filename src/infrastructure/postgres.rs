//! PostgreSQL 文章索引
//!
//! 连接池只在选择阶段使用，查询结束后由调用方关闭

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::SelectorError;
use crate::infrastructure::article_index::{ArticleIndex, QueryParam, SelectQuery};

pub struct PostgresArticleIndex {
    pool: PgPool,
}

impl PostgresArticleIndex {
    /// 连接数据库
    ///
    /// 选择阶段只发一条查询，一个连接就够了
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<Self, SelectorError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| SelectorError::Connection {
                message: e.to_string(),
            })?;

        info!("✓ 数据库连接成功");
        Ok(Self { pool })
    }

    /// 关闭连接池
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("数据库连接池已关闭");
    }
}

#[async_trait]
impl ArticleIndex for PostgresArticleIndex {
    async fn fetch_ids(&self, query: &SelectQuery) -> Result<Vec<String>, SelectorError> {
        debug!("执行查询: {}", query.sql);

        let mut statement = sqlx::query_scalar::<Postgres, String>(&query.sql);
        for param in &query.params {
            statement = match param {
                QueryParam::Date(date) => statement.bind(*date),
                QueryParam::Patterns(patterns) => statement.bind(patterns.clone()),
            };
        }

        let ids = statement.fetch_all(&self.pool).await?;
        Ok(ids)
    }
}
