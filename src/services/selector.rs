//! 文章选择服务 - 业务能力层
//!
//! 把筛选条件翻译成一条参数化 SELECT，交给 `ArticleIndex` 执行

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::SelectorError;
use crate::infrastructure::{ArticleFilter, ArticleIndex, QueryParam, SelectQuery};
use crate::models::{ArticleId, FilterMode, SelectionCriteria, TableSchema};

/// 文章选择器
///
/// 职责：
/// - 根据日期范围、版面、主题、关键词构造查询
/// - 返回无重复的文章 ID 列表
/// - 不关心后续如何处理这些文章
pub struct Selector {
    index: Arc<dyn ArticleIndex>,
    schema: TableSchema,
}

impl Selector {
    pub fn new(index: Arc<dyn ArticleIndex>, schema: TableSchema) -> Self {
        Self { index, schema }
    }

    /// 查询符合条件的文章 ID
    ///
    /// 无匹配时返回空列表；连接失败和查询错误原样向上报告
    pub async fn select(&self, criteria: &SelectionCriteria) -> Result<Vec<ArticleId>, SelectorError> {
        let query = build_query(criteria, &self.schema);

        info!(
            "🔎 查询文章: {} ~ {} | 版面 {} 个 | 主题 {} 个 | 关键词 {} 个 | 模式 {}",
            criteria.start_date(),
            criteria.end_date(),
            criteria.sections().len(),
            criteria.topics().len(),
            criteria.keywords().len(),
            criteria.filter_mode()
        );

        let rows = self.index.fetch_ids(&query).await?;
        let total_rows = rows.len();

        let mut seen = HashSet::with_capacity(total_rows);
        let ids: Vec<ArticleId> = rows
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .map(ArticleId::from)
            .collect();

        if ids.len() != total_rows {
            debug!("去除了 {} 个重复的文章 ID", total_rows - ids.len());
        }

        Ok(ids)
    }
}

/// 把词条包装为 ILIKE 子串模式
fn to_patterns<'a>(terms: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    terms.into_iter().map(|t| format!("%{}%", t)).collect()
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

/// 构造选择查询
///
/// - 日期：`BETWEEN $1 AND $2`（闭区间）
/// - 版面 / 主题 / 关键词：`ILIKE ANY($n)`；strict 模式下空列表省略该子句，
///   legacy 模式下空的版面或主题列表使日期组整体不成立
/// - 关键词同时匹配标题和正文，和其余子句的组合方式由 `FilterMode` 决定
pub fn build_query(criteria: &SelectionCriteria, schema: &TableSchema) -> SelectQuery {
    let filter = ArticleFilter {
        start_date: criteria.start_date(),
        end_date: criteria.end_date(),
        section_patterns: to_patterns(criteria.sections()),
        topic_patterns: to_patterns(criteria.topics()),
        keyword_patterns: to_patterns(criteria.keywords()),
        mode: criteria.filter_mode(),
    };

    let mut params = vec![
        QueryParam::Date(filter.start_date),
        QueryParam::Date(filter.end_date),
    ];
    let mut clauses = vec![format!("{} BETWEEN $1 AND $2", quote(&schema.date_column))];

    // legacy 模式下空列表仍然绑定为空数组，`ILIKE ANY('{}')` 恒为假
    let keep_empty = filter.mode == FilterMode::Legacy;
    for (column, patterns) in [
        (&schema.section_column, &filter.section_patterns),
        (&schema.topic_column, &filter.topic_patterns),
    ] {
        if keep_empty || !patterns.is_empty() {
            params.push(QueryParam::Patterns(patterns.clone()));
            clauses.push(format!("{} ILIKE ANY(${})", quote(column), params.len()));
        }
    }

    let restricted = clauses.join(" AND ");

    let where_clause = if filter.keyword_patterns.is_empty() {
        restricted
    } else {
        params.push(QueryParam::Patterns(filter.keyword_patterns.clone()));
        let n = params.len();
        let keyword_clause = format!(
            "({} ILIKE ANY(${n}) OR {} ILIKE ANY(${n}))",
            quote(&schema.headline_column),
            quote(&schema.content_column),
        );
        match filter.mode {
            FilterMode::Strict => format!("{} AND {}", restricted, keyword_clause),
            FilterMode::Legacy => format!("({}) OR {}", restricted, keyword_clause),
        }
    };

    let sql = format!(
        "SELECT DISTINCT {}::text AS article_id FROM {} WHERE {} ORDER BY article_id",
        quote(&schema.id_column),
        quote(&schema.table),
        where_clause
    );

    SelectQuery { sql, params, filter }
}
