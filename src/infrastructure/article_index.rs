//! 文章索引 - 基础设施层
//!
//! 只暴露"按查询取回文章 ID"的能力，不关心筛选条件从哪里来

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SelectorError;
use crate::models::FilterMode;

/// 查询参数（按 `$1, $2, ...` 顺序绑定）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Date(NaiveDate),
    Patterns(Vec<String>),
}

/// 结构化的筛选条件，与 SQL 文本语义一致，供内存后端使用
///
/// strict 模式下空的模式列表表示该子句不参与筛选；
/// legacy 模式下空列表与 `ILIKE ANY('{}')` 一样恒不匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFilter {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub section_patterns: Vec<String>,
    pub topic_patterns: Vec<String>,
    pub keyword_patterns: Vec<String>,
    pub mode: FilterMode,
}

impl ArticleFilter {
    pub fn matches(&self, record: &NewsRecord) -> bool {
        let in_range =
            record.publication_date >= self.start_date && record.publication_date <= self.end_date;
        let restricted = in_range
            && self.list_matches(&record.section, &self.section_patterns)
            && self.list_matches(&record.topic, &self.topic_patterns);

        if self.keyword_patterns.is_empty() {
            return restricted;
        }

        let keyword_hit = ilike_any(&record.headline, &self.keyword_patterns)
            || ilike_any(&record.content, &self.keyword_patterns);

        match self.mode {
            FilterMode::Strict => restricted && keyword_hit,
            FilterMode::Legacy => restricted || keyword_hit,
        }
    }

    fn list_matches(&self, value: &str, patterns: &[String]) -> bool {
        match self.mode {
            FilterMode::Strict => patterns.is_empty() || ilike_any(value, patterns),
            FilterMode::Legacy => ilike_any(value, patterns),
        }
    }
}

/// `value ILIKE ANY(patterns)`，模式形如 `%term%`
fn ilike_any(value: &str, patterns: &[String]) -> bool {
    let value = value.to_lowercase();
    patterns.iter().any(|p| {
        let p = p.strip_prefix('%').unwrap_or(p);
        let term = p.strip_suffix('%').unwrap_or(p).to_lowercase();
        value.contains(&term)
    })
}

/// 一条参数化 SELECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
    pub filter: ArticleFilter,
}

/// 新闻表中的一行（只含筛选用到的列）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRecord {
    pub id: String,
    pub publication_date: NaiveDate,
    pub section: String,
    pub topic: String,
    pub headline: String,
    pub content: String,
}

/// 文章索引
///
/// 职责：
/// - 执行一条 SELECT，返回文章 ID 列表
/// - 无匹配时返回空列表，不算错误
/// - 连接失败与查询错误分别报告
#[async_trait]
pub trait ArticleIndex: Send + Sync {
    async fn fetch_ids(&self, query: &SelectQuery) -> Result<Vec<String>, SelectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record() -> NewsRecord {
        NewsRecord {
            id: "1".to_string(),
            publication_date: date("2024-05-10"),
            section: "Local News".to_string(),
            topic: "Weather".to_string(),
            headline: "Storm hits the coast".to_string(),
            content: "Heavy RAIN overnight".to_string(),
        }
    }

    fn filter(mode: FilterMode) -> ArticleFilter {
        ArticleFilter {
            start_date: date("2024-05-01"),
            end_date: date("2024-05-31"),
            section_patterns: vec!["%local%".to_string()],
            topic_patterns: vec!["%weather%".to_string()],
            keyword_patterns: vec!["%rain%".to_string()],
            mode,
        }
    }

    #[test]
    fn test_case_insensitive_substring() {
        assert!(filter(FilterMode::Strict).matches(&record()));
    }

    #[test]
    fn test_strict_requires_keyword() {
        let mut f = filter(FilterMode::Strict);
        f.keyword_patterns = vec!["%flood%".to_string()];
        assert!(!f.matches(&record()));
    }

    #[test]
    fn test_legacy_keyword_bypasses_date() {
        let mut r = record();
        r.publication_date = date("2019-01-01");
        assert!(!filter(FilterMode::Strict).matches(&r));
        assert!(filter(FilterMode::Legacy).matches(&r));
    }

    #[test]
    fn test_empty_lists_do_not_restrict() {
        let mut f = filter(FilterMode::Strict);
        f.section_patterns.clear();
        f.topic_patterns.clear();
        f.keyword_patterns.clear();
        let mut r = record();
        r.section = "Sports".to_string();
        assert!(f.matches(&r));
    }

    #[test]
    fn test_legacy_empty_sections_match_nothing_but_keywords() {
        let mut f = filter(FilterMode::Legacy);
        f.section_patterns.clear();

        let mut no_keyword = record();
        no_keyword.headline = "Council meets".to_string();
        no_keyword.content = "Budget approved".to_string();
        assert!(!f.matches(&no_keyword));

        // 关键词命中仍然可以通过
        assert!(f.matches(&record()));
    }

    #[test]
    fn test_percent_in_term_is_literal() {
        let mut f = filter(FilterMode::Strict);
        f.keyword_patterns = vec!["%100%%".to_string()];

        let mut r = record();
        r.headline = "Turnout reached 100 voters".to_string();
        assert!(!f.matches(&r));

        r.headline = "Turnout reached 100% in the district".to_string();
        assert!(f.matches(&r));
    }

    #[test]
    fn test_lone_percent_keyword_does_not_match_everything() {
        let mut f = filter(FilterMode::Strict);
        f.keyword_patterns = vec!["%%%".to_string()];
        assert!(!f.matches(&record()));
    }
}
