//! 文章筛选条件
//!
//! `FilterMode` 决定关键词子句与日期/版面/主题子句的组合方式：
//! - `Strict`：日期 AND 版面 AND 主题 AND (标题 OR 正文 命中关键词)
//! - `Legacy`：(日期 AND 版面 AND 主题) OR (标题 OR 正文 命中关键词)，
//!   关键词命中时会绕过日期和版面限制

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Strict,
    Legacy,
}

impl FromStr for FilterMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(FilterMode::Strict),
            "legacy" => Ok(FilterMode::Legacy),
            other => Err(ConfigError::Invalid {
                key: "filter_mode".to_string(),
                value: other.to_string(),
                reason: "只支持 strict 或 legacy".to_string(),
            }),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Strict => f.write_str("strict"),
            FilterMode::Legacy => f.write_str("legacy"),
        }
    }
}

/// 一次选择查询的输入，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    start_date: NaiveDate,
    end_date: NaiveDate,
    sections: BTreeSet<String>,
    topics: BTreeSet<String>,
    keywords: BTreeSet<String>,
    filter_mode: FilterMode,
}

impl SelectionCriteria {
    /// 创建筛选条件
    ///
    /// 空白词条会被丢弃，重复词条合并；`start_date` 不能晚于 `end_date`
    pub fn new<I, S>(
        start_date: NaiveDate,
        end_date: NaiveDate,
        sections: I,
        topics: I,
        keywords: I,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if start_date > end_date {
            return Err(ConfigError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        Ok(Self {
            start_date,
            end_date,
            sections: normalize_terms(sections),
            topics: normalize_terms(topics),
            keywords: normalize_terms(keywords),
            filter_mode: FilterMode::default(),
        })
    }

    pub fn with_filter_mode(mut self, filter_mode: FilterMode) -> Self {
        self.filter_mode = filter_mode;
        self
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn sections(&self) -> &BTreeSet<String> {
        &self.sections
    }

    pub fn topics(&self) -> &BTreeSet<String> {
        &self.topics
    }

    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }
}

fn normalize_terms<I, S>(terms: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// 新闻表结构（表名与列名）
///
/// 部分库里的列名带有尾随空格，例如 `"topic "`，因此允许空格，查询时统一加双引号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    pub table: String,
    pub id_column: String,
    pub date_column: String,
    pub section_column: String,
    pub topic_column: String,
    pub headline_column: String,
    pub content_column: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            table: "news".to_string(),
            id_column: "id".to_string(),
            date_column: "publication_date".to_string(),
            section_column: "section".to_string(),
            topic_column: "topic".to_string(),
            headline_column: "headline".to_string(),
            content_column: "content".to_string(),
        }
    }
}

impl TableSchema {
    /// 校验所有标识符
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("schema.table", &self.table),
            ("schema.id_column", &self.id_column),
            ("schema.date_column", &self.date_column),
            ("schema.section_column", &self.section_column),
            ("schema.topic_column", &self.topic_column),
            ("schema.headline_column", &self.headline_column),
            ("schema.content_column", &self.content_column),
        ];

        for (field, value) in fields {
            if !identifier_pattern().is_match(value) {
                return Err(ConfigError::InvalidIdentifier {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }

        Ok(())
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_ ]{0,62}$").expect("identifier regex is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_new_drops_blank_and_duplicate_terms() {
        let criteria = SelectionCriteria::new(
            date("2024-01-01"),
            date("2024-01-31"),
            vec!["Sports", " Sports ", ""],
            vec!["football"],
            vec!["  "],
        )
        .unwrap();

        assert_eq!(criteria.sections().len(), 1);
        assert!(criteria.sections().contains("Sports"));
        assert!(criteria.keywords().is_empty());
        assert_eq!(criteria.filter_mode(), FilterMode::Strict);
    }

    #[test]
    fn test_new_rejects_reversed_range() {
        let err = SelectionCriteria::new(
            date("2024-02-01"),
            date("2024-01-01"),
            Vec::<String>::new(),
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_filter_mode_from_str() {
        assert_eq!("LEGACY".parse::<FilterMode>().unwrap(), FilterMode::Legacy);
        assert_eq!(" strict ".parse::<FilterMode>().unwrap(), FilterMode::Strict);
        assert!("loose".parse::<FilterMode>().is_err());
    }

    #[test]
    fn test_schema_validation() {
        let mut schema = TableSchema::default();
        assert!(schema.validate().is_ok());

        schema.topic_column = "topic ".to_string();
        assert!(schema.validate().is_ok());

        schema.content_column = "content\"; DROP TABLE news; --".to_string();
        let err = schema.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIdentifier { field, .. } if field == "schema.content_column"));
    }
}
