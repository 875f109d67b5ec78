use crate::error::ConfigError;
use crate::models::criteria::{FilterMode, SelectionCriteria, TableSchema};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 筛选条件文件的原始结构
///
/// 所有字段都是可选的，这样缺失项可以一次性全部报告
#[derive(Debug, Default, Deserialize)]
struct RawCriteriaFile {
    date_range: Option<RawDateRange>,
    sections: Option<Vec<String>>,
    topics: Option<Vec<String>>,
    keywords: Option<Vec<String>>,
    filter_mode: Option<FilterMode>,
    schema: Option<TableSchema>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDateRange {
    start_date: Option<String>,
    end_date: Option<String>,
}

/// 从文件加载出的筛选配置
#[derive(Debug, Clone)]
pub struct LoadedCriteria {
    pub criteria: SelectionCriteria,
    pub schema: TableSchema,
}

/// 加载筛选条件文件（`.toml` 按 TOML 解析，其余按 JSON 解析）
pub async fn load_criteria_file(path: &Path) -> Result<LoadedCriteria, ConfigError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::CriteriaFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let is_toml = path.extension().and_then(|s| s.to_str()) == Some("toml");
    parse_criteria(&content, is_toml).map_err(|e| match e {
        ConfigError::CriteriaFile { message, .. } => ConfigError::CriteriaFile {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

/// 解析筛选条件文本
pub fn parse_criteria(content: &str, is_toml: bool) -> Result<LoadedCriteria, ConfigError> {
    let raw: RawCriteriaFile = if is_toml {
        toml::from_str(content).map_err(|e| ConfigError::CriteriaFile {
            path: Default::default(),
            message: e.to_string(),
        })?
    } else {
        serde_json::from_str(content).map_err(|e| ConfigError::CriteriaFile {
            path: Default::default(),
            message: e.to_string(),
        })?
    };

    let mut missing = Vec::new();
    let date_range = raw.date_range.unwrap_or_default();
    if date_range.start_date.is_none() {
        missing.push("date_range.start_date".to_string());
    }
    if date_range.end_date.is_none() {
        missing.push("date_range.end_date".to_string());
    }
    if raw.sections.is_none() {
        missing.push("sections".to_string());
    }
    if raw.topics.is_none() {
        missing.push("topics".to_string());
    }
    if raw.keywords.is_none() {
        missing.push("keywords".to_string());
    }
    if !missing.is_empty() {
        return Err(ConfigError::Missing { items: missing });
    }

    let start_date = parse_date("date_range.start_date", date_range.start_date.as_deref())?;
    let end_date = parse_date("date_range.end_date", date_range.end_date.as_deref())?;

    let criteria = SelectionCriteria::new(
        start_date,
        end_date,
        raw.sections.unwrap_or_default(),
        raw.topics.unwrap_or_default(),
        raw.keywords.unwrap_or_default(),
    )?
    .with_filter_mode(raw.filter_mode.unwrap_or_default());

    let schema = raw.schema.unwrap_or_default();
    schema.validate()?;

    Ok(LoadedCriteria { criteria, schema })
}

fn parse_date(key: &str, value: Option<&str>) -> Result<NaiveDate, ConfigError> {
    let value = value.unwrap_or_default();
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: format!("日期格式应为 YYYY-MM-DD ({})", e),
    })
}
