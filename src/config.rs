use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::{load_criteria_file, FilterMode, LoadedCriteria, SelectionCriteria, TableSchema};

/// 必需的环境变量
pub const REQUIRED_ENV_VARS: [&str; 5] = [
    "DATABASE_URL",
    "OPENAI_ENDPOINT",
    "OPENAI_KEY",
    "VISION_ENDPOINT",
    "VISION_KEY",
];

/// 环境相关配置（凭据、端点、运行参数）
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    // --- 纠错服务（Azure OpenAI）---
    pub openai_endpoint: String,
    pub openai_key: String,
    pub openai_deployment: String,
    pub openai_api_version: String,
    // --- OCR 服务（Azure AI Vision）---
    pub vision_endpoint: String,
    pub vision_key: String,
    pub vision_api_version: String,
    /// 扫描图片根目录，图片位于 `<artifact_dir>/tiff/<id>.tiff`
    pub artifact_dir: PathBuf,
    /// 筛选条件文件（JSON 或 TOML）
    pub criteria_file: PathBuf,
    /// 同时处理的文章数量
    pub max_concurrent_articles: usize,
    /// 单次 HTTP 请求超时
    pub request_timeout: Duration,
    /// 纠错服务限流 / 5xx 时的重试总时长上限，0 表示不重试
    pub retry_max_elapsed: Duration,
    /// 整体运行超时（可选）
    pub run_timeout: Option<Duration>,
    /// 报告中纠错文本的预览长度（字符）
    pub preview_chars: usize,
    /// JSON 报告输出路径（可选）
    pub report_file: Option<PathBuf>,
    /// 覆盖筛选条件文件中的 filter_mode
    pub filter_mode: Option<FilterMode>,
}

impl Settings {
    pub const DEFAULT_DEPLOYMENT: &'static str = "gpt-4o";
    pub const DEFAULT_OPENAI_API_VERSION: &'static str = "2024-12-01-preview";
    pub const DEFAULT_VISION_API_VERSION: &'static str = "2024-02-01";
    pub const DEFAULT_ARTIFACT_DIR: &'static str = "artifacts/input";
    pub const DEFAULT_MAX_CONCURRENT: usize = 8;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_RETRY_MAX_ELAPSED_SECS: u64 = 30;
    pub const DEFAULT_PREVIEW_CHARS: usize = 100;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置
    ///
    /// 所有缺失的必需项会在一条错误中一起列出
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(&lookup, key);

        let missing: Vec<String> = REQUIRED_ENV_VARS
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing { items: missing });
        }

        let required = |key: &str| get(key).unwrap_or_default();

        let artifact_dir = Self::artifact_dir_from(&lookup);
        let criteria_file = Self::criteria_file_from(&lookup);

        let max_concurrent_articles =
            parse_or("MAX_CONCURRENT_ARTICLES", get("MAX_CONCURRENT_ARTICLES"), Self::DEFAULT_MAX_CONCURRENT)?;
        if max_concurrent_articles == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_CONCURRENT_ARTICLES".to_string(),
                value: "0".to_string(),
                reason: "并发数至少为 1".to_string(),
            });
        }

        let request_timeout_secs = parse_or(
            "REQUEST_TIMEOUT_SECS",
            get("REQUEST_TIMEOUT_SECS"),
            Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let retry_max_elapsed_secs = parse_or(
            "RETRY_MAX_ELAPSED_SECS",
            get("RETRY_MAX_ELAPSED_SECS"),
            Self::DEFAULT_RETRY_MAX_ELAPSED_SECS,
        )?;
        let run_timeout = match get("RUN_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(parse_or::<u64>("RUN_TIMEOUT_SECS", Some(v), 0)?)),
            None => None,
        };

        let filter_mode = get("FILTER_MODE").map(|v| v.parse()).transpose()?;

        Ok(Self {
            database_url: required("DATABASE_URL"),
            openai_endpoint: required("OPENAI_ENDPOINT"),
            openai_key: required("OPENAI_KEY"),
            openai_deployment: get("OPENAI_DEPLOYMENT")
                .unwrap_or_else(|| Self::DEFAULT_DEPLOYMENT.to_string()),
            openai_api_version: get("OPENAI_API_VERSION")
                .unwrap_or_else(|| Self::DEFAULT_OPENAI_API_VERSION.to_string()),
            vision_endpoint: required("VISION_ENDPOINT"),
            vision_key: required("VISION_KEY"),
            vision_api_version: get("VISION_API_VERSION")
                .unwrap_or_else(|| Self::DEFAULT_VISION_API_VERSION.to_string()),
            artifact_dir,
            criteria_file,
            max_concurrent_articles,
            request_timeout: Duration::from_secs(request_timeout_secs),
            retry_max_elapsed: Duration::from_secs(retry_max_elapsed_secs),
            run_timeout,
            preview_chars: parse_or("PREVIEW_CHARS", get("PREVIEW_CHARS"), Self::DEFAULT_PREVIEW_CHARS)?,
            report_file: get("REPORT_FILE").map(PathBuf::from),
            filter_mode,
        })
    }

    fn artifact_dir_from<F>(lookup: &F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        PathBuf::from(
            non_blank(lookup, "ARTIFACT_DIR").unwrap_or_else(|| Self::DEFAULT_ARTIFACT_DIR.to_string()),
        )
    }

    /// 筛选条件文件：`CRITERIA_FILE`，默认 `<ARTIFACT_DIR>/config.json`
    ///
    /// 只依赖可选项，必需项缺失时也能确定
    fn criteria_file_from<F>(lookup: &F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        non_blank(lookup, "CRITERIA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::artifact_dir_from(lookup).join("config.json"))
    }
}

/// 空白值视为未设置
fn non_blank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: v.clone(),
            reason: "应为非负整数".to_string(),
        }),
        None => Ok(default),
    }
}

/// 程序配置：运行参数 + 本次运行的筛选条件
#[derive(Clone, Debug)]
pub struct Config {
    pub settings: Settings,
    pub criteria: SelectionCriteria,
    pub schema: TableSchema,
}

impl Config {
    /// 读取环境变量和筛选条件文件并校验
    ///
    /// 环境变量和文件中缺失的必需项合并在同一条错误中报告，文件项带上文件路径
    pub async fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok()).await
    }

    /// 从任意键值来源读取配置，再加载筛选条件文件
    pub async fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Settings::from_lookup(&lookup);
        let criteria_file = match &settings {
            Ok(settings) => settings.criteria_file.clone(),
            Err(_) => Settings::criteria_file_from(&lookup),
        };
        let loaded = load_criteria_at(&criteria_file).await;

        match (settings, loaded) {
            (Ok(settings), Ok(loaded)) => Ok(Self::assemble(settings, loaded)),
            (Err(ConfigError::Missing { mut items }), Err(ConfigError::Missing { items: file_items })) => {
                items.extend(file_items);
                Err(ConfigError::Missing { items })
            }
            (Err(e), _) | (Ok(_), Err(e)) => Err(e),
        }
    }

    pub async fn with_settings(settings: Settings) -> Result<Self, ConfigError> {
        let loaded = load_criteria_at(&settings.criteria_file).await?;
        Ok(Self::assemble(settings, loaded))
    }

    fn assemble(settings: Settings, loaded: LoadedCriteria) -> Self {
        let criteria = match settings.filter_mode {
            Some(mode) => loaded.criteria.with_filter_mode(mode),
            None => loaded.criteria,
        };

        Self {
            settings,
            criteria,
            schema: loaded.schema,
        }
    }
}

/// 加载筛选条件文件，缺失项前加上文件路径
async fn load_criteria_at(path: &Path) -> Result<LoadedCriteria, ConfigError> {
    match load_criteria_file(path).await {
        Err(ConfigError::Missing { items }) => {
            let file = path.display().to_string();
            Err(ConfigError::Missing {
                items: items.into_iter().map(|i| format!("{}:{}", file, i)).collect(),
            })
        }
        other => other,
    }
}
