//! 程序配置
//!
//! 进程启动时从环境变量构建一次，之后以引用方式传给编排层和 LLM 客户端。
//! 缺少 API Key 时直接失败，不会处理任何文件。

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;

/// 未显式指定格式示例文件时，依次尝试的候选文件
const FORMAT_EXAMPLE_CANDIDATES: [&str; 2] = ["Automato_Finito.xml", "Automato_Finito.jff"];

/// 回答模式：生成自动机描述，还是简短文字答案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerMode {
    #[default]
    Fa,
    Qa,
}

impl FromStr for AnswerMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fa" => Ok(AnswerMode::Fa),
            "qa" => Ok(AnswerMode::Qa),
            other => Err(format!("未知的回答模式: {}", other)),
        }
    }
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerMode::Fa => write!(f, "fa"),
            AnswerMode::Qa => write!(f, "qa"),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 默认输入目录
    pub input_dir: PathBuf,
    /// 默认输出目录
    pub output_dir: PathBuf,
    /// 每个块最多包含的题目数
    pub max_per_block: usize,
    /// 每分钟最多调用 LLM 的次数
    pub rate_limit_per_minute: usize,
    /// 单次调用最多尝试次数
    pub retry_max_attempts: u32,
    pub retry_min_delay: Duration,
    pub retry_max_delay: Duration,
    pub answer_mode: AnswerMode,
    /// JFLAP 格式示例（追加到提示词末尾）
    pub format_example: Option<String>,
    /// 运行日志文件
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.0-flash".to_string(),
            input_dir: PathBuf::from("lerpdf"),
            output_dir: PathBuf::from("out"),
            max_per_block: 30,
            rate_limit_per_minute: 30,
            retry_max_attempts: 5,
            retry_min_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
            answer_mode: AnswerMode::Fa,
            format_example: None,
            log_file: PathBuf::from("quiz-extract.log"),
        }
    }
}

impl Config {
    /// 从进程环境变量构建配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源构建配置（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let llm_api_key = lookup("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::EnvVarNotFound {
                var_name: "GEMINI_API_KEY".to_string(),
            })?;

        let format_example = match lookup("FORMAT_EXAMPLE_PATH") {
            Some(path) => read_format_example(&[PathBuf::from(path)]),
            None => read_format_example(
                &FORMAT_EXAMPLE_CANDIDATES.map(PathBuf::from),
            ),
        };

        Ok(Self {
            llm_api_key,
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: lookup("GEMINI_MODEL").unwrap_or(default.llm_model_name),
            input_dir: lookup("INPUT_DIR").map(PathBuf::from).unwrap_or(default.input_dir),
            output_dir: lookup("OUTPUT_DIR").map(PathBuf::from).unwrap_or(default.output_dir),
            max_per_block: parse_var(&lookup, "MAX_QUEST_PER_BLOCK", "usize")?
                .unwrap_or(default.max_per_block),
            rate_limit_per_minute: parse_var(&lookup, "RATE_LIMIT_PER_MINUTE", "usize")?
                .unwrap_or(default.rate_limit_per_minute),
            retry_max_attempts: default.retry_max_attempts,
            retry_min_delay: default.retry_min_delay,
            retry_max_delay: default.retry_max_delay,
            answer_mode: parse_var(&lookup, "ANSWER_MODE", "fa|qa")?
                .unwrap_or(default.answer_mode),
            format_example,
            log_file: lookup("LOG_FILE").map(PathBuf::from).unwrap_or(default.log_file),
        })
    }
}

fn parse_var<F, T>(lookup: &F, var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

/// 读取第一个存在的格式示例文件
fn read_format_example(candidates: &[PathBuf]) -> Option<String> {
    candidates
        .iter()
        .map(PathBuf::as_path)
        .filter(|p: &&Path| p.is_file())
        .find_map(|p| {
            let content = std::fs::read_to_string(p).ok()?;
            debug!("已加载格式示例: {}", p.display());
            Some(content)
        })
}
