use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入文件不存在
    #[error("文件不存在: {}", path.display())]
    NotFound { path: PathBuf },

    /// 扩展名不在支持范围内（仅 .pdf / .docx）
    #[error("不支持的文件类型: {} (请使用 .pdf 或 .docx)", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// 配置错误（启动时致命）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 文本提取失败（PDF/DOCX 解析出错）
    #[error("文本提取失败 ({}): {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    /// 可重试的上游错误（网络、超时、限流、5xx）
    #[error("上游服务暂时不可用 (模型: {model}): {message}")]
    UpstreamTransient { model: String, message: String },

    /// 不可重试的上游错误（认证失败、请求无效等）
    #[error("上游服务调用失败 (模型: {model}): {message}")]
    Upstream { model: String, message: String },

    /// 尚未实现的自动机类型
    #[error("尚未实现: {feature}")]
    UnimplementedFeature { feature: String },

    /// 文件读写失败
    #[error("文件操作失败 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化/反序列化失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// XML 写出失败
    #[error("XML生成失败: {0}")]
    Xml(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件操作错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// 创建文本提取错误
    pub fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AppError::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// 创建未实现功能错误
    pub fn unimplemented(feature: impl Into<String>) -> Self {
        AppError::UnimplementedFeature {
            feature: feature.into(),
        }
    }

    /// 是否值得重试
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::UpstreamTransient { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
