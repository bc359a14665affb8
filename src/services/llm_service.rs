//! LLM 服务 - 业务能力层
//!
//! 只负责"把一段提示词发给模型并拿回文本"，不关心题目、限流和重试。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 默认指向 Gemini 的 OpenAI 兼容端点，也可配置为其他兼容服务

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};

/// 上游错误信息中出现这些片段时视为可重试
const TRANSIENT_MARKERS: [&str; 9] = [
    "429",
    "500",
    "502",
    "503",
    "504",
    "rate",
    "overloaded",
    "unavailable",
    "resource_exhausted",
];

/// LLM 服务
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用
    ///
    /// 模型没有返回任何内容时得到空字符串，由调用方按"空结果"处理。
    pub async fn send_to_llm(&self, prompt: &str) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("提示词长度: {} 字符", prompt.chars().count());

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| self.classify(e))?;
        let messages = vec![ChatCompletionRequestMessage::User(user_msg)];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.2)
            .max_tokens(4096u32)
            .build()
            .map_err(|e| self.classify(e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.classify(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        if content.trim().is_empty() {
            warn!("LLM 返回内容为空 (模型: {})", self.model_name);
        }

        Ok(content.trim().to_string())
    }

    /// 区分可重试与不可重试的错误
    fn classify(&self, err: OpenAIError) -> AppError {
        let message = err.to_string();
        let transient = match &err {
            OpenAIError::Reqwest(_) => true,
            OpenAIError::ApiError(_) => is_transient_message(&message),
            _ => false,
        };

        if transient {
            AppError::UpstreamTransient {
                model: self.model_name.clone(),
                message,
            }
        } else {
            AppError::Upstream {
                model: self.model_name.clone(),
                message,
            }
        }
    }
}

fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}
