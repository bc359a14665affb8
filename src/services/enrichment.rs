//! 题目富化服务
//!
//! 把单个题目发给 LLM，拿回自动机描述（fa 模式）或简短答案（qa 模式）。
//! 调用链: `LlmEnricher::enrich` → 重试策略 → 每次尝试前限流 → `LlmService`。
//! 返回文本无法解析时得到空结果，不会报错。

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AnswerMode, Config};
use crate::error::Result;
use crate::models::FiniteAutomaton;
use crate::services::json_recovery::recover_json;
use crate::services::llm_service::LlmService;
use crate::services::rate_limiter::SlidingWindowLimiter;
use crate::services::retry::RetryPolicy;

/// LLM 返回的单个题目（只保留出现过的字段）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedQuestion {
    pub id: Option<String>,
    pub fa: Option<FiniteAutomaton>,
    pub alternatives: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub answer: Option<String>,
}

impl EnrichedQuestion {
    /// 宽松解析：字段类型不对时当作缺失
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let fa = match obj.get("fa") {
            Some(v @ Value::Object(_)) => match serde_json::from_value::<FiniteAutomaton>(v.clone()) {
                Ok(fa) => Some(fa),
                Err(e) => {
                    warn!("⚠️ fa 字段格式不正确，已忽略: {}", e);
                    None
                }
            },
            _ => None,
        };

        let alternatives = obj.get("alternativas").and_then(Value::as_array).map(|items| {
            items.iter().filter_map(scalar_to_string).collect()
        });

        Some(Self {
            id: obj.get("id").and_then(scalar_to_string),
            fa,
            alternatives,
            correct_answer: obj.get("correta").and_then(scalar_to_string),
            explanation: obj.get("explicacao").and_then(scalar_to_string),
            answer: obj.get("resposta").and_then(scalar_to_string),
        })
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        other => Some(other.to_string()),
    }
}

/// 富化结果 `{ "questoes": [...] }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentResult {
    pub questions: Vec<EnrichedQuestion>,
}

impl EnrichmentResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_value(value: &Value) -> Self {
        let questions = value
            .get("questoes")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(EnrichedQuestion::from_value).collect())
            .unwrap_or_default();
        Self { questions }
    }

    /// 单题请求只看第一个结果
    pub fn first(&self) -> Option<&EnrichedQuestion> {
        self.questions.first()
    }
}

/// 解析 LLM 原始文本，失败时返回空结果
pub fn parse_enrichment(text: &str) -> EnrichmentResult {
    match recover_json(text) {
        Some(value) => EnrichmentResult::from_value(&value),
        None => {
            warn!(
                "⚠️ 无法从 LLM 响应中解析 JSON，按空结果处理 (响应长度: {} 字符)",
                text.chars().count()
            );
            EnrichmentResult::empty()
        }
    }
}

/// 富化服务接口
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    async fn enrich(&self, prompt: &str) -> Result<EnrichmentResult>;
}

/// 基于 LLM 的富化服务
pub struct LlmEnricher {
    llm: LlmService,
    limiter: SlidingWindowLimiter,
    retry: RetryPolicy,
}

impl LlmEnricher {
    pub fn new(config: &Config) -> Self {
        Self {
            llm: LlmService::new(config),
            limiter: SlidingWindowLimiter::per_minute(config.rate_limit_per_minute),
            retry: RetryPolicy::from_config(config),
        }
    }
}

#[async_trait]
impl EnrichmentService for LlmEnricher {
    async fn enrich(&self, prompt: &str) -> Result<EnrichmentResult> {
        let llm = &self.llm;
        let limiter = &self.limiter;

        let text = self
            .retry
            .run(|| async move {
                limiter.acquire().await;
                llm.send_to_llm(prompt).await
            })
            .await?;

        debug!("LLM 响应预览: {}", crate::utils::logging::truncate_text(&text, 200));
        Ok(parse_enrichment(&text))
    }
}

const FA_PROMPT: &str = r#"Você é um extrator e sintetizador de autômatos finitos. Para cada questão do texto, retorne EM JSON VÁLIDO o objeto: {
  "questoes": [
    {
      "id": "Q1",
      "enunciado": "...",
      "alternativas": [],
      "correta": null,
      "explicacao": "...",
      "fa": {
        "alphabet": ["a", "b"],
        "states": [ { "id": 0, "name": "q0", "initial": true, "final": false }, { "id": 1, "name": "q1", "initial": false, "final": true } ],
        "transitions": [ { "from": 0, "to": 1, "read": "a" }, { "from": 1, "to": 0, "read": "a" }, { "from": 0, "to": 0, "read": "b" }, { "from": 1, "to": 1, "read": "b" } ]
      }
    }
  ]
}
Regras: 1) SEM TEXTO fora do JSON. 2) Se não houver FA aplicável, use fa com arrays vazios. 3) read vazio representa epsilon. 4) IDs dos estados devem ser inteiros e únicos. 5) Marque exatamente um estado initial=true."#;

const QA_PROMPT: &str = r#"Você responde questões de prova de forma curta e objetiva. Para cada questão do texto, retorne EM JSON VÁLIDO o objeto: {
  "questoes": [
    { "id": "Q1", "enunciado": "...", "resposta": "..." }
  ]
}
Regras: 1) SEM TEXTO fora do JSON. 2) "resposta" deve ter no máximo alguns parágrafos. 3) Em questões de múltipla escolha, comece a resposta pela letra correta."#;

/// 提示词构造
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system: String,
}

impl PromptBuilder {
    pub fn new(mode: AnswerMode, format_example: Option<&str>) -> Self {
        let mut system = match mode {
            AnswerMode::Fa => FA_PROMPT.to_string(),
            AnswerMode::Qa => QA_PROMPT.to_string(),
        };

        if let (AnswerMode::Fa, Some(example)) = (mode, format_example) {
            system.push_str("\n\nEXEMPLO DE FORMATO JFLAP (SIGA EXATAMENTE O FORMATO):\n");
            system.push_str(example);
        }

        Self { system }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.answer_mode, config.format_example.as_deref())
    }

    pub fn build(&self, text: &str) -> String {
        format!("{}\n\nTEXTO:\n\n{}\n", self.system, text)
    }
}
