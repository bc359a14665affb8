//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 构造提示词（题干 + 带字母的选项）
//! 2. 调用富化服务
//! 3. 按回答模式合并返回字段
//! 4. 写出该题的 .txt / .json / .jff
//!
//! 断点记录由调用方负责，本层不持有任何状态。

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AnswerMode;
use crate::error::Result;
use crate::models::QuestionEntry;
use crate::services::{EnrichedQuestion, EnrichmentService, OutputWriter, PromptBuilder};
use crate::utils::logging::truncate_text;
use crate::workflow::question_ctx::QuestionCtx;

/// 题目处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// 拿到了富化结果
    Enriched,
    /// 服务返回空结果，只写出原始题目
    NoData,
}

/// 题目处理流程
///
/// - 决定何时调用富化服务、如何合并结果
/// - 不关心断点和文件级流程
pub struct QuestionFlow {
    enricher: Arc<dyn EnrichmentService>,
    prompts: PromptBuilder,
    mode: AnswerMode,
}

impl QuestionFlow {
    pub fn new(enricher: Arc<dyn EnrichmentService>, prompts: PromptBuilder, mode: AnswerMode) -> Self {
        Self {
            enricher,
            prompts,
            mode,
        }
    }

    pub async fn run(
        &self,
        entry: &mut QuestionEntry,
        writer: &OutputWriter,
        ctx: &QuestionCtx,
    ) -> Result<ProcessResult> {
        info!("{} {}: {}", ctx, entry.id, truncate_text(entry.text.trim(), 60));

        let prompt = self.prompts.build(&entry.prompt_text());
        let result = self.enricher.enrich(&prompt).await?;

        let outcome = match result.first() {
            Some(enriched) => {
                merge_enrichment(entry, enriched, self.mode);
                ProcessResult::Enriched
            }
            None => {
                warn!("{} ⚠️ {} 没有返回任何结果", ctx, entry.id);
                ProcessResult::NoData
            }
        };

        writer.write_entry(entry).await?;
        info!("{} ✓ {} 已完成", ctx, entry.id);

        Ok(outcome)
    }
}

/// 按回答模式把返回字段合并到题目上
///
/// - fa 模式：`fa`、`alternativas`、`correta`、`explicacao`
/// - qa 模式：`resposta`
///
/// 返回里没有的字段保持原值；空的 `alternativas` 不会覆盖切分时识别出的选项。
pub fn merge_enrichment(entry: &mut QuestionEntry, enriched: &EnrichedQuestion, mode: AnswerMode) {
    match mode {
        AnswerMode::Fa => {
            if let Some(fa) = &enriched.fa {
                entry.fa = Some(fa.clone());
            }
            if let Some(alternatives) = enriched.alternatives.as_ref().filter(|a| !a.is_empty()) {
                entry.alternatives = alternatives.clone();
            }
            if let Some(correct) = &enriched.correct_answer {
                entry.correct_answer = Some(correct.clone());
            }
            if let Some(explanation) = &enriched.explanation {
                entry.explanation = Some(explanation.clone());
            }
        }
        AnswerMode::Qa => {
            if let Some(answer) = &enriched.answer {
                entry.answer = Some(answer.clone());
            }
        }
    }
}
