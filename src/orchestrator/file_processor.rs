//! 单个文件处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责单个输入文件的完整流程，是文件级别的可恢复状态机：
//!
//! ```text
//! 未开始 → 文本已提取 → 已切分 → (逐题: 待处理 → 已富化) → 完成
//! ```
//!
//! 每完成一个步骤（提取、切分、一道题、一个块、汇总）都立即写回 `status.json`，
//! 中途崩溃最多丢失正在进行的那一道题。
//!
//! 切分缓存损坏时重新切分（题目进度随之清空），不会让该文件一直失败。
//!
//! `--refresh` 会先清空该文件的进度并立即落盘，然后从头执行；
//! 已有的输出文件不会被删除，只会在重新执行时被覆盖。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::RunOptions;
use crate::config::{AnswerMode, Config};
use crate::error::{AppError, Result};
use crate::infrastructure::{extract_text, DocumentExtractor};
use crate::models::{AutomatonKind, ProcessingStatus, QuestionEntry, StatusStore};
use crate::segmenter::{split_into_blocks, Segmenter};
use crate::services::{EnrichmentService, OutputLayout, OutputWriter, PromptBuilder};
use crate::workflow::{ProcessResult, QuestionCtx, QuestionFlow};

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub file_name: String,
    /// 切分出的题目数
    pub entries: usize,
    /// 本次调用富化服务的题目数
    pub enriched: usize,
    /// 断点中已完成而跳过的题目数
    pub skipped: usize,
    /// 富化服务返回空结果的题目数
    pub empty_results: usize,
    /// 汇总文件路径
    pub consolidated: PathBuf,
}

/// 单个文件处理器
pub struct FileProcessor {
    extractor: Arc<dyn DocumentExtractor>,
    flow: QuestionFlow,
    segmenter: Segmenter,
    store: StatusStore,
    output_dir: PathBuf,
    solved_dir: String,
    kind: AutomatonKind,
    refresh: bool,
    answer_mode: AnswerMode,
    max_per_block: usize,
}

impl FileProcessor {
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        enricher: Arc<dyn EnrichmentService>,
        config: &Config,
        options: &RunOptions,
    ) -> Self {
        Self {
            extractor,
            flow: QuestionFlow::new(enricher, PromptBuilder::from_config(config), config.answer_mode),
            segmenter: Segmenter::new(),
            store: StatusStore::new(&options.output_dir),
            output_dir: options.output_dir.clone(),
            solved_dir: options.solved_dir.clone(),
            kind: options.kind,
            refresh: options.refresh,
            answer_mode: config.answer_mode,
            max_per_block: config.max_per_block,
        }
    }

    /// 处理单个文件
    ///
    /// # 参数
    /// - `input_path`: 输入文件（.pdf / .docx）
    /// - `file_index`: 文件索引（仅用于日志）
    pub async fn process(&self, input_path: &Path, file_index: usize) -> Result<FileOutcome> {
        // 不支持的自动机类型在动任何文件之前报错
        self.kind.ensure_supported()?;

        let file_name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::NotFound {
                path: input_path.to_path_buf(),
            })?;

        let layout = OutputLayout::new(&self.output_dir, &self.solved_dir, input_path);
        let writer = OutputWriter::new(layout.clone(), self.kind);

        let mut status = if self.refresh {
            info!("[文件 {}] 🔄 重置进度: {}", file_index, file_name);
            let mut fresh = ProcessingStatus::default();
            self.store.save_entry(&file_name, &mut fresh).await?;
            fresh
        } else {
            self.store.load_entry(&file_name).await?
        };

        // ========== 步骤 1: 提取文本 ==========
        let text = self
            .ensure_text(input_path, &layout, &file_name, &mut status, file_index)
            .await?;

        // ========== 步骤 2: 切分题目 ==========
        let entries = self
            .ensure_segmented(&text, &writer, &file_name, &mut status, file_index)
            .await?;

        // ========== 步骤 3: 逐题富化 ==========
        let total = entries.len();
        let blocks = split_into_blocks(&entries, self.max_per_block);
        info!(
            "[文件 {}] 📋 共 {} 题，分为 {} 块，已完成 {} 题",
            file_index,
            total,
            blocks.len(),
            status.questions_done.len()
        );

        let mut processed: Vec<QuestionEntry> = Vec::with_capacity(total);
        let mut enriched = 0;
        let mut skipped = 0;
        let mut empty_results = 0;
        let mut question_index = 0;

        for (block_index, block) in blocks.into_iter().enumerate() {
            debug!("[文件 {}] 块 {} 开始 ({} 题)", file_index, block_index + 1, block.len());

            for mut entry in block {
                question_index += 1;

                if status.is_question_done(&entry.id) {
                    skipped += 1;
                    // 汇总时使用之前写出的富化结果
                    let stored = match writer.read_entry(&entry).await {
                        Ok(stored) => stored,
                        Err(e) => {
                            warn!(
                                "[文件 {}] ⚠️ 无法读取 {} 的已有结果 ({})，汇总时使用切分结果",
                                file_index, entry.id, e
                            );
                            None
                        }
                    };
                    processed.push(stored.unwrap_or(entry));
                    continue;
                }

                let ctx = QuestionCtx::new(file_name.clone(), file_index, question_index, total);
                match self.flow.run(&mut entry, &writer, &ctx).await? {
                    ProcessResult::Enriched => {}
                    ProcessResult::NoData => empty_results += 1,
                }
                enriched += 1;

                status.mark_question_done(entry.id.clone());
                self.store.save_entry(&file_name, &mut status).await?;
                processed.push(entry);
            }

            if status.blocks_done < block_index + 1 {
                status.blocks_done = block_index + 1;
                self.store.save_entry(&file_name, &mut status).await?;
            }
        }

        // ========== 步骤 4: 汇总输出 ==========
        let consolidated = writer.write_consolidated(self.answer_mode, &processed).await?;
        info!("[文件 {}] 💾 汇总文件: {}", file_index, consolidated.display());

        status.done = true;
        self.store.save_entry(&file_name, &mut status).await?;

        Ok(FileOutcome {
            file_name,
            entries: total,
            enriched,
            skipped,
            empty_results,
            consolidated,
        })
    }

    /// 读取缓存文本，或调用提取器
    async fn ensure_text(
        &self,
        input_path: &Path,
        layout: &OutputLayout,
        file_name: &str,
        status: &mut ProcessingStatus,
        file_index: usize,
    ) -> Result<String> {
        let text_path = layout.text_path();

        if status.text_extracted {
            match tokio::fs::read_to_string(&text_path).await {
                Ok(text) => {
                    info!("[文件 {}] ⏭️ 使用已提取的文本: {}", file_index, text_path.display());
                    return Ok(text);
                }
                Err(e) => {
                    warn!(
                        "[文件 {}] ⚠️ 进度显示已提取，但无法读取 {} ({})，重新提取",
                        file_index,
                        text_path.display(),
                        e
                    );
                }
            }
        }

        info!("[文件 {}] 📖 正在提取文本...", file_index);
        let text = extract_text(self.extractor.clone(), input_path, Some(&text_path)).await?;

        status.text_extracted = true;
        self.store.save_entry(file_name, status).await?;
        Ok(text)
    }

    /// 读取缓存的切分结果，或重新切分
    async fn ensure_segmented(
        &self,
        text: &str,
        writer: &OutputWriter,
        file_name: &str,
        status: &mut ProcessingStatus,
        file_index: usize,
    ) -> Result<Vec<QuestionEntry>> {
        let segmented_path = writer.layout().segmented_path();

        if !self.refresh && segmented_path.is_file() {
            match writer.read_segmented().await {
                Ok(entries) => {
                    info!("[文件 {}] ⏭️ 使用已有的切分结果: {}", file_index, segmented_path.display());
                    if !status.segmented {
                        status.segmented = true;
                        self.store.save_entry(file_name, status).await?;
                    }
                    return Ok(entries);
                }
                Err(e) => {
                    warn!(
                        "[文件 {}] ⚠️ 切分缓存 {} 无法读取 ({})，重新切分",
                        file_index,
                        segmented_path.display(),
                        e
                    );
                }
            }
        }

        info!("[文件 {}] ✂️ 正在切分题目...", file_index);
        let segmentation = self.segmenter.segment(text);
        if segmentation.entries.is_empty() {
            warn!("[文件 {}] ⚠️ 没有识别出任何题目", file_index);
        }
        writer.write_segmented(&segmentation.entries).await?;

        status.segmented = true;
        status.reset_questions();
        self.store.save_entry(file_name, status).await?;
        Ok(segmentation.entries)
    }
}
