//! 批量文件处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量文件的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写运行日志表头、创建提取器和富化服务
//! 2. **批量加载**：扫描输入目录下的 `.pdf` / `.docx`（不递归，按名称排序）
//! 3. **顺序处理**：一次一个文件，委托 `FileProcessor` 完成单个文件
//! 4. **刷新**：`--refresh` 时先清空整个 `status.json`
//! 5. **错误隔离**：单个文件失败只记录日志，继续处理下一个
//! 6. **全局统计**：汇总所有文件的处理结果

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::cli::RunOptions;
use crate::config::Config;
use crate::infrastructure::{DocumentExtractor, DocumentKind, FileExtractor};
use crate::models::StatusStore;
use crate::orchestrator::file_processor::{FileOutcome, FileProcessor};
use crate::services::{EnrichmentService, LlmEnricher};
use crate::utils::logging::{
    append_log_line, init_log_file, log_file_complete, log_file_start, log_files_loaded,
    log_startup, print_final_stats,
};

/// 应用主结构
pub struct App {
    options: RunOptions,
    log_file: PathBuf,
    store: StatusStore,
    processor: FileProcessor,
}

impl App {
    /// 初始化应用（使用真实的提取器和 LLM 服务）
    pub fn initialize(config: Config, options: RunOptions) -> Result<Self> {
        let extractor: Arc<dyn DocumentExtractor> = Arc::new(FileExtractor::new());
        let enricher: Arc<dyn EnrichmentService> = Arc::new(LlmEnricher::new(&config));
        info!("🤖 LLM 模型: {}", config.llm_model_name);
        Self::with_services(config, options, extractor, enricher)
    }

    /// 使用指定的提取器和富化服务初始化
    pub fn with_services(
        config: Config,
        options: RunOptions,
        extractor: Arc<dyn DocumentExtractor>,
        enricher: Arc<dyn EnrichmentService>,
    ) -> Result<Self> {
        init_log_file(&config.log_file)?;

        log_startup(
            &options.input_dir,
            &options.output_dir,
            options.kind.as_str(),
            &config.answer_mode.to_string(),
            options.refresh,
        );

        let processor = FileProcessor::new(extractor, enricher, &config, &options);

        Ok(Self {
            store: StatusStore::new(&options.output_dir),
            options,
            log_file: config.log_file,
            processor,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        std::fs::create_dir_all(&self.options.output_dir).with_context(|| {
            format!("无法创建输出目录: {}", self.options.output_dir.display())
        })?;

        // --refresh 清空整个进度表，包括已经不在输入目录里的文件
        if self.options.refresh {
            info!("🔄 清空全部处理进度: {}", self.options.output_dir.display());
            self.store.clear().await?;
        }

        info!("\n📁 正在扫描待处理的文件...");
        let files = list_input_files(&self.options.input_dir)?;

        let mut stats = ProcessingStats {
            total: files.len(),
            ..Default::default()
        };

        if files.is_empty() {
            warn!(
                "⚠️ 没有找到待处理的 .pdf / .docx 文件: {}",
                self.options.input_dir.display()
            );
            return Ok(stats);
        }

        log_files_loaded(files.len());

        for (idx, path) in files.iter().enumerate() {
            let file_index = idx + 1;
            let file_name = display_name(path);
            log_file_start(file_index, files.len(), &file_name);

            match self.processor.process(path, file_index).await {
                Ok(outcome) => {
                    log_outcome(file_index, &outcome);
                    stats.success += 1;
                }
                Err(e) => {
                    error!("[文件 {}] ❌ 处理 {} 时发生错误: {}", file_index, file_name, e);
                    if let Err(log_err) =
                        append_log_line(&self.log_file, &format!("❌ {}: {}", file_name, e))
                    {
                        warn!("⚠️ 无法写入日志文件: {}", log_err);
                    }
                    stats.failed += 1;
                }
            }
        }

        print_final_stats(stats.success, stats.failed, stats.total, &self.log_file);
        Ok(stats)
    }
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

/// 列出输入目录下支持的文件（不递归，按文件名排序）
pub fn list_input_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)
        .with_context(|| format!("无法读取输入目录: {}", input_dir.display()))?;

    let mut files = Vec::new();
    for entry in read_dir {
        let path = entry
            .with_context(|| format!("无法读取输入目录: {}", input_dir.display()))?
            .path();
        if path.is_file() && DocumentKind::from_path(&path).is_some() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn log_outcome(file_index: usize, outcome: &FileOutcome) {
    log_file_complete(file_index, outcome.entries, outcome.enriched, outcome.skipped);
    if outcome.empty_results > 0 {
        warn!(
            "[文件 {}] ⚠️ {} 题没有拿到富化结果",
            file_index, outcome.empty_results
        );
    }
}
