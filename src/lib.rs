//! # Quiz Extract
//!
//! 从 PDF / DOCX 中提取题目，调用 LLM 生成答案或有限自动机，并输出 JFLAP 文件
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露"文件 → 纯文本"的能力
//! - `DocumentExtractor` - 提取器接口，`FileExtractor` 为 pdf/docx 实现
//!
//! ### ② 业务能力层（Services + Segmenter）
//! - `segmenter/` - 按题号、字母小题、选项分层切分文本
//! - `services/` - 描述"我能做什么"，只处理单个题目
//! - `LlmEnricher` - 限流 + 重试 + LLM 调用 + JSON 恢复
//! - `OutputWriter` / `jflap` - 写出 txt / json / jff
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionCtx` - 上下文封装（文件 + 题目索引）
//! - `QuestionFlow` - 流程编排（提示词 → 富化 → 合并 → 写出）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文件处理器
//! - `orchestrator/file_processor` - 单个文件的可恢复状态机
//!
//! ## 模块结构

pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod segmenter;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{AnswerMode, Config};
pub use error::{AppError, Result};
pub use models::{AutomatonKind, QuestionEntry};
pub use orchestrator::{App, FileProcessor};
pub use segmenter::{split_questions, Segmenter};
pub use workflow::{ProcessResult, QuestionCtx, QuestionFlow};
