//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文件处理器
//! - 管理应用生命周期（初始化、运行）
//! - 扫描输入目录，按名称顺序逐个处理
//! - 捕获单个文件的错误，继续处理下一个
//! - 输出全局统计信息
//!
//! ### `file_processor` - 单个文件处理器
//! - 提取 → 切分 → 逐题富化 → 汇总 的可恢复状态机
//! - 每一步完成后写回 `status.json`
//! - 创建并复用 QuestionFlow
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PathBuf>)
//!     ↓
//! file_processor (处理 Vec<QuestionEntry>)
//!     ↓
//! workflow::QuestionFlow (处理单个 QuestionEntry)
//!     ↓
//! services (能力层：enrichment / llm / jflap / output)
//!     ↓
//! infrastructure (基础设施：DocumentExtractor)
//! ```

pub mod batch_processor;
pub mod file_processor;

// 重新导出主要类型
pub use batch_processor::{list_input_files, App, ProcessingStats};
pub use file_processor::{FileOutcome, FileProcessor};
