//! 日志工具模块
//!
//! 提供日志初始化、运行日志文件和格式化输出的辅助函数

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化 tracing 订阅者
///
/// 默认 `info` 级别，可通过 `RUST_LOG` 覆盖。重复调用无副作用。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// 初始化运行日志文件（覆盖写入表头）
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n题目提取日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    if let Some(parent) = log_file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("无法创建日志目录: {}", parent.display()))?;
    }
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path.display()))?;
    Ok(())
}

/// 向运行日志文件追加一行（带时间戳）
pub fn append_log_line(log_file_path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path.display()))?;

    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        line
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(input_dir: &Path, output_dir: &Path, automaton: &str, answer_mode: &str, refresh: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目提取模式");
    info!("📂 输入目录: {}", input_dir.display());
    info!("📂 输出目录: {}", output_dir.display());
    info!("🤖 回答模式: {} | 自动机类型: {}", answer_mode, automaton);
    if refresh {
        info!("🔄 已启用 --refresh，所有断点将被重置");
    }
    info!("{}", "=".repeat(60));
}

/// 记录文件加载信息
pub fn log_files_loaded(total: usize) {
    info!("✓ 找到 {} 个待处理的文件", total);
    info!("💡 文件将按名称顺序逐个处理\n");
}

/// 记录单个文件开始
pub fn log_file_start(file_index: usize, total: usize, file_name: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📄 [文件 {}/{}] {}", file_index, total, file_name);
    info!("{}", "=".repeat(60));
}

/// 记录单个文件完成
pub fn log_file_complete(file_index: usize, entries: usize, enriched: usize, skipped: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ [文件 {}] 完成: 共 {} 题, 本次处理 {} 题, 跳过 {} 题",
        file_index, entries, enriched, skipped
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, failed: usize, total: usize, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
