//! 断点续跑记录
//!
//! 每个输出目录一个 `status.json`，按源文件名记录处理进度。
//! 每完成一个工作单元就整体覆盖写入一次（先写临时文件再 rename）。

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::utils::write_atomic;

pub const STATUS_FILE: &str = "status.json";

/// 单个源文件的处理进度
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    #[serde(default)]
    pub text_extracted: bool,
    #[serde(default)]
    pub segmented: bool,
    #[serde(default)]
    pub questions_done: BTreeSet<String>,
    #[serde(default)]
    pub blocks_done: usize,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ProcessingStatus {
    pub fn is_question_done(&self, id: &str) -> bool {
        self.questions_done.contains(id)
    }

    pub fn mark_question_done(&mut self, id: impl Into<String>) {
        self.questions_done.insert(id.into());
    }

    /// 重新切分后，之前的题目进度全部作废
    pub fn reset_questions(&mut self) {
        self.questions_done.clear();
        self.blocks_done = 0;
        self.done = false;
    }

    fn touch(&mut self) {
        self.updated_at = Some(chrono::Local::now().to_rfc3339());
    }
}

/// 整个输出目录的进度表：文件名 → 进度
pub type StatusLedger = BTreeMap<String, ProcessingStatus>;

/// `status.json` 的读写
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(out_dir: &Path) -> Self {
        Self {
            path: out_dir.join(STATUS_FILE),
        }
    }

    /// 读取进度表；文件不存在时返回空表
    pub async fn load(&self) -> Result<StatusLedger> {
        if !fs::try_exists(&self.path)
            .await
            .map_err(|e| AppError::io(&self.path, e))?
        {
            return Ok(StatusLedger::new());
        }
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::io(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(StatusLedger::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// 读取单个文件的进度
    pub async fn load_entry(&self, file_name: &str) -> Result<ProcessingStatus> {
        Ok(self.load().await?.remove(file_name).unwrap_or_default())
    }

    /// 更新单个文件的进度并立即落盘
    ///
    /// 每次都重新读取整个表再写回，保证其他文件的记录不被覆盖。
    pub async fn save_entry(&self, file_name: &str, status: &mut ProcessingStatus) -> Result<()> {
        status.touch();
        let mut ledger = self.load().await?;
        ledger.insert(file_name.to_string(), status.clone());
        self.save(&ledger).await
    }

    /// 清空所有文件的进度（`--refresh`）
    pub async fn clear(&self) -> Result<()> {
        self.save(&StatusLedger::new()).await
    }

    /// 整体覆盖写入
    pub async fn save(&self, ledger: &StatusLedger) -> Result<()> {
        let json = serde_json::to_string_pretty(ledger)?;
        write_atomic(&self.path, json).await?;
        debug!("进度已保存: {}", self.path.display());
        Ok(())
    }
}
