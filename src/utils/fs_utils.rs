//! 文件写入工具
//!
//! 所有输出和缓存都先写到同目录下的临时文件，再 rename 覆盖目标，
//! 进程在写入中途退出时目标文件要么是旧内容，要么是新内容。

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{AppError, Result};

/// 原子写入：`<path>.tmp` → rename
pub async fn write_atomic(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::io(parent, e))?;
    }

    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, content)
        .await
        .map_err(|e| AppError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AppError::io(path, e))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
