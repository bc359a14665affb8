//! 文档文本提取 - 基础设施层
//!
//! 只暴露"把文件变成纯文本"的能力，不认识题目和流程。
//! 支持 `.pdf`（pdf-extract）和 `.docx`（zip + quick-xml 读取 `word/document.xml`）。

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::utils::write_atomic;

/// 文本提取器
pub trait DocumentExtractor: Send + Sync {
    /// 提取整篇文档的纯文本
    fn extract(&self, path: &Path) -> Result<String>;
}

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// 按扩展名判断（大小写不敏感）
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }
}

/// 基于本地文件的提取器
#[derive(Debug, Default, Clone)]
pub struct FileExtractor;

impl FileExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_pdf(path: &Path) -> Result<String> {
        pdf_extract::extract_text(path).map_err(|e| AppError::extraction(path, e.to_string()))
    }

    fn extract_docx(path: &Path) -> Result<String> {
        let file = File::open(path).map_err(|e| AppError::io(path, e))?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| AppError::extraction(path, format!("无法作为 ZIP 读取: {}", e)))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| AppError::extraction(path, format!("缺少 word/document.xml: {}", e)))?
            .read_to_string(&mut xml)
            .map_err(|e| AppError::io(path, e))?;

        docx_xml_to_text(&xml).map_err(|e| AppError::extraction(path, e))
    }
}

impl DocumentExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(AppError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let text = match DocumentKind::from_path(path) {
            Some(DocumentKind::Pdf) => Self::extract_pdf(path)?,
            Some(DocumentKind::Docx) => Self::extract_docx(path)?,
            None => {
                return Err(AppError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        debug!("提取到 {} 个字符: {}", text.chars().count(), path.display());
        Ok(text)
    }
}

/// WordprocessingML → 纯文本，每个段落一行
fn docx_xml_to_text(xml: &str) -> std::result::Result<String, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let unescaped = t.unescape().map_err(|e| e.to_string())?;
                text.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "document.xml 解析失败 (位置 {}): {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    Ok(text)
}

/// 在阻塞线程池中提取文本，可选地把结果写到 `output_path`
pub async fn extract_text(
    extractor: Arc<dyn DocumentExtractor>,
    input_path: &Path,
    output_path: Option<&Path>,
) -> Result<String> {
    let path: PathBuf = input_path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extractor.extract(&path))
        .await
        .map_err(|e| AppError::extraction(input_path, format!("提取任务异常退出: {}", e)))??;

    if let Some(out) = output_path {
        write_atomic(out, &text).await?;
        info!("📝 文本已缓存: {}", out.display());
    }

    Ok(text)
}
