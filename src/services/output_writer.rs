//! 输出文件写入 - 业务能力层
//!
//! 只负责"把题目写成文件"，不关心流程和断点。
//! 所有文件都是整体覆盖写入（临时文件 + rename），已有文件不会被删除。

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::AnswerMode;
use crate::error::{AppError, Result};
use crate::models::question::alternative_letter;
use crate::models::{AutomatonKind, QuestionEntry, SegmentedDocument};
use crate::services::jflap;
use crate::utils::write_atomic;

/// 单个输入文件对应的输出路径
#[derive(Debug, Clone)]
pub struct OutputLayout {
    out_dir: PathBuf,
    solved_dir: PathBuf,
    stem: String,
}

impl OutputLayout {
    pub fn new(out_dir: &Path, solved_subdir: &str, input_path: &Path) -> Self {
        let stem = input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "documento".to_string());

        Self {
            out_dir: out_dir.to_path_buf(),
            solved_dir: out_dir.join(solved_subdir),
            stem,
        }
    }

    /// `<stem>.txt`：提取出的全文
    pub fn text_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.txt", self.stem))
    }

    /// `<stem>_segmented.json`
    pub fn segmented_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}_segmented.json", self.stem))
    }

    fn entry_base(&self, entry: &QuestionEntry) -> String {
        format!("{}_{}", self.stem, entry.file_id())
    }

    pub fn entry_text_path(&self, entry: &QuestionEntry) -> PathBuf {
        self.out_dir.join(format!("{}.txt", self.entry_base(entry)))
    }

    pub fn entry_json_path(&self, entry: &QuestionEntry) -> PathBuf {
        self.out_dir.join(format!("{}.json", self.entry_base(entry)))
    }

    pub fn entry_jflap_path(&self, entry: &QuestionEntry) -> PathBuf {
        self.solved_dir.join(format!("{}.jff", self.entry_base(entry)))
    }

    /// qa 模式的汇总答案
    pub fn answers_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}_respostas.txt", self.stem))
    }

    /// fa 模式的汇总自动机
    pub fn consolidated_jflap_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.jff", self.stem))
    }
}

/// 输出写入器
#[derive(Debug, Clone)]
pub struct OutputWriter {
    layout: OutputLayout,
    kind: AutomatonKind,
}

impl OutputWriter {
    pub fn new(layout: OutputLayout, kind: AutomatonKind) -> Self {
        Self { layout, kind }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// 写出切分结果
    pub async fn write_segmented(&self, entries: &[QuestionEntry]) -> Result<()> {
        let doc = SegmentedDocument {
            questions: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&doc)?;
        write_atomic(&self.layout.segmented_path(), &json).await
    }

    /// 读取已缓存的切分结果
    pub async fn read_segmented(&self) -> Result<Vec<QuestionEntry>> {
        let path = self.layout.segmented_path();
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::io(&path, e))?;
        let doc: SegmentedDocument = serde_json::from_str(&content)?;
        Ok(doc.questions)
    }

    /// 写出单个题目的 .txt / .json / .jff
    pub async fn write_entry(&self, entry: &QuestionEntry) -> Result<()> {
        write_atomic(&self.layout.entry_text_path(entry), &render_entry_text(entry)).await?;

        let json = serde_json::to_string_pretty(entry)?;
        write_atomic(&self.layout.entry_json_path(entry), &json).await?;

        let xml = jflap::render_entry(self.kind, entry)?;
        jflap::write_jflap(&self.layout.entry_jflap_path(entry), &xml).await?;

        debug!("题目 {} 的输出文件已写出", entry.id);
        Ok(())
    }

    /// 读取之前写出的单题 JSON（断点续跑时用于汇总），不存在时返回 None
    pub async fn read_entry(&self, entry: &QuestionEntry) -> Result<Option<QuestionEntry>> {
        let path = self.layout.entry_json_path(entry);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::io(&path, e)),
        }
    }

    /// 写出汇总文件，返回写出的路径
    pub async fn write_consolidated(&self, mode: AnswerMode, entries: &[QuestionEntry]) -> Result<PathBuf> {
        match mode {
            AnswerMode::Qa => {
                let path = self.layout.answers_path();
                write_atomic(&path, &render_answers(entries)).await?;
                Ok(path)
            }
            AnswerMode::Fa => {
                let path = self.layout.consolidated_jflap_path();
                let xml = jflap::render_consolidated(self.kind, entries)?;
                jflap::write_jflap(&path, &xml).await?;
                Ok(path)
            }
        }
    }
}

/// 单题文本：题干、带字母的选项、正确答案、解析
pub fn render_entry_text(entry: &QuestionEntry) -> String {
    let mut lines = vec![entry.text.clone()];
    for (idx, alt) in entry.alternatives.iter().enumerate() {
        lines.push(format!("{}) {}", alternative_letter(idx), alt));
    }
    if let Some(correct) = entry.correct_answer.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Correta: {}", correct));
    }
    if let Some(explanation) = entry.explanation.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Explicacao: {}", explanation));
    }
    lines.join("\n")
}

/// qa 模式汇总：`[id] 题干` / `Resposta: …` / 空行
pub fn render_answers(entries: &[QuestionEntry]) -> String {
    let mut lines = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        let id = if entry.id.trim().is_empty() {
            format!("Q{}", idx + 1)
        } else {
            entry.id.clone()
        };
        let text = entry.text.trim();
        if !text.is_empty() {
            lines.push(format!("[{}] {}", id, text));
        }
        if let Some(answer) = entry.answer.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            lines.push(format!("Resposta: {}", answer));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with_everything() -> QuestionEntry {
        let mut entry = QuestionEntry::new("Q1 a", "Qual é regular?");
        entry.alternatives = vec!["a^n b^n".into(), "(ab)*".into()];
        entry.correct_answer = Some("B".into());
        entry.explanation = Some("AFD com 2 estados".into());
        entry
    }

    #[test]
    fn test_entry_text_layout() {
        assert_eq!(
            render_entry_text(&entry_with_everything()),
            "Qual é regular?\nA) a^n b^n\nB) (ab)*\nCorreta: B\nExplicacao: AFD com 2 estados"
        );
        assert_eq!(render_entry_text(&QuestionEntry::new("Q2", "só texto")), "só texto");
    }

    #[test]
    fn test_answers_layout() {
        let mut first = QuestionEntry::new("Q1", "  Defina AFD. ");
        first.answer = Some("Uma quíntupla.".into());
        let second = QuestionEntry::new("", "Sem resposta");

        assert_eq!(
            render_answers(&[first, second]),
            "[Q1] Defina AFD.\nResposta: Uma quíntupla.\n\n[Q2] Sem resposta\n"
        );
    }

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new(Path::new("out"), "resolvidas", Path::new("in/prova 1.pdf"));
        let entry = QuestionEntry::new(" Q1 a ", "");

        assert_eq!(layout.text_path(), Path::new("out/prova 1.txt"));
        assert_eq!(layout.segmented_path(), Path::new("out/prova 1_segmented.json"));
        assert_eq!(layout.entry_text_path(&entry), Path::new("out/prova 1_Q1_a.txt"));
        assert_eq!(layout.entry_jflap_path(&entry), Path::new("out/resolvidas/prova 1_Q1_a.jff"));
        assert_eq!(layout.consolidated_jflap_path(), Path::new("out/prova 1.jff"));
        assert_eq!(layout.answers_path(), Path::new("out/prova 1_respostas.txt"));
    }

    #[tokio::test]
    async fn test_write_entry_and_segmented_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), "resolvidas", Path::new("lista.docx"));
        let writer = OutputWriter::new(layout.clone(), AutomatonKind::Fa);
        let entry = entry_with_everything();

        writer.write_entry(&entry).await.unwrap();
        assert!(layout.entry_text_path(&entry).is_file());
        let json = std::fs::read_to_string(layout.entry_json_path(&entry)).unwrap();
        assert!(json.contains("\"correta\": \"B\""));
        assert!(!json.contains("resposta"));
        let jff = std::fs::read_to_string(layout.entry_jflap_path(&entry)).unwrap();
        assert!(jff.contains("<type>fa</type>"));

        let stored = writer.read_entry(&entry).await.unwrap().unwrap();
        assert_eq!(stored, entry);
        let missing = QuestionEntry::new("Q9", "");
        assert!(writer.read_entry(&missing).await.unwrap().is_none());

        writer.write_segmented(&[entry.clone()]).await.unwrap();
        let restored = writer.read_segmented().await.unwrap();
        assert_eq!(restored[0].id, entry.id);
        assert_eq!(restored[0].alternatives, entry.alternatives);
    }

    #[tokio::test]
    async fn test_consolidated_by_mode() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), "resolvidas", Path::new("lista.pdf"));
        let writer = OutputWriter::new(layout, AutomatonKind::Mealy);
        let entries = vec![QuestionEntry::new("Q1", "x")];

        let qa = writer.write_consolidated(AnswerMode::Qa, &entries).await.unwrap();
        assert!(qa.ends_with("lista_respostas.txt"));

        let fa = writer.write_consolidated(AnswerMode::Fa, &entries).await.unwrap();
        let xml = std::fs::read_to_string(fa).unwrap();
        assert!(xml.contains("<type>mealy</type>"));
    }
}
