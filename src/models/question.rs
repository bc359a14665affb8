use serde::{Deserialize, Serialize};

use crate::models::automaton::FiniteAutomaton;

/// 单个题目（或小题）
///
/// JSON 字段名与 LLM 返回的结构保持一致（`alternativas`、`correta` 等）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionEntry {
    pub id: String,
    #[serde(alias = "enunciado", default)]
    pub text: String,
    #[serde(rename = "alternativas", default)]
    pub alternatives: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fa: Option<FiniteAutomaton>,
    #[serde(rename = "correta", default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(rename = "explicacao", default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(rename = "resposta", default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl QuestionEntry {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// 用于文件名的 ID：去掉首尾空白，空格替换为下划线
    pub fn file_id(&self) -> String {
        let id = self.id.trim();
        if id.is_empty() {
            "Q".to_string()
        } else {
            id.replace(' ', "_")
        }
    }

    /// 发送给 LLM 的题目文本（题干 + 带字母的选项）
    pub fn prompt_text(&self) -> String {
        let mut text = self.text.clone();
        for (idx, alt) in self.alternatives.iter().enumerate() {
            text.push('\n');
            text.push_str(&format!("{}) {}", alternative_letter(idx), alt));
        }
        text
    }
}

/// 第 idx 个选项的字母（A、B、C…）
pub fn alternative_letter(idx: usize) -> char {
    char::from_u32('A' as u32 + idx as u32).unwrap_or('?')
}

/// 按题号切分出的中间分组
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// 检测到的题号；题号之前的内容为 None
    pub number: Option<u32>,
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(number: Option<u32>) -> Self {
        Self {
            number,
            lines: Vec::new(),
        }
    }

    /// ID 前缀：`Q<题号>`，无题号时为 `Q`
    pub fn id_prefix(&self) -> String {
        match self.number {
            Some(n) => format!("Q{}", n),
            None => "Q".to_string(),
        }
    }
}

/// 切分结果落盘格式（`<stem>_segmented.json`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentedDocument {
    #[serde(rename = "questoes", default)]
    pub questions: Vec<QuestionEntry>,
}
