//! 按题号分节，再在节内按字母小题切分
//!
//! 节内没有字母小题时，退回到通用标题切分。

use crate::models::{QuestionEntry, Section};
use crate::segmenter::matchers::{HeaderMatcher, LineMatch, LineMatcher, MatcherChain};

/// 第一步：按带题号的标题分节
///
/// 标题行本身是该节的第一行；第一个标题之前的内容组成无题号的节。
pub fn split_sections(lines: &[&str], header: &HeaderMatcher) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section::new(None);

    for line in lines {
        if let Some(LineMatch::Header { number: Some(n) }) = header.match_line(line.trim()) {
            if current.number.is_some() || !current.lines.is_empty() {
                sections.push(current);
            }
            current = Section::new(Some(n));
        }
        current.lines.push(line.to_string());
    }

    if current.number.is_some() || !current.lines.is_empty() {
        sections.push(current);
    }
    sections
}

/// 第二步：节内按字母小题切分
///
/// - `a)` / `b.` 开启新的小题，ID 为 `Q<题号><字母>`
/// - `A)` ~ `D)` 追加到当前小题的选项
/// - 题号标题行（节首行）不会被当成字母小题
/// - 其他行追加到当前小题的正文
/// - 还没有小题时出现的行直接丢弃
pub fn split_letter_items(section: &Section, chain: &MatcherChain) -> Vec<QuestionEntry> {
    let prefix = section.id_prefix();
    let mut entries = Vec::new();
    let mut current: Option<QuestionEntry> = None;

    for line in &section.lines {
        match chain.classify(line) {
            Some(LineMatch::LetterItem { letter }) => {
                if let Some(done) = current.take() {
                    entries.push(done);
                }
                current = Some(QuestionEntry::new(
                    format!("{}{}", prefix, letter),
                    line.trim(),
                ));
            }
            Some(LineMatch::Alternative { text }) => {
                if let Some(entry) = current.as_mut() {
                    entry.alternatives.push(text);
                }
            }
            _ => {
                if let Some(entry) = current.as_mut() {
                    entry.text.push('\n');
                    entry.text.push_str(line);
                }
            }
        }
    }

    if let Some(done) = current {
        entries.push(done);
    }
    entries
}

/// 通用标题切分
///
/// 每个标题行开启一个新条目，ID 依次为 `Q1`、`Q2`…；
/// 由调用方按需要重新编号。
pub fn split_generic<S: AsRef<str>>(lines: &[S], chain: &MatcherChain) -> Vec<QuestionEntry> {
    let mut entries = Vec::new();
    let mut current: Option<QuestionEntry> = None;

    for line in lines {
        let line = line.as_ref();
        match chain.classify(line) {
            Some(LineMatch::Header { .. }) => {
                if let Some(done) = current.take() {
                    entries.push(done);
                }
                current = Some(QuestionEntry::new(
                    format!("Q{}", entries.len() + 1),
                    line.trim(),
                ));
            }
            Some(LineMatch::Alternative { text }) => {
                if let Some(entry) = current.as_mut() {
                    entry.alternatives.push(text);
                }
            }
            _ => {
                if let Some(entry) = current.as_mut() {
                    entry.text.push('\n');
                    entry.text.push_str(line);
                }
            }
        }
    }

    if let Some(done) = current {
        entries.push(done);
    }
    entries
}

/// 第三步：对没有字母小题的节做通用切分，并按题号重新编号
///
/// 只有一个条目时 ID 为 `Q<题号>`，多个时为 `Q<题号>_<序号>`。
pub fn split_section_generic(section: &Section, chain: &MatcherChain) -> Vec<QuestionEntry> {
    let prefix = section.id_prefix();
    let mut entries = split_generic(&section.lines, chain);

    if entries.len() == 1 {
        entries[0].id = prefix;
    } else {
        for (idx, entry) in entries.iter_mut().enumerate() {
            entry.id = format!("{}_{}", prefix, idx + 1);
        }
    }
    entries
}

/// 对单个带题号的节执行第二、三步
pub fn segment_section(
    section: &Section,
    letter_chain: &MatcherChain,
    generic_chain: &MatcherChain,
) -> Vec<QuestionEntry> {
    let letter_entries = split_letter_items(section, letter_chain);
    if !letter_entries.is_empty() {
        return letter_entries;
    }
    split_section_generic(section, generic_chain)
}
