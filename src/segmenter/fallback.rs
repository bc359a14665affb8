//! 全文字母分组兜底
//!
//! 文档里没有任何题号时使用：每遇到一个 `a)` 就开始新的一组，
//! 组号递增；同组内的 `b)`、`c)`… 各自成为独立的顶层条目 `Q<组号><字母>`。

use crate::models::QuestionEntry;
use crate::segmenter::matchers::{LineMatch, MatcherChain};

/// 按 `a)` 重新计数的字母分组
pub fn group_letter_runs<S: AsRef<str>>(lines: &[S], chain: &MatcherChain) -> Vec<QuestionEntry> {
    let mut entries = Vec::new();
    let mut current: Option<QuestionEntry> = None;
    let mut group = 0u32;

    for line in lines {
        let line = line.as_ref();
        match chain.classify(line) {
            Some(LineMatch::LetterItem { letter }) => {
                if let Some(done) = current.take() {
                    entries.push(done);
                }
                // 第一组可能不是从 a) 开始
                if letter == 'a' || group == 0 {
                    group += 1;
                }
                current = Some(QuestionEntry::new(
                    format!("Q{}{}", group, letter),
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
