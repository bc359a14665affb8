//! 题目切分引擎
//!
//! 把提取出来的纯文本切分成有序的题目条目，按层级兜底，先命中者胜出：
//!
//! ```text
//! 1. 按题号分节（Questão N / Question N / QN / N) / N.）
//! 2. 节内按字母小题切分（a) b) …，A)~D) 归为选项）
//! 3. 节内无字母小题 → 节内通用标题切分
//! 4. 全部为空 → 全文字母分组（a) 重新计数）
//! 5. 仍为空 → 全文通用标题切分
//! ```
//!
//! 最后按 `max_per_block` 分块，供后续批量富化使用。

pub mod fallback;
pub mod matchers;
pub mod sections;

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

use crate::models::QuestionEntry;
use matchers::{HeaderMatcher, MatcherChain};

/// 实际产生结果的切分层
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationStrategy {
    /// 按题号分节
    Sections,
    /// 全文字母分组
    LetterGroups,
    /// 全文通用标题切分
    Generic,
}

impl fmt::Display for SegmentationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentationStrategy::Sections => write!(f, "按题号分节"),
            SegmentationStrategy::LetterGroups => write!(f, "全文字母分组"),
            SegmentationStrategy::Generic => write!(f, "通用标题切分"),
        }
    }
}

/// 切分结果
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub entries: Vec<QuestionEntry>,
    pub strategy: SegmentationStrategy,
    /// 带题号的节数
    pub section_count: usize,
}

impl Segmentation {
    /// 按块大小分组
    pub fn blocks(&self, max_per_block: usize) -> Vec<Vec<QuestionEntry>> {
        split_into_blocks(&self.entries, max_per_block)
    }
}

/// 题目切分器
pub struct Segmenter {
    section_header: HeaderMatcher,
    letter_chain: MatcherChain,
    generic_chain: MatcherChain,
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            section_header: HeaderMatcher::numbered(),
            letter_chain: MatcherChain::letter_items(),
            generic_chain: MatcherChain::generic(),
        }
    }

    /// 切分整篇文本
    pub fn segment(&self, raw_text: &str) -> Segmentation {
        let lines: Vec<&str> = raw_text.lines().collect();

        // ① ~ ③ 按题号分节
        let all_sections = sections::split_sections(&lines, &self.section_header);
        let numbered: Vec<_> = all_sections
            .iter()
            .filter(|s| s.number.is_some())
            .collect();

        if let Some(preamble) = all_sections.iter().find(|s| s.number.is_none()) {
            debug!("忽略第一个题号之前的 {} 行", preamble.lines.len());
        }

        let mut entries: Vec<QuestionEntry> = numbered
            .iter()
            .flat_map(|section| {
                sections::segment_section(section, &self.letter_chain, &self.generic_chain)
            })
            .collect();
        let mut strategy = SegmentationStrategy::Sections;

        // ④ 全文字母分组
        if entries.is_empty() {
            entries = fallback::group_letter_runs(&lines, &self.letter_chain);
            strategy = SegmentationStrategy::LetterGroups;
        }

        // ⑤ 全文通用标题切分
        if entries.is_empty() {
            entries = sections::split_generic(&lines, &self.generic_chain);
            strategy = SegmentationStrategy::Generic;
        }

        dedupe_ids(&mut entries);

        info!(
            "✂️ 切分完成: {} 个条目, {} 个题号节 (方式: {})",
            entries.len(),
            numbered.len(),
            strategy
        );

        Segmentation {
            entries,
            strategy,
            section_count: numbered.len(),
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

/// 按顺序分块，每块最多 `max_per_block` 个，最后一块可以更短
pub fn split_into_blocks(entries: &[QuestionEntry], max_per_block: usize) -> Vec<Vec<QuestionEntry>> {
    entries
        .chunks(max_per_block.max(1))
        .map(<[QuestionEntry]>::to_vec)
        .collect()
}

/// 切分并分块
pub fn split_questions(raw_text: &str, max_per_block: usize) -> Vec<Vec<QuestionEntry>> {
    Segmenter::new().segment(raw_text).blocks(max_per_block)
}

/// 同一次运行内 ID 必须唯一；重复的加上 `_2`、`_3` 后缀
fn dedupe_ids(entries: &mut [QuestionEntry]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for entry in entries.iter_mut() {
        let count = seen.entry(entry.id.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            let mut suffix = *count;
            let mut candidate = format!("{}_{}", entry.id, suffix);
            while seen.contains_key(&candidate) {
                suffix += 1;
                candidate = format!("{}_{}", entry.id, suffix);
            }
            debug!("重复的题目ID {} 改为 {}", entry.id, candidate);
            seen.insert(candidate.clone(), 1);
            entry.id = candidate;
        }
    }
}
