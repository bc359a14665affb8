//! 行匹配策略
//!
//! 每个匹配器只回答一个问题："这一行是不是我认识的标记？"
//! 返回结构化结果或 None。切分器按固定优先级依次尝试，先匹配者胜出。

use regex::Regex;

/// 单行匹配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    /// 题目标题（`Questão 3`、`Question 3`、`Q3`、`3)`、`3.`）
    Header { number: Option<u32> },
    /// 小写字母小题（`a)`、`b.`）
    LetterItem { letter: char },
    /// 选择题选项（`A)` ~ `D)`），只保留标记后的文字
    Alternative { text: String },
}

/// 行匹配策略
pub trait LineMatcher: Send + Sync {
    /// 策略名称（用于日志）
    fn name(&self) -> &'static str;

    /// 尝试匹配一行（调用方负责 trim）
    fn match_line(&self, line: &str) -> Option<LineMatch>;
}

/// 题目标题匹配器
pub struct HeaderMatcher {
    regex: Regex,
    name: &'static str,
}

impl HeaderMatcher {
    /// 只认带题号的标题，用于按题号分节
    pub fn numbered() -> Self {
        Self {
            regex: Regex::new(
                r"(?i)^(?:(?:quest(?:ão|ao|ion)|q\.?)\s*(?P<n1>\d+)|(?P<n2>\d+)\s*[\)\.](?:\s|$))",
            )
            .expect("invalid numbered header regex"),
            name: "numbered_header",
        }
    }

    /// 同时接受不带题号的 `Questão` / `Question`，用于通用兜底切分
    pub fn generic() -> Self {
        Self {
            regex: Regex::new(
                r"(?i)^(?:(?:quest(?:ão|ao|ion)|q\.?)\s*(?P<n1>\d+)|(?P<n2>\d+)\s*[\)\.](?:\s|$)|quest(?:ão|ao|ion)\b)",
            )
            .expect("invalid generic header regex"),
            name: "generic_header",
        }
    }
}

impl LineMatcher for HeaderMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn match_line(&self, line: &str) -> Option<LineMatch> {
        let caps = self.regex.captures(line)?;
        let number = caps
            .name("n1")
            .or_else(|| caps.name("n2"))
            .and_then(|m| m.as_str().parse::<u32>().ok());
        Some(LineMatch::Header { number })
    }
}

/// 小写字母小题匹配器
pub struct LetterItemMatcher {
    regex: Regex,
}

impl LetterItemMatcher {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(r"^(?P<label>[a-z])[\)\.](?:\s+|$)")
                .expect("invalid letter item regex"),
        }
    }
}

impl Default for LetterItemMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LineMatcher for LetterItemMatcher {
    fn name(&self) -> &'static str {
        "letter_item"
    }

    fn match_line(&self, line: &str) -> Option<LineMatch> {
        let caps = self.regex.captures(line)?;
        let letter = caps.name("label")?.as_str().chars().next()?;
        Some(LineMatch::LetterItem { letter })
    }
}

/// 选择题选项匹配器（A-D）
pub struct AlternativeMatcher {
    regex: Regex,
}

impl AlternativeMatcher {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(r"^[A-D][\)\.]\s+(?P<text>.*)$").expect("invalid alternative regex"),
        }
    }
}

impl Default for AlternativeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LineMatcher for AlternativeMatcher {
    fn name(&self) -> &'static str {
        "alternative"
    }

    fn match_line(&self, line: &str) -> Option<LineMatch> {
        let caps = self.regex.captures(line)?;
        Some(LineMatch::Alternative {
            text: caps["text"].to_string(),
        })
    }
}

/// 按优先级排列的匹配器链
pub struct MatcherChain {
    matchers: Vec<Box<dyn LineMatcher>>,
}

impl MatcherChain {
    pub fn new(matchers: Vec<Box<dyn LineMatcher>>) -> Self {
        Self { matchers }
    }

    /// 小题切分用：题号标题 > 字母小题 > 选项
    ///
    /// `q. 6` 这样的标题同时符合字母小题的形状，必须先按标题识别。
    pub fn letter_items() -> Self {
        Self::new(vec![
            Box::new(HeaderMatcher::numbered()),
            Box::new(LetterItemMatcher::new()),
            Box::new(AlternativeMatcher::new()),
        ])
    }

    /// 通用切分用：标题优先于选项
    pub fn generic() -> Self {
        Self::new(vec![
            Box::new(HeaderMatcher::generic()),
            Box::new(AlternativeMatcher::new()),
        ])
    }

    /// 依次尝试，返回第一个匹配结果
    pub fn classify(&self, line: &str) -> Option<LineMatch> {
        let trimmed = line.trim();
        self.matchers.iter().find_map(|m| m.match_line(trimmed))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }
}
