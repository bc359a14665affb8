//! 从 LLM 返回文本中恢复 JSON
//!
//! 模型经常在 JSON 前后加说明文字或 Markdown 代码块。
//! 先尝试整体解析，失败后依次尝试每个 `{` 开始的第一个括号配平子串。

use serde_json::Value;

/// 尝试从任意文本中取出一个 JSON 对象
pub fn recover_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    let mut search_from = 0;
    while let Some(offset) = trimmed[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&trimmed[start..]) {
            let candidate = &trimmed[start..start + end];
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                return Some(value);
            }
        }
        search_from = start + 1;
    }

    None
}

/// `text` 以 `{` 开头，返回与之配平的 `}` 之后的字节位置
///
/// 字符串字面量里的括号不参与计数。
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}
