//! 题目处理上下文
//!
//! 封装"我正在处理哪个文件的第几题"这一信息

use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 输入文件名（也是断点记录的键）
    pub file_name: String,

    /// 文件索引（仅用于日志显示）
    pub file_index: usize,

    /// 题目在文件中的索引（从1开始）
    pub question_index: usize,

    /// 文件中的题目总数
    pub total: usize,
}

impl QuestionCtx {
    pub fn new(file_name: impl Into<String>, file_index: usize, question_index: usize, total: usize) -> Self {
        Self {
            file_name: file_name.into(),
            file_index,
            question_index,
            total,
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文件 {}] 题目 {}/{}",
            self.file_index, self.question_index, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = QuestionCtx::new("lista.pdf", 2, 3, 10);
        assert_eq!(ctx.to_string(), "[文件 2] 题目 3/10");
    }
}
