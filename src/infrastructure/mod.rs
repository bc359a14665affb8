//! 基础设施层：持有外部资源（文件格式解析器），只暴露能力

pub mod extractor;

pub use extractor::{extract_text, DocumentExtractor, DocumentKind, FileExtractor};
