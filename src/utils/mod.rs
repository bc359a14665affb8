pub mod fs_utils;
pub mod logging;

pub use fs_utils::write_atomic;
pub use logging::truncate_text;
