//! 平台相关输出

mod cli;

pub use cli::{print_error_with_source, ErrorFormat};
