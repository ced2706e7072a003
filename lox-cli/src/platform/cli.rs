//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和源码上下文打印。

use lox_api::LoxError;

/// 错误行前后显示的上下文行数
const CONTEXT_LINES: usize = 2;

/// 错误输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorFormat {
    /// 错误消息 + 源码上下文
    Text,
    /// 单行 JSON 报告（工具集成）
    Json,
}

/// 打印错误；文本格式附带源代码上下文
pub fn print_error_with_source(e: &LoxError, source: &str, format: ErrorFormat) {
    eprint!("{}", render_error(e, source, format));
}

/// 渲染错误输出
pub fn render_error(e: &LoxError, source: &str, format: ErrorFormat) -> String {
    match format {
        ErrorFormat::Json => match e.to_report().to_json() {
            Ok(json) => format!("{json}\n"),
            Err(_) => format!("{e}\n"),
        },
        ErrorFormat::Text => {
            let mut out = format!("{e}\n");
            if let Some(context) = e.line().and_then(|line| source_context(source, line)) {
                out.push_str(&context);
            }
            out
        }
    }
}

/// 源代码上下文（错误行用 `>` 标出）；行号越界时返回 None
pub fn source_context(source: &str, error_line: usize) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    if error_line == 0 || error_line > lines.len() {
        return None;
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(lines.len());
    let width = end_line.to_string().len();

    let mut out = String::new();
    for line_idx in start_line..=end_line {
        let marker = if line_idx == error_line { '>' } else { ' ' };
        out.push_str(&format!(
            "{marker} {line_idx:>width$} | {}\n",
            lines[line_idx - 1]
        ));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lox_api::{run, RunConfig};

    fn error_of(source: &str) -> LoxError {
        run(source, &RunConfig::capturing()).unwrap_err()
    }

    #[test]
    fn test_render_text_with_context() {
        let source = "var a = 1;\nprint a + nil;";
        let rendered = render_error(&error_of(source), source, ErrorFormat::Text);
        assert_eq!(
            rendered,
            "Operands must be two numbers or two strings.\n[line 2] in script\n  1 | var a = 1;\n> 2 | print a + nil;\n"
        );
    }

    #[test]
    fn test_render_json_report() {
        let source = "print -\"x\";";
        let rendered = render_error(&error_of(source), source, ErrorFormat::Json);
        assert!(rendered.starts_with('{'));
        assert!(rendered.ends_with("}\n"));
        assert!(rendered.contains(r#""phase":"runtime""#));
        assert!(rendered.contains(r#""error_kind":"OperandMustBeNumber""#));
        assert!(rendered.contains(r#""line":1"#));
    }

    #[test]
    fn test_render_json_compile_error() {
        let source = "print ;";
        let rendered = render_error(&error_of(source), source, ErrorFormat::Json);
        assert!(rendered.contains(r#""phase":"compile""#));
        assert!(rendered.contains("Expect expression."));
    }

    #[test]
    fn test_context_marks_error_line() {
        let source = "var a = 1;\nvar b = 2;\nprint a + nil;\nprint b;";
        let context = source_context(source, 3).unwrap();
        assert_eq!(
            context,
            "  1 | var a = 1;\n  2 | var b = 2;\n> 3 | print a + nil;\n  4 | print b;\n"
        );
    }

    #[test]
    fn test_context_pads_line_numbers() {
        let source: String = (1..=12).map(|i| format!("line{i}\n")).collect();
        let context = source_context(&source, 10).unwrap();
        assert!(context.starts_with("   8 | line8\n"));
        assert!(context.contains("> 10 | line10\n"));
        assert!(context.ends_with("  12 | line12\n"));
    }

    #[test]
    fn test_context_out_of_range() {
        assert_eq!(source_context("print 1;", 0), None);
        assert_eq!(source_context("print 1;", 5), None);
    }
}
