//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。日志写到 stderr，
//! 不与脚本的 `print` 输出混在一起。

use std::io;
use std::path::Path;
use std::sync::Mutex;

use lox_api::{LoggingConfig, Phase};
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

use crate::config::level_filter;

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// 按阶段构建过滤目标
pub fn targets(logging: &LoggingConfig) -> Targets {
    let global = level_filter(logging.level);
    [Phase::Scanner, Phase::Compiler, Phase::Vm]
        .into_iter()
        .fold(Targets::new().with_default(global), |targets, phase| {
            targets.with_target(phase.target(), level_filter(logging.level_for(phase)))
        })
        .with_target("lox::cli", global)
}

/// 使用指定格式和日志配置初始化日志系统，可选同时写入文件
pub fn init_with_file(logging: &LoggingConfig, format: LogFormat, file: Option<&Path>) -> io::Result<()> {
    let targets = targets(logging);

    let file_layer = match file {
        Some(path) => {
            let handle = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(handle))
                    .with_filter(targets.clone()),
            )
        }
        None => None,
    };

    let console_layer = create_format_layer(format, io::stderr).with_filter(targets);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(io::Error::other)
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(format: LogFormat, make_writer: F) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: io::Write + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lox_api::LogLevel;
    use tracing::Level;

    #[test]
    fn test_targets_follow_phase_levels() {
        let cfg = LoggingConfig {
            compiler: Some(LogLevel::Debug),
            ..LoggingConfig::default()
        };
        let targets = targets(&cfg);
        assert!(targets.would_enable("lox::compiler", &Level::DEBUG));
        assert!(!targets.would_enable("lox::vm", &Level::DEBUG));
        assert!(targets.would_enable("lox::vm", &Level::WARN));
        assert!(!targets.would_enable("lox::cli", &Level::INFO));
    }

    #[test]
    fn test_silent_disables_everything() {
        let cfg = LoggingConfig::default().with_level(LogLevel::parse("silent"));
        let targets = targets(&cfg);
        for target in ["lox::scanner", "lox::compiler", "lox::vm", "lox::cli", "other"] {
            assert!(!targets.would_enable(target, &Level::ERROR));
        }
    }
}
