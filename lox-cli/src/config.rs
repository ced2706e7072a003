//! CLI 配置
//!
//! 读取可选的 JSON 配置文件，并把日志级别转换为 tracing 过滤级别

use std::io;
use std::path::{Path, PathBuf};

use lox_api::{LogLevel, LoxConfig};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// 配置文件错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config '{}': {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
    #[error("Invalid config '{}': {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_json::Error),
}

/// 读取配置文件；未指定时使用默认配置
pub fn load(path: Option<&Path>) -> Result<LoxConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(LoxConfig::default());
    };
    let text =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    LoxConfig::from_json_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// 日志级别 → tracing 过滤级别
pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Off => LevelFilter::OFF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter(LogLevel::Warn), LevelFilter::WARN);
        assert_eq!(level_filter(LogLevel::Off), LevelFilter::OFF);
    }

    #[test]
    fn test_load_without_path() {
        let cfg = load(None).unwrap();
        assert!(!cfg.compiler.print_code);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Some(Path::new("/nonexistent/lox.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
        assert!(err.to_string().starts_with("Cannot read config '/nonexistent/lox.json': "));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_load_invalid_json() {
        let path = std::env::temp_dir().join(format!("lox-cli-bad-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ \"limits\": ").unwrap();
        let err = load(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Parse(..)));
        assert!(err.to_string().starts_with("Invalid config '"));
    }
}
