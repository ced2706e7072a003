//! API 层配置
//!
//! 包含执行配置 RunConfig 和全局单例（供 CLI 使用）

use lox_config::{CompilerConfig, LimitConfig, LoxConfig};
use lox_core::VMConfig;
use once_cell::sync::OnceCell;

/// Execution configuration
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Whether to dump bytecode before execution
    pub dump_bytecode: bool,
    /// Capture `print` output into `ExecuteOutput::stdout` instead of writing to stdout
    pub capture_output: bool,
    /// Compiler configuration
    pub compiler: CompilerConfig,
    /// Execution limits
    pub limits: LimitConfig,
}

impl RunConfig {
    /// 从文件配置构建
    pub fn from_lox_config(config: &LoxConfig) -> Self {
        Self {
            compiler: config.compiler.clone(),
            limits: config.limits.clone(),
            ..Self::default()
        }
    }

    /// 捕获输出的配置（测试、嵌入场景）
    pub fn capturing() -> Self {
        Self {
            capture_output: true,
            ..Self::default()
        }
    }

    pub fn vm_config(&self) -> VMConfig {
        VMConfig {
            compiler: self.compiler.clone(),
            limits: self.limits.clone(),
        }
    }
}

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// Initialize global configuration
///
/// Returns the rejected config if one was already installed.
pub fn init(config: RunConfig) -> Result<(), RunConfig> {
    GLOBAL_CONFIG.set(config)
}

/// Get global config, installing the default on first use
pub fn config() -> &'static RunConfig {
    GLOBAL_CONFIG.get_or_init(RunConfig::default)
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}
