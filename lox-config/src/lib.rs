//! Lox Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Lox crates.

use serde::Deserialize;

/// Maximum call depth of the VM
pub const DEFAULT_FRAMES_MAX: usize = 64;

/// Operand stack capacity: one full byte-addressable window per frame
pub const DEFAULT_STACK_MAX: usize = DEFAULT_FRAMES_MAX * 256;

/// Configuration for compiler behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Log the disassembly of every compiled function
    pub print_code: bool,
}

/// Configuration for execution limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum operand stack size (number of values)
    pub stack_max: usize,
    /// Maximum number of nested call frames
    pub frames_max: usize,
}

/// Log level, ordered from most to least verbose
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// No output at all
    #[serde(alias = "silent")]
    Off,
}

impl LogLevel {
    /// Parse a level name; "silent" is accepted as an alias of "off"
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "off" | "silent" => Some(LogLevel::Off),
            _ => None,
        }
    }
}

/// Execution phase enum for phase-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Scanner,
    Compiler,
    Vm,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Scanner => "scanner",
            Phase::Compiler => "compiler",
            Phase::Vm => "vm",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("lox::{}", self.as_str())
    }
}

/// Logging configuration: a global level plus optional per-phase overrides
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub scanner: Option<LogLevel>,
    pub compiler: Option<LogLevel>,
    pub vm: Option<LogLevel>,
}

impl LoggingConfig {
    /// Effective level for a phase
    pub fn level_for(&self, phase: Phase) -> LogLevel {
        let specific = match phase {
            Phase::Scanner => self.scanner,
            Phase::Compiler => self.compiler,
            Phase::Vm => self.vm,
        };
        specific.unwrap_or(self.level)
    }

    /// Replace the global level, keeping per-phase overrides
    pub fn with_level(mut self, level: Option<LogLevel>) -> Self {
        if let Some(level) = level {
            self.level = level;
        }
        self
    }
}

/// Top-level configuration, as read from a JSON config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoxConfig {
    pub compiler: CompilerConfig,
    pub limits: LimitConfig,
    pub logging: LoggingConfig,
}

impl LoxConfig {
    /// Parse configuration from JSON text; missing fields take their defaults
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { print_code: false }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            stack_max: DEFAULT_STACK_MAX,
            frames_max: DEFAULT_FRAMES_MAX,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            scanner: None,
            compiler: None,
            vm: None,
        }
    }
}
