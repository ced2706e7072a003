//! Lox API - Execution orchestration layer
//!
//! Provides unified execution interface, including:
//! - Execution flow orchestration
//! - Configuration abstraction (RunConfig)
//! - Unified error handling (LoxError)
//!
//! For CLI convenience, this crate provides a global singleton API.
//! For library use, prefer the explicit `run(source, &config)` API.

use tracing::{debug, info};

use lox_core::{disassemble_function, InterpretResult};

// Re-export config
pub mod config;
pub use config::{config as get_config, init as init_config, is_initialized, RunConfig};

// Re-export config types from lox_config
pub use lox_config::{CompilerConfig, LimitConfig, LogLevel, LoggingConfig, LoxConfig, Phase};

// Re-export error and types
pub mod error;
pub mod types;
pub use error::{CompileError, ErrorReport, LoxError, RuntimeError};
pub use types::{CompileOutput, ExecuteOutput};

// Re-export core types
pub use lox_config;
pub use lox_core::{Heap, SharedOutput, VMConfig, Value, VM};

/// Execute with explicit configuration
///
/// This is the recommended API for library users. Every call runs in a fresh VM.
pub fn run(source: &str, config: &RunConfig) -> Result<ExecuteOutput, LoxError> {
    info!(target: "lox::vm", "Starting execution");

    let captured = SharedOutput::new();
    let mut vm = VM::with_config(config.vm_config());
    if config.capture_output {
        vm = vm.with_output(captured.clone());
    }

    let mut stdout = String::new();
    let value = if config.dump_bytecode {
        let function = vm.compile(source)?;
        let listing = disassemble_function(vm.heap(), function);
        if config.capture_output {
            stdout.push_str(&listing);
        } else {
            print!("{listing}");
        }
        let result = vm.run_function(function);
        finish(&mut vm, result)?
    } else {
        interpret_in(&mut vm, source)?
    };
    stdout.push_str(&captured.take());

    info!(target: "lox::vm", "Execution completed");
    Ok(ExecuteOutput { value, stdout })
}

/// Interpret in an existing VM, keeping its globals
///
/// The operand stack is reset after a runtime error so the VM stays usable.
/// Returns the rendered script return value, None when it is nil.
pub fn interpret_in(vm: &mut VM, source: &str) -> Result<Option<String>, LoxError> {
    let result = vm.interpret(source);
    finish(vm, result)
}

/// Like [`interpret_in`], printing the bytecode listing between compile and run
pub fn dump_and_interpret_in(vm: &mut VM, source: &str) -> Result<Option<String>, LoxError> {
    let function = vm.compile(source)?;
    print!("{}", disassemble_function(vm.heap(), function));
    let result = vm.run_function(function);
    finish(vm, result)
}

fn finish(vm: &mut VM, result: InterpretResult) -> Result<Option<String>, LoxError> {
    match result {
        InterpretResult::Ok => {
            let value = vm.last_value();
            Ok((value != Value::Nil).then(|| vm.display(value)))
        }
        InterpretResult::CompileError(e) => Err(e.into()),
        InterpretResult::RuntimeError(e) => {
            vm.reset_stack();
            Err(e.into())
        }
    }
}

/// Compile with explicit configuration
pub fn compile_with_config(source: &str, config: &RunConfig) -> Result<CompileOutput, LoxError> {
    let mut heap = Heap::new();
    let function = lox_core::compile_with_config(source, &mut heap, &config.compiler)?;

    debug!(
        target: "lox::compiler",
        objects = heap.object_count(),
        code_bytes = heap.function(function).map(|f| f.chunk.len()).unwrap_or(0),
        "compilation completed"
    );

    Ok(CompileOutput { heap, function })
}

// ==================== Global config API ====================

/// Compile source code (uses global config)
pub fn compile(source: &str) -> Result<CompileOutput, LoxError> {
    compile_with_config(source, get_config())
}

/// Compile and run (uses global config)
pub fn compile_and_run(source: &str) -> Result<ExecuteOutput, LoxError> {
    run(source, get_config())
}

/// Quick run with default config (auto-initializes if needed)
pub fn quick_run(source: &str) -> Result<ExecuteOutput, LoxError> {
    if !is_initialized() {
        let _ = init_config(RunConfig::default());
    }
    compile_and_run(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lox_core::RuntimeErrorKind;

    #[test]
    fn test_run_with_explicit_config() {
        let result = run("return 42;", &RunConfig::capturing()).unwrap();
        assert_eq!(result.value.as_deref(), Some("42"));
        assert_eq!(result.stdout, "");
    }

    #[test]
    fn test_run_captures_print() {
        let result = run(r#"print "hi"; print 1 + 2;"#, &RunConfig::capturing()).unwrap();
        assert_eq!(result.stdout, "hi\n3\n");
        assert_eq!(result.value, None);
    }

    #[test]
    fn test_run_compile_error() {
        let err = run("print ;", &RunConfig::capturing()).unwrap_err();
        assert_eq!(err.phase(), "compile");
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_run_runtime_error() {
        let err = run("var a;\nreturn -a;", &RunConfig::capturing()).unwrap_err();
        match &err {
            LoxError::Runtime(e) => assert_eq!(e.kind, RuntimeErrorKind::OperandMustBeNumber),
            other => panic!("expected runtime error, got {other:?}"),
        }
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_run_respects_frame_limit() {
        let mut config = RunConfig::capturing();
        config.limits.frames_max = 4;
        let source = "fun f(n) { if (n == 0) return 0; return f(n - 1); } return f(10);";
        let err = run(source, &config).unwrap_err();
        assert_eq!(err.to_report().error_kind, "StackOverflow");
        assert!(run(source, &RunConfig::capturing()).is_ok());
    }

    #[test]
    fn test_dump_bytecode_is_captured() {
        let mut config = RunConfig::capturing();
        config.dump_bytecode = true;
        let result = run("print 1;", &config).unwrap();
        assert!(result.stdout.starts_with("== <script> ==\n"));
        assert_eq!(result.stdout.matches("== <script> ==").count(), 1);
        assert!(result.stdout.contains("OP_PRINT"));
        assert!(result.stdout.ends_with("1\n"));
    }

    #[test]
    fn test_compile_output_disassembles_nested_functions() {
        let output = compile_with_config("fun f() { return 1; }", &RunConfig::default()).unwrap();
        let listing = output.disassemble();
        assert!(listing.starts_with("== <script> ==\n"));
        assert!(listing.contains("== <fn f> =="));
        assert_eq!(output.script().map(|s| s.arity), Some(0));
    }

    #[test]
    fn test_dump_and_interpret_in_keeps_globals() {
        let mut vm = VM::new();
        assert_eq!(dump_and_interpret_in(&mut vm, "var a = 1;"), Ok(None));
        assert_eq!(dump_and_interpret_in(&mut vm, "return a + 1;"), Ok(Some("2".to_string())));
        assert!(matches!(dump_and_interpret_in(&mut vm, "print ;"), Err(LoxError::Compile(_))));
    }

    #[test]
    fn test_interpret_in_keeps_globals() {
        let out = SharedOutput::new();
        let mut vm = VM::new().with_output(out.clone());
        assert_eq!(interpret_in(&mut vm, "var a = 1;"), Ok(None));
        assert!(interpret_in(&mut vm, "a + nil;").is_err());
        assert_eq!(vm.stack_len(), 0);
        assert_eq!(interpret_in(&mut vm, "print a; return a + 1;"), Ok(Some("2".to_string())));
        assert_eq!(out.contents(), "1\n");
    }

    #[test]
    fn test_quick_run() {
        let result = quick_run("return 42;");
        assert!(result.is_ok());
    }
}
