//! Lox CLI - Command line interface
//!
//! `lox [script]` runs a file; without a script it starts the REPL.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::{debug, info};

mod config;
mod logging;
mod platform;

use crate::logging::LogFormat;
use crate::platform::{print_error_with_source, ErrorFormat};
use lox_api::{
    compile_and_run, dump_and_interpret_in, init_config, interpret_in, LogLevel, LoxError,
    RunConfig, VM,
};

/// Command line usage error
const EX_USAGE: i32 = 64;
/// Compile error in the input
const EX_DATAERR: i32 = 65;
/// Runtime error
const EX_SOFTWARE: i32 = 70;
/// Cannot read input or write output
const EX_IOERR: i32 = 74;

#[derive(Parser)]
#[command(name = "lox", about = "Lox programming language - bytecode VM", version)]
struct Cli {
    /// Script to run; starts the REPL when omitted
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level: silent, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Print the bytecode listing before running
    #[arg(long)]
    dump_bytecode: bool,

    /// Error output format
    #[arg(long, value_enum, default_value_t = ErrorFormat::Text)]
    error_format: ErrorFormat,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { EX_USAGE } else { 0 });
        }
    };

    let file_config = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(EX_USAGE);
        }
    };

    let log_level = match cli.log_level.as_deref().map(LogLevel::parse) {
        None => None,
        Some(Some(level)) => Some(level),
        Some(None) => {
            eprintln!("Error: unknown log level '{}'", cli.log_level.unwrap_or_default());
            process::exit(EX_USAGE);
        }
    };
    let logging = file_config.logging.clone().with_level(log_level);
    if let Err(e) = logging::init_with_file(&logging, cli.log_format, cli.log_file.as_deref()) {
        eprintln!("Error: cannot initialize logging: {e}");
        process::exit(EX_IOERR);
    }

    let mut run_config = RunConfig::from_lox_config(&file_config);
    run_config.dump_bytecode = cli.dump_bytecode;
    debug!(target: "lox::cli", config = ?run_config, "configuration loaded");

    // Initialize API config (global singleton for convenience)
    let _ = init_config(run_config.clone());

    match cli.script {
        Some(path) => run_file(&path, cli.error_format),
        None => repl(&run_config, cli.error_format),
    }
}

/// Run a script file, exiting with the code matching the failure
fn run_file(path: &Path, format: ErrorFormat) {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: Cannot read script '{}': {}", path.display(), e);
            process::exit(EX_IOERR);
        }
    };

    info!(target: "lox::cli", script = %path.display(), "running script");
    if let Err(e) = compile_and_run(&source) {
        print_error_with_source(&e, &source, format);
        process::exit(exit_code(&e));
    }
}

/// Read-eval-print loop over one VM, so globals persist between lines
fn repl(config: &RunConfig, format: ErrorFormat) {
    let mut vm = VM::with_config(config.vm_config());
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            process::exit(EX_IOERR);
        }

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(EX_IOERR);
            }
        }

        let result = if config.dump_bytecode {
            dump_and_interpret_in(&mut vm, &line)
        } else {
            interpret_in(&mut vm, &line)
        };
        match result {
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => {}
            Err(e) => print_error_with_source(&e, &line, format),
        }
    }
}

fn exit_code(e: &LoxError) -> i32 {
    match e {
        LoxError::Compile(_) => EX_DATAERR,
        LoxError::Runtime(_) => EX_SOFTWARE,
    }
}
