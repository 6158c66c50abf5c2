mod ast;
mod config;
mod error;
mod eval;
mod highlighter;
mod lexer;
mod module;
mod parser;
mod token;
mod value;

use clap::Parser as ClapParser;
use config::{DEFAULT_HISTORY_FILE, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use error::AttoError;
use eval::{eval_call, StdIo};
use highlighter::AttoHelper;
use module::{FsModuleLoader, ModuleId, ModuleRegistry, CORE_MODULE, MAIN_MODULE};
use parser::{append_and_parse, load_and_parse};
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use value::Value;

/// A tiny prefix-notation functional language interpreter.
#[derive(ClapParser, Debug)]
#[command(name = "atto")]
#[command(version = config::VERSION)]
#[command(about = "A tiny prefix-notation functional language interpreter")]
struct CliArgs {
    /// Source file to run as __main__ (omit to start the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Skip loading the bundled __core__ standard library module
    #[arg(long = "no-core")]
    no_core: bool,

    /// Override the REPL history file path
    #[arg(long = "history", value_name = "FILE")]
    history: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let loader = FsModuleLoader;

    let mut registry = ModuleRegistry::new();
    if !args.no_core {
        load_and_parse(
            &mut registry,
            CORE_MODULE,
            None,
            config::CORE_SOURCE.to_string(),
            &loader,
        )
        .map_err(|e| format!("Failed to load {CORE_MODULE}: {e}"))?;
    }

    if let Some(script_path) = args.script {
        return run_script(&mut registry, &script_path, &loader);
    }

    run_repl(&mut registry, &loader, args.history)
}

/// Run `path` as the `__main__` module and call `main()`, mapping the
/// result to a process exit code per §6.
fn run_script(
    registry: &mut ModuleRegistry,
    path: &PathBuf,
    loader: &FsModuleLoader,
) -> Result<(), Box<dyn std::error::Error>> {
    let code = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {e}", path.display()))?;

    let id = load_and_parse(
        registry,
        MAIN_MODULE,
        Some(path.clone()),
        code,
        loader,
    )
    .map_err(|e| render_error(registry, &e))?;

    let mut io = StdIo;
    let result = eval_call(registry, id, "main", &[], &mut io)
        .map_err(|e| render_error(registry, &e))?;

    std::process::exit(exit_code(&result));
}

fn exit_code(v: &Value) -> i32 {
    match v {
        Value::Num(n) => *n as i32,
        Value::Bool(b) => {
            if *b {
                1
            } else {
                0
            }
        }
        Value::Str(s) => s.len() as i32,
        Value::Null | Value::List(_) => 0,
    }
}

fn run_repl(
    registry: &mut ModuleRegistry,
    loader: &FsModuleLoader,
    history_override: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let main_id = load_and_parse(registry, MAIN_MODULE, None, String::new(), loader)
        .map_err(|e| render_error(registry, &e))?;

    let config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(config)
        .map_err(|e| format!("failed to initialize REPL: {e}"))?;
    rl.set_helper(Some(AttoHelper::new()));

    let history_file = history_override.unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_FILE));
    let _ = rl.load_history(&history_file);

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");

    let mut io = StdIo;
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if line.trim() == "quit()" {
                    break;
                }
                match eval_repl_line(registry, main_id, &line, loader, &mut io) {
                    Ok(Some(value)) => println!("=> {value}"),
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", render_error(registry, &e)),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&history_file);
    Ok(())
}

/// Append one REPL line to `__main__` and re-parse incrementally. A line
/// that is itself a declaration (`fn ...` or `__import ...`) is appended
/// verbatim and not evaluated — it just grows `__main__`'s function table
/// for later lines to call. Anything else is a bare expression, which has
/// no place in the declaration-only top level, so it's wrapped in a
/// synthetic nullary function and evaluated immediately.
fn eval_repl_line(
    registry: &mut ModuleRegistry,
    main_id: ModuleId,
    line: &str,
    loader: &FsModuleLoader,
    io: &mut StdIo,
) -> Result<Option<Value>, AttoError> {
    let trimmed = line.trim();
    if trimmed.starts_with("fn ") || trimmed.starts_with("__import") {
        append_and_parse(registry, main_id, &format!("\n{trimmed}\n"), loader)?;
        return Ok(None);
    }

    let ordinal = registry.get(main_id).functions.len();
    let fn_name = format!("__repl_{ordinal}");
    append_and_parse(registry, main_id, &format!("\nfn {fn_name} is {trimmed}\n"), loader)?;
    eval_call(registry, main_id, &fn_name, &[], io).map(Some)
}

/// Render a structured `AttoError` as `kind: message\n<source line>\n<caret>`,
/// the way the reference driver prints diagnostics — this formatting lives
/// in the host, never in the core, per §7.
fn render_error(registry: &ModuleRegistry, err: &AttoError) -> String {
    let (module_name, line, col, message) = match err {
        AttoError::Lex(e) => (e.module.clone(), Some(e.line), Some(e.col), e.to_string()),
        AttoError::Parse(e) => (e.module.clone(), Some(e.line), Some(e.col), e.to_string()),
        AttoError::Syntax(e) => (e.module.clone(), None, None, e.to_string()),
        AttoError::FileIO(e) => (e.path.clone(), None, None, e.to_string()),
        AttoError::Runtime(e) => (e.function.clone(), None, None, e.to_string()),
    };

    let Some(line_no) = line else {
        return message;
    };
    let col_no = col.unwrap_or(1);

    let source_line = registry
        .id_by_name(&module_name)
        .and_then(|id| registry.get(id).code.lines().nth(line_no.saturating_sub(1)))
        .unwrap_or("");
    let caret = " ".repeat(col_no.saturating_sub(1)) + "^";
    format!("{message}\n{source_line}\n{caret}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_truncates_numbers() {
        assert_eq!(exit_code(&Value::Num(3.7)), 3);
    }

    #[test]
    fn exit_code_maps_bool_to_one_or_zero() {
        assert_eq!(exit_code(&Value::Bool(true)), 1);
        assert_eq!(exit_code(&Value::Bool(false)), 0);
    }

    #[test]
    fn exit_code_maps_null_and_list_to_zero() {
        assert_eq!(exit_code(&Value::Null), 0);
        assert_eq!(exit_code(&Value::List(vec![Value::Num(1.0)])), 0);
    }

    #[test]
    fn exit_code_maps_string_to_its_length() {
        assert_eq!(exit_code(&Value::Str("abc".to_string())), 3);
    }
}
