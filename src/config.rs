// ABOUTME: Version/banner constants and default settings for the CLI and REPL

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "atto v0.1.0";
pub const WELCOME_SUBTITLE: &str = "A tiny prefix-notation functional language";

pub const DEFAULT_HISTORY_FILE: &str = ".atto_history";

/// The bundled `__core__` module, loaded before any user module unless
/// `--no-core` is passed.
pub const CORE_SOURCE: &str = include_str!("stdlib/core.at");

#[allow(dead_code)]
pub const HELP_TEXT: &str = r#"
Usage:
  atto               start the REPL
  atto FILE           run FILE as the __main__ module, calling main()
  atto -h | --help    show this message

REPL commands:
  quit()              exit the REPL

Type any atto expression to evaluate it.
"#;
