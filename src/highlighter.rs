// ABOUTME: Syntax highlighter for the REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes for
// atto syntax elements while preserving display width.

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;
use std::collections::HashSet;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_PRIMITIVE: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_BOOLEAN: &str = "\x1b[33m"; // Yellow

/// Syntax-aware color highlighting for the atto REPL. There are no
/// parentheses to balance in atto, so this is considerably smaller than a
/// Lisp highlighter — there's no bracket matching, only keyword/literal
/// classification.
pub struct AttoHelper;

impl AttoHelper {
    pub fn new() -> Self {
        AttoHelper
    }
}

impl Default for AttoHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for AttoHelper {}

impl Completer for AttoHelper {
    type Candidate = String;
}

impl Hinter for AttoHelper {
    type Hint = String;
}

impl Validator for AttoHelper {}

impl Highlighter for AttoHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let highlighted = highlight_line(line);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn keywords() -> HashSet<&'static str> {
    ["fn", "is", "if", "__import"].iter().copied().collect()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn highlight_line(line: &str) -> String {
    let keywords = keywords();
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
                result.push_str(COLOR_RESET);
            }
            '0'..='9' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let num: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&num);
                result.push_str(COLOR_RESET);
            }
            c if c.is_whitespace() => {
                result.push(c);
                i += 1;
            }
            _ => {
                let start = i;
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                if i == start {
                    result.push(chars[i]);
                    i += 1;
                    continue;
                }
                let word: String = chars[start..i].iter().collect();
                if word == "true" || word == "false" || word == "null" {
                    result.push_str(COLOR_BOOLEAN);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if keywords.contains(word.as_str()) {
                    result.push_str(COLOR_KEYWORD);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if word.starts_with("__") {
                    result.push_str(COLOR_PRIMITIVE);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_number() {
        assert!(highlight_line("42").contains(COLOR_NUMBER));
    }

    #[test]
    fn highlights_string() {
        assert!(highlight_line("\"hi\"").contains(COLOR_STRING));
    }

    #[test]
    fn highlights_keyword() {
        assert!(highlight_line("fn id x is x").contains(COLOR_KEYWORD));
    }

    #[test]
    fn highlights_primitive() {
        assert!(highlight_line("__add x 1").contains(COLOR_PRIMITIVE));
    }

    #[test]
    fn highlights_boolean_and_null() {
        assert!(highlight_line("true").contains(COLOR_BOOLEAN));
        assert!(highlight_line("null").contains(COLOR_BOOLEAN));
    }

    #[test]
    fn leaves_plain_identifiers_uncolored() {
        assert_eq!(highlight_line("helper"), "helper");
    }
}
