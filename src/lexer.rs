// ABOUTME: Hand-rolled state-machine lexer, mirroring the reference FSM

use crate::error::LexError;
use crate::token::{PrimOp, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Default,
    Number,
    String,
    Ident,
}

struct Cursor<'a> {
    chars: std::str::CharIndices<'a>,
    peeked: Option<(usize, char)>,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, start_line: usize, start_col: usize) -> Self {
        Cursor {
            chars: src.char_indices(),
            peeked: None,
            line: start_line,
            col: start_col,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.peeked.take().or_else(|| self.chars.next());
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        next
    }

    fn peek(&mut self) -> Option<char> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked.map(|(_, c)| c)
    }
}

fn classify_ident(lexeme: &str) -> TokenKind {
    match lexeme {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "fn" => TokenKind::Fn,
        "is" => TokenKind::Is,
        "if" => TokenKind::If,
        "__import" => TokenKind::Import,
        _ => match PrimOp::from_lexeme(lexeme) {
            Some(op) => TokenKind::Prim(op),
            None => TokenKind::Ident(lexeme.to_string()),
        },
    }
}

/// Lex `src` into a token stream, starting position tracking at
/// `(start_line, start_col)`. Used both for a fresh module (1, 1) and for
/// incrementally re-lexing an appended REPL suffix.
pub fn lex(
    module: &str,
    src: &str,
    start_line: usize,
    start_col: usize,
) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut cursor = Cursor::new(src, start_line, start_col);
    let mut state = State::Default;
    let mut buf = String::new();
    let mut tok_line = start_line;
    let mut tok_col = start_col;

    loop {
        let mark_line = cursor.line;
        let mark_col = cursor.col;
        match state {
            State::Default => {
                let Some((_, c)) = cursor.bump() else { break };
                if c.is_whitespace() {
                    continue;
                }
                if c.is_ascii_digit() {
                    tok_line = mark_line;
                    tok_col = mark_col;
                    buf.clear();
                    buf.push(c);
                    state = State::Number;
                } else if c == '"' {
                    tok_line = mark_line;
                    tok_col = mark_col;
                    buf.clear();
                    state = State::String;
                } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    tok_line = mark_line;
                    tok_col = mark_col;
                    buf.clear();
                    buf.push(c);
                    state = State::Ident;
                } else {
                    return Err(LexError {
                        module: module.to_string(),
                        line: mark_line,
                        col: mark_col,
                        message: format!("unexpected character '{c}'"),
                    });
                }
            }
            // Integer literals only — a `.` is a lex error here, not the
            // start of a fraction (see DESIGN.md on the dropped-decimals
            // open question).
            State::Number => match cursor.peek() {
                Some(c) if c.is_ascii_digit() => {
                    buf.push(c);
                    cursor.bump();
                }
                Some(c) if !c.is_whitespace() => {
                    return Err(LexError {
                        module: module.to_string(),
                        line: cursor.line,
                        col: cursor.col,
                        message: format!("unexpected character '{c}' in number literal"),
                    });
                }
                _ => {
                    let value: f64 = buf.parse().map_err(|_| LexError {
                        module: module.to_string(),
                        line: tok_line,
                        col: tok_col,
                        message: format!("malformed number literal '{buf}'"),
                    })?;
                    tokens.push(Token::new(TokenKind::Num(value), buf.clone(), tok_line, tok_col));
                    state = State::Default;
                }
            },
            State::String => match cursor.bump() {
                None => {
                    return Err(LexError {
                        module: module.to_string(),
                        line: tok_line,
                        col: tok_col,
                        message: "unterminated string literal".to_string(),
                    });
                }
                Some((_, '"')) => {
                    tokens.push(Token::new(
                        TokenKind::StrLit(buf.clone()),
                        buf.clone(),
                        tok_line,
                        tok_col,
                    ));
                    state = State::Default;
                }
                Some((_, '\\')) => match cursor.bump() {
                    Some((_, 'n')) => buf.push('\n'),
                    Some((_, other)) => {
                        return Err(LexError {
                            module: module.to_string(),
                            line: cursor.line,
                            col: cursor.col,
                            message: format!("unsupported escape sequence '\\{other}'"),
                        });
                    }
                    None => {
                        return Err(LexError {
                            module: module.to_string(),
                            line: tok_line,
                            col: tok_col,
                            message: "unterminated string literal".to_string(),
                        });
                    }
                },
                Some((_, '\0')) => {
                    return Err(LexError {
                        module: module.to_string(),
                        line: cursor.line,
                        col: cursor.col,
                        message: "null byte in string literal".to_string(),
                    });
                }
                Some((_, c)) => buf.push(c),
            },
            State::Ident => match cursor.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '-' => {
                    buf.push(c);
                    cursor.bump();
                }
                Some(c) if !c.is_whitespace() && !is_terminator(c) => {
                    return Err(LexError {
                        module: module.to_string(),
                        line: cursor.line,
                        col: cursor.col,
                        message: format!("invalid character '{c}' in identifier"),
                    });
                }
                _ => {
                    tokens.push(Token::new(classify_ident(&buf), buf.clone(), tok_line, tok_col));
                    state = State::Default;
                }
            },
        }
    }

    match state {
        State::Default => {}
        State::Number => {
            let value: f64 = buf.parse().map_err(|_| LexError {
                module: module.to_string(),
                line: tok_line,
                col: tok_col,
                message: format!("malformed number literal '{buf}'"),
            })?;
            tokens.push(Token::new(TokenKind::Num(value), buf, tok_line, tok_col));
        }
        State::Ident => {
            tokens.push(Token::new(classify_ident(&buf), buf, tok_line, tok_col));
        }
        State::String => {
            return Err(LexError {
                module: module.to_string(),
                line: tok_line,
                col: tok_col,
                message: "unterminated string literal".to_string(),
            });
        }
    }

    tokens.push(Token::new(TokenKind::Eof, "", cursor.line, cursor.col));
    Ok(tokens)
}

fn is_terminator(c: char) -> bool {
    // Identifiers/numbers end at whitespace or the start of the next token;
    // none of atto's punctuation overlaps with alnum/_/- so nothing else
    // needs to be special-cased here.
    c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex("test", src, 1, 1)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_primitives() {
        assert_eq!(
            kinds("fn is if __import __add"),
            vec![
                TokenKind::Fn,
                TokenKind::Is,
                TokenKind::If,
                TokenKind::Import,
                TokenKind::Prim(PrimOp::Add),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_number_literal() {
        assert_eq!(
            kinds("42"),
            vec![TokenKind::Num(42.0), TokenKind::Eof]
        );
    }

    #[test]
    fn rejects_decimal_point_in_number() {
        let err = lex("test", "3.5", 1, 1).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.col, 2);
    }

    #[test]
    fn rejects_number_starting_with_dot() {
        let err = lex("test", ".5", 1, 1).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.col, 1);
    }

    #[test]
    fn lexes_string_with_escapes() {
        assert_eq!(
            kinds("\"a\\nb\""),
            vec![TokenKind::StrLit("a\nb".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(lex("test", "\"abc", 1, 1).is_err());
    }

    #[test]
    fn treats_crlf_as_single_newline() {
        let toks = lex("test", "a\r\nb", 1, 1).unwrap();
        let b_tok = toks.iter().find(|t| t.lexeme == "b").unwrap();
        assert_eq!(b_tok.line, 2);
        assert_eq!(b_tok.col, 1);
    }

    #[test]
    fn identifiers_allow_underscore_and_hyphen() {
        assert_eq!(
            kinds("my-fn_2"),
            vec![TokenKind::Ident("my-fn_2".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn incremental_lex_resumes_position() {
        let first = lex("test", "fn is", 1, 1).unwrap();
        let eof = first.last().unwrap();
        let second = lex("test", " x", eof.line, eof.col).unwrap();
        assert_eq!(second[0].col, 7);
    }

    #[test]
    fn null_byte_in_string_is_rejected() {
        let src = "\"a\0b\"";
        assert!(lex("test", src, 1, 1).is_err());
    }

    #[test]
    fn incremental_lex_matches_lexing_the_whole_thing_at_once() {
        let a = "fn add a b is __add a b\n";
        let b = "fn main is add 1 2";
        let whole = lex("test", &format!("{a}{b}"), 1, 1).unwrap();

        let first = lex("test", a, 1, 1).unwrap();
        let eof = first.last().unwrap();
        let second = lex("test", b, eof.line, eof.col).unwrap();

        let mut combined = first;
        combined.pop();
        combined.extend(second);

        assert_eq!(whole, combined);
    }
}
