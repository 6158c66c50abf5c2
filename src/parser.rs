// ABOUTME: Two-pass parser: declaration scan, then per-function body parse

use std::collections::HashMap;
use std::path::Path;

use crate::ast::{Function, Node};
use crate::error::{AttoError, ParseError};
use crate::lexer::lex;
use crate::module::{Module, ModuleId, ModuleLoader, ModuleRegistry, CORE_MODULE};
use crate::token::{PrimOp, Token, TokenKind};
use crate::value::Value;

/// A function header collected during the declaration scan: name, formal
/// parameters, and the `[start, end)` token range of its body. Bodies are
/// parsed in a second pass, once every signature in the module (and every
/// imported module, recursively) is known — `fn`/`__import` never appear
/// inside a body, so the scan can find a body's extent by simply looking
/// for the next one, with no expression parsing at all.
struct Signature {
    name: String,
    params: Vec<String>,
    body: (usize, usize),
}

/// Lex `code`, register it as a new module named `name`, and fully parse
/// it (recursively parsing any `__import`ed module along the way). This is
/// the single entry point the host uses for both `__core__`/`__main__` and
/// every import.
pub fn load_and_parse(
    registry: &mut ModuleRegistry,
    name: &str,
    path: Option<std::path::PathBuf>,
    code: String,
    loader: &dyn ModuleLoader,
) -> Result<ModuleId, AttoError> {
    let tokens = lex(name, &code, 1, 1)?;
    let mut module = Module::new(name, path, code);
    module.tokens = tokens;
    let id = registry.register(module);
    parse_registered(registry, id, loader)?;
    Ok(id)
}

/// Re-lex only the appended suffix of an already-parsed module and
/// re-parse it, for the REPL's incremental top-level evaluation.
pub fn append_and_parse(
    registry: &mut ModuleRegistry,
    id: ModuleId,
    code_suffix: &str,
    loader: &dyn ModuleLoader,
) -> Result<(), AttoError> {
    let (name, last_line, last_col) = {
        let module = registry.get(id);
        let (line, col) = module
            .tokens
            .last()
            .map(|t| (t.line, t.col))
            .unwrap_or((1, 1));
        (module.name.clone(), line, col)
    };
    let new_tokens = lex(&name, code_suffix, last_line, last_col)?;
    {
        let module = registry.get_mut(id);
        module.code.push_str(code_suffix);
        // Drop the previous Eof sentinel before appending the new slice.
        module.tokens.pop();
        module.tokens.extend(new_tokens);
    }
    parse_registered(registry, id, loader)
}

fn parse_err(module: &str, tok: &Token, message: impl Into<String>) -> AttoError {
    AttoError::Parse(ParseError {
        module: module.to_string(),
        line: tok.line,
        col: tok.col,
        message: message.into(),
    })
}

/// Run the declaration scan and body pass over an already-lexed,
/// already-registered module.
pub fn parse_registered(
    registry: &mut ModuleRegistry,
    id: ModuleId,
    loader: &dyn ModuleLoader,
) -> Result<(), AttoError> {
    let module_name = registry.get(id).name.clone();
    let tokens = registry.get(id).tokens.clone();

    let mut pos = 0usize;
    let mut sigs: Vec<Signature> = Vec::new();
    let mut imports: Vec<ModuleId> = Vec::new();

    while pos < tokens.len() && !matches!(tokens[pos].kind, TokenKind::Eof) {
        match &tokens[pos].kind {
            TokenKind::Import => {
                pos += 1;
                let path_str = match tokens.get(pos).map(|t| &t.kind) {
                    Some(TokenKind::StrLit(s)) => s.clone(),
                    _ => {
                        return Err(parse_err(
                            &module_name,
                            &tokens[pos.min(tokens.len() - 1)],
                            "expected a string literal after __import",
                        ))
                    }
                };
                pos += 1;
                let imported_id = registry.import(id, Path::new(&path_str), loader)?;
                if !registry.get(imported_id).parsed {
                    parse_registered(registry, imported_id, loader)?;
                }
                imports.push(imported_id);
            }
            TokenKind::Fn => {
                pos += 1;
                let name = match tokens.get(pos).map(|t| &t.kind) {
                    Some(TokenKind::Ident(n)) => n.clone(),
                    _ => {
                        return Err(parse_err(
                            &module_name,
                            &tokens[pos.min(tokens.len() - 1)],
                            "expected a function name after 'fn'",
                        ))
                    }
                };
                pos += 1;
                let mut params = Vec::new();
                while let Some(TokenKind::Ident(p)) = tokens.get(pos).map(|t| &t.kind) {
                    params.push(p.clone());
                    pos += 1;
                }
                match tokens.get(pos).map(|t| &t.kind) {
                    Some(TokenKind::Is) => pos += 1,
                    _ => {
                        return Err(parse_err(
                            &module_name,
                            &tokens[pos.min(tokens.len() - 1)],
                            "expected 'is' after function parameters",
                        ))
                    }
                }
                let body_start = pos;
                while pos < tokens.len()
                    && !matches!(
                        tokens[pos].kind,
                        TokenKind::Fn | TokenKind::Import | TokenKind::Eof
                    )
                {
                    pos += 1;
                }
                sigs.push(Signature {
                    name,
                    params,
                    body: (body_start, pos),
                });
            }
            other => {
                return Err(parse_err(
                    &module_name,
                    &tokens[pos],
                    format!("expected 'fn' or '__import', found {other:?}"),
                ))
            }
        }
    }

    let core_id = registry.id_by_name(CORE_MODULE).filter(|c| *c != id);

    let mut functions = HashMap::with_capacity(sigs.len());
    for sig in &sigs {
        let mut cursor = sig.body.0;
        let body = parse_block(
            &tokens,
            &mut cursor,
            sig.body.1,
            &module_name,
            &sig.params,
            &sigs,
            id,
            core_id,
            &imports,
            registry,
        )?;
        functions.insert(
            sig.name.clone(),
            Function {
                name: sig.name.clone(),
                params: sig.params.clone(),
                body,
                owner: id,
            },
        );
    }

    let module = registry.get_mut(id);
    module.imports = imports;
    module.functions = functions;
    module.parsed = true;
    Ok(())
}

/// Parse every expression in `[pos, end)` as a body: one or more top-level
/// expressions, evaluated in order with only the last one's value used
/// (`eval_call` keeps re-assigning its result as it walks the returned Vec).
#[allow(clippy::too_many_arguments)]
fn parse_block(
    tokens: &[Token],
    pos: &mut usize,
    end: usize,
    module_name: &str,
    params: &[String],
    sigs: &[Signature],
    self_id: ModuleId,
    core_id: Option<ModuleId>,
    imports: &[ModuleId],
    registry: &ModuleRegistry,
) -> Result<Vec<Node>, AttoError> {
    let mut nodes = Vec::new();
    while *pos < end {
        nodes.push(parse_expr(
            tokens, pos, end, module_name, params, sigs, self_id, core_id, imports, registry,
        )?);
    }
    Ok(nodes)
}

/// Look up `name` in resolution order: this function's own signatures
/// (including forward references within the same module), then
/// `__core__`, then each import in declared order. Returns the owning
/// module and the arity (parameter count) to parse as call arguments.
fn resolve_call(
    name: &str,
    sigs: &[Signature],
    self_id: ModuleId,
    core_id: Option<ModuleId>,
    imports: &[ModuleId],
    registry: &ModuleRegistry,
) -> Option<(ModuleId, usize)> {
    if let Some(sig) = sigs.iter().find(|s| s.name == name) {
        return Some((self_id, sig.params.len()));
    }
    if let Some(core) = core_id {
        if let Some(f) = registry.get(core).functions.get(name) {
            return Some((core, f.params.len()));
        }
    }
    for imported in imports {
        if let Some(f) = registry.get(*imported).functions.get(name) {
            return Some((*imported, f.params.len()));
        }
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn parse_expr(
    tokens: &[Token],
    pos: &mut usize,
    end: usize,
    module_name: &str,
    params: &[String],
    sigs: &[Signature],
    self_id: ModuleId,
    core_id: Option<ModuleId>,
    imports: &[ModuleId],
    registry: &ModuleRegistry,
) -> Result<Node, AttoError> {
    if *pos >= end {
        let tok = tokens.get(*pos).unwrap_or_else(|| tokens.last().unwrap());
        return Err(parse_err(module_name, tok, "unexpected end of expression"));
    }
    let tok = tokens[*pos].clone();
    match tok.kind {
        TokenKind::True => {
            *pos += 1;
            Ok(Node::Value(Value::Bool(true)))
        }
        TokenKind::False => {
            *pos += 1;
            Ok(Node::Value(Value::Bool(false)))
        }
        TokenKind::Null => {
            *pos += 1;
            Ok(Node::Value(Value::Null))
        }
        TokenKind::Num(n) => {
            *pos += 1;
            Ok(Node::Value(Value::Num(n)))
        }
        TokenKind::StrLit(s) => {
            *pos += 1;
            Ok(Node::Value(Value::Str(s)))
        }
        TokenKind::If => {
            *pos += 1;
            let cond = parse_expr(
                tokens, pos, end, module_name, params, sigs, self_id, core_id, imports, registry,
            )?;
            let then = parse_expr(
                tokens, pos, end, module_name, params, sigs, self_id, core_id, imports, registry,
            )?;
            let els = parse_expr(
                tokens, pos, end, module_name, params, sigs, self_id, core_id, imports, registry,
            )?;
            Ok(Node::If {
                cond: Box::new(cond),
                then: Box::new(then),
                els: Box::new(els),
            })
        }
        TokenKind::Prim(op) => {
            *pos += 1;
            let mut children = Vec::with_capacity(op.arity());
            for _ in 0..op.arity() {
                children.push(parse_expr(
                    tokens, pos, end, module_name, params, sigs, self_id, core_id, imports,
                    registry,
                )?);
            }
            Ok(Node::Prim(op, children))
        }
        TokenKind::Ident(name) => {
            *pos += 1;
            if let Some(idx) = params.iter().position(|p| *p == name) {
                return Ok(Node::Ident(idx));
            }
            match resolve_call(&name, sigs, self_id, core_id, imports, registry) {
                Some((owner, arity)) => {
                    let mut args = Vec::with_capacity(arity);
                    for _ in 0..arity {
                        args.push(parse_expr(
                            tokens, pos, end, module_name, params, sigs, self_id, core_id,
                            imports, registry,
                        )?);
                    }
                    Ok(Node::Call {
                        module: owner,
                        name,
                        args,
                    })
                }
                None => Err(parse_err(
                    module_name,
                    &tok,
                    format!("undefined name '{name}'"),
                )),
            }
        }
        other => Err(parse_err(
            module_name,
            &tok,
            format!("unexpected token {other:?} in expression position"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::FsModuleLoader;

    fn parse_source(src: &str) -> (ModuleRegistry, ModuleId) {
        let mut registry = ModuleRegistry::new();
        let loader = FsModuleLoader;
        let id = load_and_parse(&mut registry, "__main__", None, src.to_string(), &loader)
            .expect("parse failed");
        (registry, id)
    }

    #[test]
    fn parses_identity_function() {
        let (registry, id) = parse_source("fn id x is x");
        let f = registry.get(id).functions.get("id").unwrap();
        assert_eq!(f.params, vec!["x".to_string()]);
        assert_eq!(f.body, vec![Node::Ident(0)]);
    }

    #[test]
    fn parses_primitive_application() {
        let (registry, id) = parse_source("fn inc x is __add x 1");
        let f = registry.get(id).functions.get("inc").unwrap();
        assert_eq!(
            f.body,
            vec![Node::Prim(
                PrimOp::Add,
                vec![Node::Ident(0), Node::Value(Value::Num(1.0))]
            )]
        );
    }

    #[test]
    fn parses_forward_reference_between_functions() {
        let (registry, id) = parse_source("fn main x is helper x\nfn helper y is __add y 1");
        let f = registry.get(id).functions.get("main").unwrap();
        match &f.body[0] {
            Node::Call { name, args, .. } => {
                assert_eq!(name, "helper");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn parses_multi_expression_body_keeping_all_statements() {
        let (registry, id) = parse_source("fn main is __print 1 __print 2");
        let f = registry.get(id).functions.get("main").unwrap();
        assert_eq!(f.body.len(), 2);
        assert!(matches!(f.body[0], Node::Prim(PrimOp::Print, _)));
        assert!(matches!(f.body[1], Node::Prim(PrimOp::Print, _)));
    }

    #[test]
    fn parses_if_expression() {
        let (registry, id) = parse_source("fn choose c is if c 1 0");
        let f = registry.get(id).functions.get("choose").unwrap();
        assert!(matches!(f.body[0], Node::If { .. }));
    }

    #[test]
    fn undefined_identifier_is_a_parse_error() {
        let mut registry = ModuleRegistry::new();
        let loader = FsModuleLoader;
        let err = load_and_parse(
            &mut registry,
            "__main__",
            None,
            "fn main x is nope x".to_string(),
            &loader,
        )
        .unwrap_err();
        assert!(matches!(err, AttoError::Parse(_)));
    }
}
