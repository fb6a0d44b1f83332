//! The fused recursive-descent parser/evaluator (spec §4.3). There is no
//! AST: statements execute as they are parsed, and loops/function calls
//! re-parse by seeking the lexer back to a recorded [`Position`] rather than
//! replaying any tree. The stream cursor *is* the program counter.

use crate::action::ActionSink;
use crate::error::Error;
use crate::lexer::{Lexer, Symbol, SymbolKind};
use crate::position::Position;
use crate::stream::ByteSource;
use crate::value::{add, bitand, bitnot, bitor, from_bool, mul, pow, shl, shr, sub, truthy, Value};

/// What a statement (or a run of statements) produced. `Return` is a
/// control signal, never an error (spec §7): it unwinds only as far as the
/// enclosing function call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Return(Value),
    Eof,
}

struct Variable {
    name: String,
    value: Value,
}

struct Function {
    name: String,
    params: Vec<String>,
    /// Scratch buffer bridging caller-side argument evaluation and
    /// callee-side parameter binding; non-empty only in the narrow window
    /// between the two (spec §3).
    pending_args: Vec<Value>,
    body_pos: Position,
}

/// A saved `(vars.len, funcs.len)` pair. Entering a scope snapshots the
/// current heights; leaving it truncates both stacks back down, which is
/// the push-down-stack translation of the source's intrusive-linked-list
/// scopes (see DESIGN.md).
#[derive(Clone, Copy)]
struct ScopeMarker {
    vars: usize,
    funcs: usize,
}

pub struct Interpreter<R, S> {
    lexer: Lexer<R>,
    sink: S,
    vars: Vec<Variable>,
    funcs: Vec<Function>,
}

impl<R: ByteSource, S: ActionSink> Interpreter<R, S> {
    pub fn new(reader: R, sink: S) -> Result<Self, Error> {
        Ok(Self {
            lexer: Lexer::new(reader)?,
            sink,
            vars: Vec::new(),
            funcs: Vec::new(),
        })
    }

    /// Recover the action sink, e.g. to inspect a `RecordingSink`'s trace
    /// after a run completes.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run the whole program to completion. Returns `Ok(())` on a clean
    /// EOF; any `Error` unwinds straight to here and is returned.
    pub fn run(&mut self) -> Result<(), Error> {
        self.prescan_functions()?;
        loop {
            match self.exec_statement()? {
                Status::Ok => continue,
                Status::Eof => return Ok(()),
                Status::Return(_) => {
                    return Err(Error::syntactic(
                        self.lexer.line(),
                        "'return' outside of a function",
                    ))
                }
            }
        }
    }

    // ---- scope management -------------------------------------------------

    fn enter_scope(&self) -> ScopeMarker {
        ScopeMarker {
            vars: self.vars.len(),
            funcs: self.funcs.len(),
        }
    }

    fn exit_scope(&mut self, marker: ScopeMarker) {
        self.vars.truncate(marker.vars);
        self.funcs.truncate(marker.funcs);
    }

    /// Execute `enders`-terminated statements in a fresh scope, torn down
    /// on the way out regardless of how the block finished.
    fn run_scoped_block(&mut self, enders: &[SymbolKind]) -> Result<Status, Error> {
        let marker = self.enter_scope();
        let status = self.exec_statements_until(enders);
        self.exit_scope(marker);
        match status? {
            Status::Eof => Err(Error::structural(
                self.lexer.line(),
                "unexpected end of input inside block",
            )),
            other => Ok(other),
        }
    }

    // ---- pre-scan -----------------------------------------------------

    /// Walks the whole program once, registering every `function`
    /// declaration (name, parameters, body position) before execution
    /// begins, then seeks back to the start. This is what makes forward
    /// references to functions work (spec §4.3 "Program entry").
    fn prescan_functions(&mut self) -> Result<(), Error> {
        let start = self.lexer.pos();
        loop {
            let sym = self.lexer.next()?;
            match sym.kind {
                SymbolKind::Eof => break,
                SymbolKind::Function => self.register_function()?,
                _ => {}
            }
        }
        self.lexer.jmp(start)?;
        Ok(())
    }

    /// Parses `name '(' [ variable {',' variable} ] ')' EOL` — the header
    /// shared by a function's declaration and its (silent) re-encounter
    /// during normal execution.
    fn parse_function_header(&mut self) -> Result<(String, Vec<String>), Error> {
        let name_sym = self.expect_kind(SymbolKind::Name, "a function name")?;
        self.expect_kind(SymbolKind::LParen, "'('")?;
        let mut params = Vec::new();
        let mut sym = self.lexer.next()?;
        if sym.kind != SymbolKind::RParen {
            loop {
                if sym.kind != SymbolKind::Variable {
                    return Err(Error::syntactic(sym.line, "expected a parameter name"));
                }
                params.push(sym.content.clone());
                let sep = self.lexer.next()?;
                match sep.kind {
                    SymbolKind::Comma => sym = self.lexer.next()?,
                    SymbolKind::RParen => break,
                    other => {
                        return Err(Error::syntactic(
                            sep.line,
                            format!("expected ',' or ')', found {other:?}"),
                        ))
                    }
                }
            }
        }
        self.expect_eol()?;
        Ok((name_sym.content, params))
    }

    fn register_function(&mut self) -> Result<(), Error> {
        let (name, params) = self.parse_function_header()?;
        let body_pos = self.lexer.pos();
        log::debug!("registered function '{name}' ({} param(s))", params.len());
        self.funcs.push(Function {
            name,
            params,
            pending_args: Vec::new(),
            body_pos,
        });
        self.skip_function_body_registering()?;
        self.finish_block(SymbolKind::EndFunction, "end_function")
            .map(|_| ())
    }

    /// Like `skip_block(&[EndFunction])`, but used only while pre-scanning a
    /// function's own body: a nested `function ... end_function` found
    /// inside it is not just depth-tracked and skipped, it is registered
    /// (recursively, so doubly-nested declarations work too), matching
    /// spec.md §4.3's "hoisted to the enclosing scope at the point they are
    /// first lexed" read literally as "every function, wherever it sits
    /// lexically, is registered before the first statement runs."
    fn skip_function_body_registering(&mut self) -> Result<(), Error> {
        let mut depth: u32 = 0;
        loop {
            let checkpoint = self.lexer.pos();
            let sym = self.lexer.next()?;
            match sym.kind {
                SymbolKind::Eof => {
                    return Err(Error::structural(
                        sym.line,
                        "unexpected end of input while skipping a block",
                    ))
                }
                SymbolKind::Function => self.register_function()?,
                SymbolKind::If | SymbolKind::While => {
                    depth += 1;
                    self.skip_to_eol()?;
                }
                SymbolKind::EndIf | SymbolKind::EndWhile if depth > 0 => {
                    depth -= 1;
                    self.skip_to_eol()?;
                }
                SymbolKind::EndFunction if depth == 0 => {
                    self.lexer.jmp(checkpoint)?;
                    return Ok(());
                }
                _ => self.skip_to_eol()?,
            }
        }
    }

    // ---- statement dispatch --------------------------------------------

    /// Execute statements until the next one (peeked, not consumed) has a
    /// kind in `enders`, or the stream ends. Leaves the cursor positioned
    /// right before the ender so the caller can consume it itself.
    fn exec_statements_until(&mut self, enders: &[SymbolKind]) -> Result<Status, Error> {
        loop {
            let checkpoint = self.lexer.pos();
            let sym = self.lexer.next()?;
            if sym.kind == SymbolKind::Eof {
                return Ok(Status::Eof);
            }
            if enders.contains(&sym.kind) {
                self.lexer.jmp(checkpoint)?;
                return Ok(Status::Ok);
            }
            self.lexer.jmp(checkpoint)?;
            match self.exec_statement()? {
                Status::Ok => continue,
                other => return Ok(other),
            }
        }
    }

    fn exec_statement(&mut self) -> Result<Status, Error> {
        let while_start = self.lexer.pos();
        let sym = self.lexer.next()?;
        match sym.kind {
            SymbolKind::Eof => Ok(Status::Eof),
            SymbolKind::Comment => {
                self.expect_eol()?;
                Ok(Status::Ok)
            }
            SymbolKind::Variable => self.exec_assignment(sym),
            SymbolKind::String => self.exec_string(false),
            SymbolKind::Stringln => self.exec_string(true),
            SymbolKind::Delay => self.exec_delay(sym.line),
            SymbolKind::Var => self.exec_var_decl(),
            SymbolKind::Hold => self.exec_hold(),
            SymbolKind::Release => self.exec_release(),
            SymbolKind::KeyCmd => self.exec_key_cmd(),
            SymbolKind::Key => self.exec_bare_key(sym),
            SymbolKind::If => self.exec_if(),
            SymbolKind::While => self.exec_while(while_start),
            SymbolKind::Function => self.exec_function_decl(),
            SymbolKind::Return => self.exec_return(),
            other => Err(Error::syntactic(
                sym.line,
                format!("unexpected token {other:?} in statement position"),
            )),
        }
    }

    fn exec_assignment(&mut self, name_sym: Symbol) -> Result<Status, Error> {
        self.expect_kind(SymbolKind::Assign, "'='")?;
        let value = self.parse_expr()?;
        self.expect_eol()?;
        self.assign(&name_sym.content, value, name_sym.line)?;
        Ok(Status::Ok)
    }

    fn exec_var_decl(&mut self) -> Result<Status, Error> {
        let name_sym = self.expect_kind(SymbolKind::Variable, "a variable name")?;
        self.expect_kind(SymbolKind::Assign, "'='")?;
        let value = self.parse_expr()?;
        self.expect_eol()?;
        self.vars.push(Variable {
            name: name_sym.content,
            value,
        });
        Ok(Status::Ok)
    }

    fn exec_string(&mut self, ln: bool) -> Result<Status, Error> {
        let sym = self.lexer.next()?;
        let payload = match sym.kind {
            SymbolKind::StringPayload => {
                let content = sym.content;
                self.expect_eol()?;
                content
            }
            SymbolKind::Eol => String::new(),
            SymbolKind::Eof => {
                return Err(Error::structural(
                    sym.line,
                    "unexpected end of input in string command",
                ))
            }
            other => {
                return Err(Error::syntactic(
                    sym.line,
                    format!("expected a string payload, found {other:?}"),
                ))
            }
        };
        if ln {
            self.sink.type_stringln(payload.as_bytes());
        } else {
            self.sink.type_string(payload.as_bytes());
        }
        Ok(Status::Ok)
    }

    fn exec_delay(&mut self, line: u32) -> Result<Status, Error> {
        let value = self.parse_expr()?;
        self.expect_eol()?;
        let ms = if value < 0 {
            log::warn!("line {line}: delay evaluated to {value}; clamping to 0");
            0
        } else {
            value as u32
        };
        self.sink.delay(ms);
        Ok(Status::Ok)
    }

    fn exec_key_list(&mut self) -> Result<Vec<crate::lexer::keys::Key>, Error> {
        self.exec_key_list_from(Vec::new())
    }

    /// Reads `Key` symbols until `Eol`, appending onto `keys` — shared by
    /// `hold`/`release` (which start with an empty list) and a bare
    /// statement-start key tap (which has already lexed its first `Key`
    /// symbol as the statement dispatch token, so that one is seeded in).
    fn exec_key_list_from(
        &mut self,
        mut keys: Vec<crate::lexer::keys::Key>,
    ) -> Result<Vec<crate::lexer::keys::Key>, Error> {
        loop {
            let sym = self.lexer.next()?;
            match sym.kind {
                SymbolKind::Key => match sym.key {
                    Some(key) => keys.push(key),
                    None => {
                        return Err(Error::structural(
                            sym.line,
                            "Key symbol carried no resolved key",
                        ))
                    }
                },
                SymbolKind::Eol => return Ok(keys),
                SymbolKind::Eof => {
                    return Err(Error::structural(
                        sym.line,
                        "unexpected end of input in key list",
                    ))
                }
                other => {
                    return Err(Error::syntactic(
                        sym.line,
                        format!("expected a key name, found {other:?}"),
                    ))
                }
            }
        }
    }

    fn exec_hold(&mut self) -> Result<Status, Error> {
        let keys = self.exec_key_list()?;
        self.sink.hold(&keys);
        Ok(Status::Ok)
    }

    fn exec_release(&mut self) -> Result<Status, Error> {
        let keys = self.exec_key_list()?;
        self.sink.release(&keys);
        Ok(Status::Ok)
    }

    /// `key <names...>` — a crate-only convenience alias for the normative
    /// bare-key-tap statement (`exec_bare_key`), kept around since it reads
    /// more clearly in scripts that want to be explicit about the command.
    /// Not in spec.md's keyword list or the original source's grammar.
    fn exec_key_cmd(&mut self) -> Result<Status, Error> {
        let keys = self.exec_key_list()?;
        self.exec_key_tap(keys)
    }

    /// `key {any_key} eol` — the language's normative key-tap statement
    /// (spec.md §6, `original_source/.../goofy_parser.c:909-913`'s
    /// `cmd_key`): a statement that starts with a bare key name rather than
    /// a keyword. `first` is the `Key` symbol `exec_statement` already
    /// dispatched on.
    fn exec_bare_key(&mut self, first: Symbol) -> Result<Status, Error> {
        let Some(key) = first.key else {
            return Err(Error::structural(
                first.line,
                "Key symbol carried no resolved key",
            ));
        };
        let keys = self.exec_key_list_from(vec![key])?;
        self.exec_key_tap(keys)
    }

    /// Any key in the list that names a modifier is OR-ed into the mask
    /// (spec §9 flags a source bug that used AND here; this crate uses OR
    /// as required); the last non-modifier key is the one tapped.
    fn exec_key_tap(&mut self, keys: Vec<crate::lexer::keys::Key>) -> Result<Status, Error> {
        let mut modifiers = crate::lexer::keys::Modifiers::default();
        let mut tapped = None;
        for k in &keys {
            match crate::lexer::keys::Modifiers::from_key(*k) {
                Some(m) => modifiers = modifiers.or(m),
                None => tapped = Some(*k),
            }
        }
        let key = match tapped.or_else(|| keys.last().copied()) {
            Some(k) => k,
            None => {
                return Err(Error::syntactic(
                    self.lexer.line(),
                    "'key' requires at least one key name",
                ))
            }
        };
        self.sink.key(key, modifiers);
        Ok(Status::Ok)
    }

    fn exec_if(&mut self) -> Result<Status, Error> {
        let chain_enders = [SymbolKind::ElseIf, SymbolKind::Else, SymbolKind::EndIf];
        let mut taken = false;
        let mut cond = self.parse_expr()?;
        self.expect_eol()?;
        loop {
            if !taken && truthy(cond) {
                taken = true;
                match self.run_scoped_block(&chain_enders)? {
                    Status::Ok => {}
                    other => return Ok(other),
                }
            } else {
                self.skip_block(&chain_enders)?;
            }

            let sym = self.lexer.next()?;
            match sym.kind {
                SymbolKind::ElseIf => {
                    cond = self.parse_expr()?;
                    self.expect_eol()?;
                }
                SymbolKind::Else => {
                    self.expect_eol()?;
                    if !taken {
                        taken = true;
                        match self.run_scoped_block(&[SymbolKind::EndIf])? {
                            Status::Ok => {}
                            other => return Ok(other),
                        }
                    } else {
                        self.skip_block(&[SymbolKind::EndIf])?;
                    }
                    return self.finish_block(SymbolKind::EndIf, "end_if");
                }
                SymbolKind::EndIf => {
                    self.expect_eol()?;
                    return Ok(Status::Ok);
                }
                other => {
                    return Err(Error::syntactic(
                        sym.line,
                        format!("expected 'else_if', 'else' or 'end_if', found {other:?}"),
                    ))
                }
            }
        }
    }

    /// `loop_pos` is the position of the `while` keyword itself, recorded
    /// by the caller before it was consumed — the canonical use of lexer
    /// checkpoints (spec §4.3).
    fn exec_while(&mut self, loop_pos: Position) -> Result<Status, Error> {
        loop {
            let cond = self.parse_expr()?;
            self.expect_eol()?;
            if truthy(cond) {
                match self.run_scoped_block(&[SymbolKind::EndWhile])? {
                    Status::Ok => {}
                    other => return Ok(other),
                }
                self.finish_block(SymbolKind::EndWhile, "end_while")?;
                log::trace!("while loop iteration complete, re-seeking to start");
                self.lexer.jmp(loop_pos)?;
                self.lexer.next()?; // re-consume 'while' itself
            } else {
                self.skip_block(&[SymbolKind::EndWhile])?;
                return self.finish_block(SymbolKind::EndWhile, "end_while");
            }
        }
    }

    fn exec_function_decl(&mut self) -> Result<Status, Error> {
        // Declarations only happen during the pre-scan; a second
        // encounter at execution time is silent (spec §4.3).
        self.parse_function_header()?;
        self.skip_block(&[SymbolKind::EndFunction])?;
        self.finish_block(SymbolKind::EndFunction, "end_function")
    }

    fn exec_return(&mut self) -> Result<Status, Error> {
        let value = self.parse_expr()?;
        self.expect_eol()?;
        Ok(Status::Return(value))
    }

    // ---- skipping (untaken if/else branches, function bodies during
    // pre-scan) -------------------------------------------------------------

    /// Skip statements without executing them until (at nesting depth 0
    /// relative to this call) one of `enders` is seen; leaves the cursor
    /// positioned right before it, same convention as
    /// `exec_statements_until`. Recognizes nested `if`/`while`/`function`
    /// so a nested block's own end-keyword doesn't get mistaken for ours.
    fn skip_block(&mut self, enders: &[SymbolKind]) -> Result<(), Error> {
        let mut depth: u32 = 0;
        loop {
            let checkpoint = self.lexer.pos();
            let sym = self.lexer.next()?;
            match sym.kind {
                SymbolKind::Eof => {
                    return Err(Error::structural(
                        sym.line,
                        "unexpected end of input while skipping a block",
                    ))
                }
                SymbolKind::If | SymbolKind::While | SymbolKind::Function => {
                    depth += 1;
                    self.skip_to_eol()?;
                }
                SymbolKind::EndIf | SymbolKind::EndWhile | SymbolKind::EndFunction
                    if depth > 0 =>
                {
                    depth -= 1;
                    self.skip_to_eol()?;
                }
                k if depth == 0 && enders.contains(&k) => {
                    self.lexer.jmp(checkpoint)?;
                    return Ok(());
                }
                _ => self.skip_to_eol()?,
            }
        }
    }

    fn skip_to_eol(&mut self) -> Result<(), Error> {
        loop {
            let sym = self.lexer.next()?;
            match sym.kind {
                SymbolKind::Eol => return Ok(()),
                SymbolKind::Eof => {
                    return Err(Error::structural(
                        sym.line,
                        "unexpected end of input while skipping",
                    ))
                }
                _ => continue,
            }
        }
    }

    // ---- variables & function calls ------------------------------------

    fn find_var_index(&self, name: &str) -> Option<usize> {
        self.vars
            .iter()
            .rposition(|v| v.name.eq_ignore_ascii_case(name))
    }

    fn lookup_var(&self, name: &str, line: u32) -> Result<Value, Error> {
        self.find_var_index(name)
            .map(|i| self.vars[i].value)
            .ok_or_else(|| Error::syntactic(line, format!("undefined variable '${name}'")))
    }

    fn assign(&mut self, name: &str, value: Value, line: u32) -> Result<(), Error> {
        let idx = self.find_var_index(name).ok_or_else(|| {
            Error::syntactic(line, format!("assignment to undeclared variable '${name}'"))
        })?;
        self.vars[idx].value = value;
        Ok(())
    }

    fn call_function(&mut self, name_sym: Symbol) -> Result<Value, Error> {
        self.expect_kind(SymbolKind::LParen, "'('")?;
        let mut args = Vec::new();
        let first = self.peek()?;
        if first.kind == SymbolKind::RParen {
            self.lexer.next()?;
        } else {
            loop {
                args.push(self.parse_expr()?);
                let sep = self.lexer.next()?;
                match sep.kind {
                    SymbolKind::Comma => continue,
                    SymbolKind::RParen => break,
                    other => {
                        return Err(Error::syntactic(
                            sep.line,
                            format!("expected ',' or ')', found {other:?}"),
                        ))
                    }
                }
            }
        }

        let idx = self
            .funcs
            .iter()
            .rposition(|f| f.name.eq_ignore_ascii_case(&name_sym.content))
            .ok_or_else(|| {
                Error::syntactic(
                    name_sym.line,
                    format!("undefined function '{}'", name_sym.content),
                )
            })?;

        if self.funcs[idx].params.len() != args.len() {
            return Err(Error::syntactic(
                name_sym.line,
                format!(
                    "function '{}' expects {} argument(s), found {}",
                    name_sym.content,
                    self.funcs[idx].params.len(),
                    args.len()
                ),
            ));
        }

        log::debug!(
            "calling function '{}' with {} argument(s)",
            name_sym.content,
            args.len()
        );

        self.funcs[idx].pending_args = args;
        let ret_pos = self.lexer.pos();
        let marker = self.enter_scope();

        let f = &mut self.funcs[idx];
        let params = f.params.clone();
        let body_pos = f.body_pos;
        let pending = std::mem::take(&mut f.pending_args);
        for (param, value) in params.into_iter().zip(pending) {
            self.vars.push(Variable { name: param, value });
        }

        self.lexer.jmp(body_pos)?;
        let status = self.exec_statements_until(&[SymbolKind::EndFunction]);
        let result = match status {
            Ok(Status::Return(v)) => v,
            Ok(Status::Ok) => {
                self.finish_block(SymbolKind::EndFunction, "end_function")?;
                0
            }
            Ok(Status::Eof) => {
                return Err(Error::structural(
                    name_sym.line,
                    "unexpected end of input inside function body",
                ))
            }
            Err(e) => {
                self.exit_scope(marker);
                self.lexer.jmp(ret_pos)?;
                return Err(e);
            }
        };

        self.exit_scope(marker);
        self.lexer.jmp(ret_pos)?;
        Ok(result)
    }

    // ---- expression grammar (spec §4.3, precedence low to high) -------

    fn peek(&mut self) -> Result<Symbol, Error> {
        let checkpoint = self.lexer.pos();
        let sym = self.lexer.next()?;
        self.lexer.jmp(checkpoint)?;
        Ok(sym)
    }

    fn parse_expr(&mut self) -> Result<Value, Error> {
        let mut lhs = self.parse_rel()?;
        match self.peek()?.kind {
            SymbolKind::AmpAmp => {
                while self.peek()?.kind == SymbolKind::AmpAmp {
                    self.lexer.next()?;
                    let rhs = self.parse_rel()?;
                    lhs = from_bool(truthy(lhs) && truthy(rhs));
                }
            }
            SymbolKind::PipePipe => {
                while self.peek()?.kind == SymbolKind::PipePipe {
                    self.lexer.next()?;
                    let rhs = self.parse_rel()?;
                    lhs = from_bool(truthy(lhs) || truthy(rhs));
                }
            }
            _ => {}
        }
        Ok(lhs)
    }

    fn parse_rel(&mut self) -> Result<Value, Error> {
        let lhs = self.parse_sum()?;
        let op = self.peek()?;
        let kind = match op.kind {
            SymbolKind::EqEq
            | SymbolKind::NotEq
            | SymbolKind::Lt
            | SymbolKind::Le
            | SymbolKind::Gt
            | SymbolKind::Ge => op.kind,
            _ => return Ok(lhs),
        };
        self.lexer.next()?;
        let rhs = self.parse_sum()?;
        Ok(from_bool(match kind {
            SymbolKind::EqEq => lhs == rhs,
            SymbolKind::NotEq => lhs != rhs,
            SymbolKind::Lt => lhs < rhs,
            SymbolKind::Le => lhs <= rhs,
            SymbolKind::Gt => lhs > rhs,
            SymbolKind::Ge => lhs >= rhs,
            _ => unreachable!(),
        }))
    }

    fn parse_sum(&mut self) -> Result<Value, Error> {
        let mut lhs = self.parse_shift()?;
        loop {
            match self.peek()?.kind {
                SymbolKind::Amp => {
                    self.lexer.next()?;
                    lhs = bitand(lhs, self.parse_shift()?);
                }
                SymbolKind::Pipe => {
                    self.lexer.next()?;
                    lhs = bitor(lhs, self.parse_shift()?);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_shift(&mut self) -> Result<Value, Error> {
        let mut lhs = self.parse_add()?;
        loop {
            match self.peek()?.kind {
                SymbolKind::Shl => {
                    self.lexer.next()?;
                    lhs = shl(lhs, self.parse_add()?);
                }
                SymbolKind::Shr => {
                    self.lexer.next()?;
                    lhs = shr(lhs, self.parse_add()?);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_add(&mut self) -> Result<Value, Error> {
        let mut lhs = self.parse_mul()?;
        loop {
            match self.peek()?.kind {
                SymbolKind::Plus => {
                    self.lexer.next()?;
                    lhs = add(lhs, self.parse_mul()?);
                }
                SymbolKind::Minus => {
                    self.lexer.next()?;
                    lhs = sub(lhs, self.parse_mul()?);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_mul(&mut self) -> Result<Value, Error> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek()?.kind {
                SymbolKind::Star => {
                    self.lexer.next()?;
                    lhs = mul(lhs, self.parse_unary()?);
                }
                SymbolKind::Slash => {
                    let op = self.lexer.next()?;
                    let rhs = self.parse_unary()?;
                    if rhs == 0 {
                        return Err(Error::semantic(op.line, "division by zero"));
                    }
                    lhs = lhs.wrapping_div(rhs);
                }
                SymbolKind::Percent => {
                    let op = self.lexer.next()?;
                    let rhs = self.parse_unary()?;
                    if rhs == 0 {
                        return Err(Error::semantic(op.line, "division by zero"));
                    }
                    lhs = lhs.wrapping_rem(rhs);
                }
                _ => return Ok(lhs),
            }
        }
    }

    /// `('+'|'-'|'!'|'~') primary | primary [ '^' primary ]` — note the
    /// grammar gives `^` only to the no-prefix alternative.
    fn parse_unary(&mut self) -> Result<Value, Error> {
        match self.peek()?.kind {
            SymbolKind::Plus => {
                self.lexer.next()?;
                self.parse_primary()
            }
            SymbolKind::Minus => {
                self.lexer.next()?;
                Ok(sub(0, self.parse_primary()?))
            }
            SymbolKind::Bang => {
                self.lexer.next()?;
                Ok(from_bool(!truthy(self.parse_primary()?)))
            }
            SymbolKind::Tilde => {
                self.lexer.next()?;
                Ok(bitnot(self.parse_primary()?))
            }
            _ => {
                let base = self.parse_primary()?;
                if self.peek()?.kind == SymbolKind::Caret {
                    self.lexer.next()?;
                    let exp = self.parse_primary()?;
                    Ok(pow(base, exp))
                } else {
                    Ok(base)
                }
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Value, Error> {
        let sym = self.lexer.next()?;
        match sym.kind {
            SymbolKind::Number => sym.content.parse::<i32>().map_err(|_| {
                Error::syntactic(sym.line, format!("invalid number literal '{}'", sym.content))
            }),
            SymbolKind::True => Ok(1),
            SymbolKind::False => Ok(0),
            SymbolKind::Variable => self.lookup_var(&sym.content, sym.line),
            SymbolKind::LParen => {
                let value = self.parse_expr()?;
                self.expect_kind(SymbolKind::RParen, "')'")?;
                Ok(value)
            }
            SymbolKind::Name => self.call_function(sym),
            other => Err(Error::syntactic(
                sym.line,
                format!("expected an expression, found {other:?}"),
            )),
        }
    }

    // ---- small token helpers --------------------------------------------

    fn expect_kind(&mut self, kind: SymbolKind, what: &str) -> Result<Symbol, Error> {
        let sym = self.lexer.next()?;
        if sym.kind != kind {
            return Err(Error::syntactic(
                sym.line,
                format!("expected {what}, found {:?}", sym.kind),
            ));
        }
        Ok(sym)
    }

    fn expect_eol(&mut self) -> Result<(), Error> {
        let sym = self.lexer.next()?;
        match sym.kind {
            SymbolKind::Eol => Ok(()),
            SymbolKind::Eof => Err(Error::structural(
                sym.line,
                "unexpected end of input, expected end of line",
            )),
            other => Err(Error::syntactic(
                sym.line,
                format!("expected end of line, found {other:?}"),
            )),
        }
    }

    fn finish_block(&mut self, expected: SymbolKind, what: &str) -> Result<Status, Error> {
        let sym = self.lexer.next()?;
        if sym.kind != expected {
            return Err(Error::syntactic(sym.line, format!("expected '{what}'")));
        }
        self.expect_eol()?;
        Ok(Status::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::testing::{Action, RecordingSink};
    use std::io::Cursor;

    fn run(src: &str) -> Vec<Action> {
        let sink = RecordingSink::default();
        let mut interp = Interpreter::new(Cursor::new(src.as_bytes().to_vec()), sink).unwrap();
        interp.run().unwrap();
        interp.sink.actions
    }

    fn run_err(src: &str) -> Error {
        let sink = RecordingSink::default();
        let mut interp = Interpreter::new(Cursor::new(src.as_bytes().to_vec()), sink).unwrap();
        interp.run().unwrap_err()
    }

    #[test]
    fn string_and_stringln() {
        let actions = run("string hello\nstringln world\n");
        assert_eq!(
            actions,
            vec![
                Action::TypeString(b"hello".to_vec()),
                Action::TypeStringln(b"world".to_vec()),
            ]
        );
    }

    #[test]
    fn delay_evaluates_expression() {
        let actions = run("delay 5+3*2\n");
        assert_eq!(actions, vec![Action::Delay(11)]);
    }

    #[test]
    fn while_loop_runs_body_each_iteration() {
        let actions = run("var $i = 0\nwhile $i < 3\n  string x\n  $i = $i + 1\nend_while\n");
        assert_eq!(
            actions,
            vec![
                Action::TypeString(b"x".to_vec()),
                Action::TypeString(b"x".to_vec()),
                Action::TypeString(b"x".to_vec()),
            ]
        );
    }

    #[test]
    fn while_false_runs_zero_times() {
        let actions = run("while false\n  string never\nend_while\n");
        assert_eq!(actions, Vec::new());
    }

    #[test]
    fn if_else_picks_one_branch() {
        let actions = run("var $a = 0\nif 1 == 1\n  $a = 7\nelse\n  $a = 9\nend_if\ndelay $a\n");
        assert_eq!(actions, vec![Action::Delay(7)]);
    }

    #[test]
    fn else_if_chain_only_executes_matching_branch() {
        let actions = run(
            "var $a = 2\nif $a == 1\n  delay 1\nelse_if $a == 2\n  delay 2\nelse\n  delay 3\nend_if\n",
        );
        assert_eq!(actions, vec![Action::Delay(2)]);
    }

    #[test]
    fn function_call_with_forward_reference() {
        let actions = run("function add($x,$y)\n  return $x+$y\nend_function\ndelay add(2,40)\n");
        assert_eq!(actions, vec![Action::Delay(42)]);
    }

    #[test]
    fn recursive_function_computes_factorial() {
        let actions = run(
            "function fact($n)\n  if $n == 0\n    return 1\n  else\n    return $n * fact($n - 1)\n  end_if\nend_function\ndelay fact(5)\n",
        );
        assert_eq!(actions, vec![Action::Delay(120)]);
    }

    #[test]
    fn division_by_zero_is_semantic_error_with_no_prior_actions() {
        let err = run_err("var $x = 0\n$x = 10 / 0\n");
        assert_eq!(err.kind, crate::error::ErrorKind::Semantic);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn assignment_to_undeclared_variable_errors() {
        let err = run_err("$x = 1\n");
        assert_eq!(err.kind, crate::error::ErrorKind::Syntactic);
    }

    #[test]
    fn scopes_unwind_after_function_call() {
        // the function's parameter must not leak into the caller's scope
        let err = run_err("function f($n)\n  return $n\nend_function\ndelay f(1)\ndelay $n\n");
        assert_eq!(err.kind, crate::error::ErrorKind::Syntactic);
    }

    #[test]
    fn logical_operators_do_not_short_circuit() {
        // both sides of && must execute even when the result is already
        // determined by the left operand; side effects come from nested
        // function calls since strings aren't first-class values here.
        let actions = run(
            "function side($n)\n  string x\n  return $n\nend_function\nif side(0) && side(1)\n  string taken\nend_if\n",
        );
        assert_eq!(
            actions,
            vec![
                Action::TypeString(b"x".to_vec()),
                Action::TypeString(b"x".to_vec()),
            ]
        );
    }

    #[test]
    fn bitwise_and_shift_operators() {
        let actions = run("delay (6 & 3) | (1 << 3)\n");
        assert_eq!(actions, vec![Action::Delay(10)]);
    }

    #[test]
    fn hold_and_release_dispatch_to_sink() {
        let actions = run("hold ctrl alt\nrelease ctrl alt\n");
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], Action::Hold(_)));
        assert!(matches!(actions[1], Action::Release(_)));
    }
}
