//! Body pass: statements and expressions inside one skipped span.
//!
//! Each invocation works over its own token sub-range of the shared array
//! and never touches sibling declarations, so bodies can be parsed in any
//! order. Two completeness tiers apply on failure: with recovery off the
//! whole body collapses to an empty block; with recovery on the parsed
//! prefix is kept and the parser resynchronizes at statement boundaries.

use quill_core::{Diagnostic, Span};

use crate::ast::*;
use crate::language_level::JavaFeature;
use crate::token::{Token, TokenKind};
use crate::{printer, ParseOptions};

use super::{gate_feature, modifier_for, parse_modifiers, parse_type_ref, scan_type, CompletionCapture, Cursor, Sink};

pub(crate) struct BodyOutput {
    pub block: Block,
    pub diagnostics: Vec<Diagnostic>,
    pub completion: Option<CompletionCapture>,
}

/// Parse the statements between token indices `range` (exclusive of the
/// braces themselves). `span` becomes the block's source range.
pub(crate) fn parse_block_range(
    source: &str,
    tokens: &[Token],
    range: (usize, usize),
    span: Span,
    options: &ParseOptions,
) -> BodyOutput {
    let mut parser = BodyParser {
        cur: Cursor::new(source, tokens, range.0, range.1),
        sink: Sink::default(),
        options,
    };
    let mut statements = Vec::new();
    let complete = parser.parse_stmt_list(&mut statements);
    if complete.is_err() && !options.methods_full_recovery {
        // Tier one: a body that fails to parse yields an empty body.
        statements.clear();
    }
    BodyOutput {
        block: Block {
            statements,
            range: span,
        },
        diagnostics: parser.sink.diagnostics,
        completion: parser.sink.completion,
    }
}

/// Parse a single expression from a token sub-range (field initializers,
/// fragment entry points).
pub(crate) fn parse_expr_range(
    source: &str,
    tokens: &[Token],
    range: (usize, usize),
    options: &ParseOptions,
) -> (Expr, Vec<Diagnostic>, Option<CompletionCapture>) {
    let mut parser = BodyParser {
        cur: Cursor::new(source, tokens, range.0, range.1),
        sink: Sink::default(),
        options,
    };
    let at = parser.cur.offset();
    let expr = parser
        .parse_expression()
        .unwrap_or(Expr::Missing(Span::empty(at)));
    (expr, parser.sink.diagnostics, parser.sink.completion)
}

/// Local failure inside a statement production. Bubbles to the nearest
/// recovery boundary; with recovery off it empties the whole body.
pub(crate) struct StmtFail;

type StmtResult<T> = Result<T, StmtFail>;

struct BodyParser<'a> {
    cur: Cursor<'a>,
    sink: Sink,
    options: &'a ParseOptions,
}

impl<'a> BodyParser<'a> {
    /// Parse statements until the range ends or a `}` is left for the
    /// caller. `Err` only escapes when recovery is off.
    fn parse_stmt_list(&mut self, out: &mut Vec<Stmt>) -> StmtResult<()> {
        loop {
            match self.cur.peek() {
                TokenKind::Eof | TokenKind::RBrace => return Ok(()),
                _ => match self.parse_statement_into(out) {
                    Ok(()) => {}
                    Err(fail) => {
                        if !self.options.methods_full_recovery {
                            return Err(fail);
                        }
                        self.recover_statement();
                    }
                },
            }
        }
    }

    /// Resynchronize after a failed statement: swallow through the next
    /// `;`, stop before `}`, balance stray parens.
    fn recover_statement(&mut self) {
        if self.cur.at_end() || self.cur.at(TokenKind::RBrace) {
            return;
        }
        self.cur.bump();
        loop {
            match self.cur.peek() {
                TokenKind::Eof | TokenKind::RBrace => return,
                TokenKind::Semicolon => {
                    self.cur.bump();
                    return;
                }
                TokenKind::LParen => {
                    self.cur.bump();
                    self.cur.skip_balanced(TokenKind::LParen, TokenKind::RParen);
                }
                TokenKind::LBrace => {
                    self.cur.bump();
                    self.cur.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                }
                _ => {
                    self.cur.bump();
                }
            }
        }
    }

    fn parse_statement_into(&mut self, out: &mut Vec<Stmt>) -> StmtResult<()> {
        match self.cur.peek() {
            kind if self.at_local_type_start(kind) => {
                if let Some(stmt) = self.parse_local_type()? {
                    out.push(stmt);
                }
                Ok(())
            }
            _ if self.at_local_var_start() => self.parse_local_var_into(out),
            _ => {
                let stmt = self.parse_single_statement()?;
                out.push(stmt);
                Ok(())
            }
        }
    }

    fn parse_single_statement(&mut self) -> StmtResult<Stmt> {
        let start = self.cur.offset();
        match self.cur.peek() {
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                let token = self.cur.bump();
                Ok(Stmt::Empty(token.range))
            }
            TokenKind::IfKw => self.parse_if(start),
            TokenKind::WhileKw => self.parse_while(start),
            TokenKind::DoKw => self.parse_do_while(start),
            TokenKind::ForKw => self.parse_for(start),
            TokenKind::SwitchKw => self.parse_switch(start),
            TokenKind::TryKw => self.parse_try(start),
            TokenKind::SynchronizedKw if self.cur.nth(1) == TokenKind::LParen => {
                self.cur.bump();
                self.cur
                    .expect(TokenKind::LParen, &mut self.sink, "expected `(`");
                let lock = self.parse_expression()?;
                self.cur
                    .expect(TokenKind::RParen, &mut self.sink, "expected `)`");
                let body = self.parse_block()?;
                Ok(Stmt::Synchronized(SynchronizedStmt {
                    lock,
                    body,
                    range: Span::new(start, self.cur.prev_end()),
                }))
            }
            TokenKind::ReturnKw => {
                self.cur.bump();
                let expr = if self.at_expression_start() {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                self.eat_semicolon("return statement");
                Ok(Stmt::Return(ReturnStmt {
                    expr,
                    range: Span::new(start, self.cur.prev_end()),
                }))
            }
            TokenKind::ThrowKw => {
                self.cur.bump();
                let expr = self.parse_expression()?;
                self.eat_semicolon("throw statement");
                Ok(Stmt::Throw(ThrowStmt {
                    expr,
                    range: Span::new(start, self.cur.prev_end()),
                }))
            }
            TokenKind::BreakKw => {
                self.cur.bump();
                let label = self.parse_optional_label();
                self.eat_semicolon("break statement");
                Ok(Stmt::Break(BreakStmt {
                    label,
                    range: Span::new(start, self.cur.prev_end()),
                }))
            }
            TokenKind::ContinueKw => {
                self.cur.bump();
                let label = self.parse_optional_label();
                self.eat_semicolon("continue statement");
                Ok(Stmt::Continue(ContinueStmt {
                    label,
                    range: Span::new(start, self.cur.prev_end()),
                }))
            }
            TokenKind::AssertKw => {
                self.cur.bump();
                let cond = self.parse_expression()?;
                let detail = if self.cur.eat(TokenKind::Colon) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                self.eat_semicolon("assert statement");
                Ok(Stmt::Assert(AssertStmt {
                    cond,
                    detail,
                    range: Span::new(start, self.cur.prev_end()),
                }))
            }
            // Dangling clauses with no owner are discarded, never promoted.
            TokenKind::CatchKw | TokenKind::FinallyKw | TokenKind::ElseKw => {
                let token = self.cur.bump();
                self.sink.error(
                    "SYN_DANGLING_CLAUSE",
                    format!("`{}` has nothing to attach to", token.text(self.cur.source)),
                    token.range,
                );
                if self.cur.eat(TokenKind::LParen) {
                    self.cur.skip_balanced(TokenKind::LParen, TokenKind::RParen);
                }
                if self.cur.eat(TokenKind::LBrace) {
                    self.cur.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                }
                Ok(Stmt::Empty(token.range))
            }
            // Labeled statement.
            kind if kind.is_identifier_like()
                && kind != TokenKind::CompletionIdent
                && self.cur.nth(1) == TokenKind::Colon =>
            {
                let token = self.cur.bump();
                let label = token.text(self.cur.source).to_string();
                self.cur.bump();
                let stmt = self.parse_single_statement()?;
                Ok(Stmt::Labeled(LabeledStmt {
                    label,
                    stmt: Box::new(stmt),
                    range: Span::new(start, self.cur.prev_end()),
                }))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.eat_semicolon("expression statement");
                Ok(Stmt::Expr(ExprStmt {
                    expr,
                    range: Span::new(start, self.cur.prev_end()),
                }))
            }
        }
    }

    fn eat_semicolon(&mut self, what: &str) {
        if !self.cur.eat(TokenKind::Semicolon) {
            self.sink.error(
                "SYN_SEMICOLON",
                format!("expected `;` after {what}"),
                Span::empty(self.cur.prev_end()),
            );
        }
    }

    fn parse_optional_label(&mut self) -> Option<String> {
        match self.cur.peek() {
            TokenKind::CompletionIdent => {
                let token = self.cur.bump();
                let prefix = self.cur.text(token).to_string();
                self.sink.capture(
                    CompletionRole::Label,
                    String::new(),
                    prefix.clone(),
                    token.range.start,
                    token.range,
                );
                Some(format!("<{}:{}>", CompletionRole::Label.tag(), prefix))
            }
            kind if kind.is_identifier_like() => {
                let token = self.cur.bump();
                Some(self.cur.text(token).to_string())
            }
            _ => None,
        }
    }

    fn parse_block(&mut self) -> StmtResult<Block> {
        let start = self.cur.offset();
        if !self.cur.eat(TokenKind::LBrace) {
            self.sink.error(
                "SYN_BLOCK",
                "expected `{`",
                Span::empty(self.cur.offset()),
            );
            return Err(StmtFail);
        }
        let mut statements = Vec::new();
        self.parse_stmt_list(&mut statements)?;
        if !self.cur.eat(TokenKind::RBrace) {
            self.sink.error(
                "SYN_UNCLOSED_BLOCK",
                "block is missing its closing `}`",
                Span::empty(self.cur.prev_end()),
            );
        }
        Ok(Block {
            statements,
            range: Span::new(start, self.cur.prev_end()),
        })
    }

    fn parse_if(&mut self, start: usize) -> StmtResult<Stmt> {
        self.cur.bump();
        self.cur.expect(TokenKind::LParen, &mut self.sink, "expected `(` after `if`");
        let cond = self.parse_expression()?;
        self.cur.expect(TokenKind::RParen, &mut self.sink, "expected `)`");
        let then_branch = Box::new(self.parse_single_statement()?);
        let else_branch = if self.cur.eat(TokenKind::ElseKw) {
            Some(Box::new(self.parse_single_statement()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            cond,
            then_branch,
            else_branch,
            range: Span::new(start, self.cur.prev_end()),
        }))
    }

    fn parse_while(&mut self, start: usize) -> StmtResult<Stmt> {
        self.cur.bump();
        self.cur.expect(TokenKind::LParen, &mut self.sink, "expected `(` after `while`");
        let cond = self.parse_expression()?;
        self.cur.expect(TokenKind::RParen, &mut self.sink, "expected `)`");
        let body = Box::new(self.parse_single_statement()?);
        Ok(Stmt::While(WhileStmt {
            cond,
            body,
            range: Span::new(start, self.cur.prev_end()),
        }))
    }

    fn parse_do_while(&mut self, start: usize) -> StmtResult<Stmt> {
        self.cur.bump();
        let body = Box::new(self.parse_single_statement()?);
        self.cur.expect(TokenKind::WhileKw, &mut self.sink, "expected `while` after `do` body");
        self.cur.expect(TokenKind::LParen, &mut self.sink, "expected `(`");
        let cond = self.parse_expression()?;
        self.cur.expect(TokenKind::RParen, &mut self.sink, "expected `)`");
        self.eat_semicolon("do-while statement");
        Ok(Stmt::DoWhile(DoWhileStmt {
            body,
            cond,
            range: Span::new(start, self.cur.prev_end()),
        }))
    }

    fn parse_for(&mut self, start: usize) -> StmtResult<Stmt> {
        let for_token = self.cur.bump();
        self.cur.expect(TokenKind::LParen, &mut self.sink, "expected `(` after `for`");

        if let Some(colon_pos) = self.scan_foreach_header() {
            let _ = colon_pos;
            gate_feature(&mut self.sink, self.options, JavaFeature::EnhancedFor, for_token.range);
            let modifiers = parse_modifiers(&mut self.cur, &mut self.sink);
            let ty = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Type)
                .ok_or(StmtFail)?;
            self.gate_var(&ty);
            let name_token = self.cur.bump();
            let name = self.cur.text(name_token).to_string();
            self.cur.expect(TokenKind::Colon, &mut self.sink, "expected `:`");
            let iterable = self.parse_expression()?;
            self.cur.expect(TokenKind::RParen, &mut self.sink, "expected `)`");
            let body = Box::new(self.parse_single_statement()?);
            return Ok(Stmt::ForEach(ForEachStmt {
                modifiers,
                ty,
                name,
                name_range: name_token.range,
                iterable,
                body,
                range: Span::new(start, self.cur.prev_end()),
            }));
        }

        let mut init = Vec::new();
        if !self.cur.at(TokenKind::Semicolon) {
            if self.at_local_var_start() {
                self.parse_local_var_decls(&mut init, false)?;
            } else {
                loop {
                    let at = self.cur.offset();
                    let expr = self.parse_expression()?;
                    init.push(Stmt::Expr(ExprStmt {
                        expr,
                        range: Span::new(at, self.cur.prev_end()),
                    }));
                    if !self.cur.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
        }
        self.cur.expect(TokenKind::Semicolon, &mut self.sink, "expected `;` in `for` header");
        let cond = if self.cur.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.cur.expect(TokenKind::Semicolon, &mut self.sink, "expected `;` in `for` header");
        let mut update = Vec::new();
        if !self.cur.at(TokenKind::RParen) {
            loop {
                update.push(self.parse_expression()?);
                if !self.cur.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.cur.expect(TokenKind::RParen, &mut self.sink, "expected `)`");
        let body = Box::new(self.parse_single_statement()?);
        Ok(Stmt::For(ForStmt {
            init,
            cond,
            update,
            body,
            range: Span::new(start, self.cur.prev_end()),
        }))
    }

    /// `for (` has been consumed; does a `Type name :` header follow?
    fn scan_foreach_header(&self) -> Option<usize> {
        let mut n = 0;
        while modifier_for(self.cur.nth(n)).is_some() {
            n += 1;
        }
        let m = scan_type(&self.cur, n)?;
        if self.cur.nth(m).is_identifier_like() && self.cur.nth(m + 1) == TokenKind::Colon {
            Some(m + 1)
        } else {
            None
        }
    }

    fn parse_switch(&mut self, start: usize) -> StmtResult<Stmt> {
        self.cur.bump();
        self.cur.expect(TokenKind::LParen, &mut self.sink, "expected `(` after `switch`");
        let scrutinee = self.parse_expression()?;
        self.cur.expect(TokenKind::RParen, &mut self.sink, "expected `)`");
        self.cur.expect(TokenKind::LBrace, &mut self.sink, "expected `{`");
        let mut groups: Vec<SwitchGroup> = Vec::new();
        loop {
            match self.cur.peek() {
                TokenKind::RBrace => {
                    self.cur.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.sink.error(
                        "SYN_UNCLOSED_SWITCH",
                        "switch is missing its closing `}`",
                        Span::empty(self.cur.prev_end()),
                    );
                    break;
                }
                TokenKind::CaseKw => {
                    self.cur.bump();
                    let label = SwitchLabel::Case(self.parse_expression()?);
                    self.cur.expect(TokenKind::Colon, &mut self.sink, "expected `:` after case label");
                    groups.push(SwitchGroup {
                        labels: vec![label],
                        statements: Vec::new(),
                    });
                }
                TokenKind::DefaultKw => {
                    let token = self.cur.bump();
                    self.cur.expect(TokenKind::Colon, &mut self.sink, "expected `:` after `default`");
                    groups.push(SwitchGroup {
                        labels: vec![SwitchLabel::Default(token.range)],
                        statements: Vec::new(),
                    });
                }
                _ => {
                    if groups.is_empty() {
                        groups.push(SwitchGroup {
                            labels: Vec::new(),
                            statements: Vec::new(),
                        });
                    }
                    let mut scratch = Vec::new();
                    self.parse_statement_into(&mut scratch)?;
                    groups
                        .last_mut()
                        .expect("group pushed above")
                        .statements
                        .append(&mut scratch);
                }
            }
        }
        Ok(Stmt::Switch(SwitchStmt {
            scrutinee,
            groups,
            range: Span::new(start, self.cur.prev_end()),
        }))
    }

    fn parse_try(&mut self, start: usize) -> StmtResult<Stmt> {
        self.cur.bump();
        let mut resources = Vec::new();
        if self.cur.eat(TokenKind::LParen) {
            loop {
                if self.cur.eat(TokenKind::RParen) || self.cur.at_end() {
                    break;
                }
                match self.parse_resource()? {
                    Some(res) => resources.push(res),
                    None => break,
                }
                if !self.cur.eat(TokenKind::Semicolon) {
                    self.cur.expect(TokenKind::RParen, &mut self.sink, "expected `)` after resources");
                    break;
                }
            }
        }
        let block = self.parse_block()?;
        let mut catches = Vec::new();
        while self.cur.at(TokenKind::CatchKw) {
            catches.push(self.parse_catch()?);
        }
        let finally = if self.cur.eat(TokenKind::FinallyKw) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::Try(TryStmt {
            resources,
            block,
            catches,
            finally,
            range: Span::new(start, self.cur.prev_end()),
        }))
    }

    fn parse_resource(&mut self) -> StmtResult<Option<LocalVarStmt>> {
        let start = self.cur.offset();
        let modifiers = parse_modifiers(&mut self.cur, &mut self.sink);
        let Some(ty) = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Type) else {
            return Ok(None);
        };
        self.gate_var(&ty);
        let name_token = self.cur.bump();
        let name = self.cur.text(name_token).to_string();
        let initializer = if self.cur.eat(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Some(LocalVarStmt {
            modifiers,
            ty,
            name,
            name_range: name_token.range,
            initializer,
            range: Span::new(start, self.cur.prev_end()),
        }))
    }

    /// A malformed catch header still yields a catch clause attached to its
    /// `try`; missing pieces degrade to empty names and blocks.
    fn parse_catch(&mut self) -> StmtResult<CatchClause> {
        let start = self.cur.offset();
        self.cur.bump();
        let opened = self.cur.eat(TokenKind::LParen);
        if !opened {
            self.sink.error(
                "SYN_CATCH",
                "expected `(` after `catch`",
                Span::empty(self.cur.offset()),
            );
        }
        parse_modifiers(&mut self.cur, &mut self.sink);
        let mut types = Vec::new();
        loop {
            match parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Exception) {
                Some(ty) => types.push(ty),
                None => {
                    self.sink.error(
                        "SYN_CATCH_TYPE",
                        "expected an exception type",
                        Span::empty(self.cur.offset()),
                    );
                    break;
                }
            }
            if !self.cur.eat(TokenKind::Pipe) {
                break;
            }
        }
        let (name, name_range) = match self.cur.peek() {
            kind if kind.is_identifier_like() && kind != TokenKind::CompletionIdent => {
                let token = self.cur.bump();
                (self.cur.text(token).to_string(), token.range)
            }
            _ => (String::new(), Span::empty(self.cur.prev_end())),
        };
        if opened && !self.cur.eat(TokenKind::RParen) {
            self.sink.error(
                "SYN_CATCH",
                "catch header is missing its closing `)`",
                Span::empty(self.cur.prev_end()),
            );
        }
        let body = if self.cur.at(TokenKind::LBrace) {
            self.parse_block()?
        } else {
            Block {
                statements: Vec::new(),
                range: Span::empty(self.cur.prev_end()),
            }
        };
        Ok(CatchClause {
            types,
            name,
            name_range,
            body,
            range: Span::new(start, self.cur.prev_end()),
        })
    }

    // --- Local declarations ---

    fn at_local_type_start(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => true,
            TokenKind::AbstractKw | TokenKind::FinalKw | TokenKind::StaticKw => matches!(
                self.cur.nth(1),
                TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw
            ),
            _ => false,
        }
    }

    /// Local classes only enter the tree under statement recovery; without
    /// it the declaration is balanced over and dropped.
    fn parse_local_type(&mut self) -> StmtResult<Option<Stmt>> {
        let start = self.cur.offset();
        let modifiers = parse_modifiers(&mut self.cur, &mut self.sink);
        let kind = match self.cur.bump().kind {
            TokenKind::InterfaceKw => TypeKind::Interface,
            TokenKind::EnumKw => TypeKind::Enum,
            _ => TypeKind::Class,
        };
        let (name, name_range) = match self.cur.peek() {
            k if k.is_identifier_like() => {
                let token = self.cur.bump();
                (self.cur.text(token).to_string(), token.range)
            }
            _ => {
                self.sink.error(
                    "SYN_LOCAL_TYPE",
                    "expected a name for the local type",
                    Span::empty(self.cur.offset()),
                );
                return Ok(None);
            }
        };
        let mut extends = Vec::new();
        if self.cur.eat(TokenKind::ExtendsKw) {
            if let Some(ty) = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Class) {
                extends.push(ty);
            }
        }
        let mut implements = Vec::new();
        if self.cur.eat(TokenKind::ImplementsKw) {
            loop {
                match parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Interface) {
                    Some(ty) => implements.push(ty),
                    None => break,
                }
                if !self.cur.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let body_start = self.cur.offset();
        if self.cur.eat(TokenKind::LBrace) {
            self.cur.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
        }
        let end = self.cur.prev_end();
        if !self.options.statements_recovery {
            return Ok(None);
        }
        Ok(Some(Stmt::LocalType(TypeDecl {
            kind,
            modifiers,
            name,
            name_range,
            extends,
            implements,
            permits: Vec::new(),
            components: Vec::new(),
            constants: Vec::new(),
            members: Vec::new(),
            body_range: Span::new(body_start, end),
            range: Span::new(start, end),
        })))
    }

    fn at_local_var_start(&self) -> bool {
        let mut n = 0;
        while modifier_for(self.cur.nth(n)).is_some() {
            n += 1;
        }
        let kind = self.cur.nth(n);
        if kind.is_primitive_type() {
            // `int.class` is an expression, `int x` a declaration.
            return self.cur.nth(n + 1) != TokenKind::Dot;
        }
        if !kind.is_identifier_like() || kind == TokenKind::CompletionIdent {
            return false;
        }
        match scan_type(&self.cur, n) {
            Some(m) => {
                let next = self.cur.nth(m);
                next.is_identifier_like() && next != TokenKind::CompletionIdent
            }
            None => false,
        }
    }

    fn gate_var(&mut self, ty: &TypeRef) {
        if ty.text == "var" {
            gate_feature(&mut self.sink, self.options, JavaFeature::VarLocalInference, ty.range);
        }
    }

    fn parse_local_var_into(&mut self, out: &mut Vec<Stmt>) -> StmtResult<()> {
        self.parse_local_var_decls(out, true)
    }

    /// One local-variable statement, split per declarator.
    fn parse_local_var_decls(&mut self, out: &mut Vec<Stmt>, semicolon: bool) -> StmtResult<()> {
        let start = self.cur.offset();
        let modifiers = parse_modifiers(&mut self.cur, &mut self.sink);
        let ty = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Type)
            .ok_or(StmtFail)?;
        self.gate_var(&ty);
        let mut decl_start = start;
        loop {
            let name_token = self.cur.bump();
            let name = self.cur.text(name_token).to_string();
            let mut decl_ty = ty.clone();
            while self.cur.at(TokenKind::LBracket) && self.cur.nth(1) == TokenKind::RBracket {
                self.cur.bump();
                self.cur.bump();
                decl_ty.text.push_str("[]");
            }
            let initializer = if self.cur.eat(TokenKind::Eq) {
                Some(self.parse_initializer_value()?)
            } else {
                None
            };
            out.push(Stmt::LocalVar(LocalVarStmt {
                modifiers: modifiers.clone(),
                ty: decl_ty,
                name,
                name_range: name_token.range,
                initializer,
                range: Span::new(decl_start, self.cur.prev_end()),
            }));
            if !self.cur.eat(TokenKind::Comma) {
                break;
            }
            decl_start = self.cur.offset();
            if !self.cur.peek().is_identifier_like() {
                self.sink.error(
                    "SYN_DECLARATOR",
                    "expected another declarator after `,`",
                    Span::empty(self.cur.offset()),
                );
                break;
            }
        }
        if semicolon {
            self.eat_semicolon("variable declaration");
        }
        Ok(())
    }

    /// Initializer value: an expression or an array initializer, with the
    /// dangling-`=` salvage when recovery is on.
    fn parse_initializer_value(&mut self) -> StmtResult<Expr> {
        match self.parse_expression() {
            Ok(expr) => Ok(expr),
            Err(fail) => {
                if self.options.methods_full_recovery {
                    Ok(Expr::Missing(Span::empty(self.cur.prev_end())))
                } else {
                    Err(fail)
                }
            }
        }
    }

    // --- Expressions ---

    fn at_expression_start(&self) -> bool {
        let kind = self.cur.peek();
        kind.is_identifier_like()
            || kind.is_literal()
            || kind.is_primitive_type()
            || matches!(
                kind,
                TokenKind::LParen
                    | TokenKind::LBrace
                    | TokenKind::NewKw
                    | TokenKind::ThisKw
                    | TokenKind::SuperKw
                    | TokenKind::VoidKw
                    | TokenKind::Bang
                    | TokenKind::Tilde
                    | TokenKind::Plus
                    | TokenKind::Minus
                    | TokenKind::PlusPlus
                    | TokenKind::MinusMinus
            )
    }

    fn parse_expression(&mut self) -> StmtResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> StmtResult<Expr> {
        let lhs = self.parse_conditional()?;
        let Some(op) = assign_op_for(self.cur.peek()) else {
            return Ok(lhs);
        };
        self.cur.bump();
        // A dangling `x =` at end of input becomes an assignment to the
        // missing-value sentinel under recovery.
        let rhs = match self.parse_assignment() {
            Ok(rhs) => rhs,
            Err(fail) => {
                if self.options.methods_full_recovery {
                    Expr::Missing(Span::empty(self.cur.prev_end()))
                } else {
                    return Err(fail);
                }
            }
        };
        let range = Span::new(lhs.range().start, self.cur.prev_end());
        Ok(Expr::Assign(AssignExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            range,
        }))
    }

    fn parse_conditional(&mut self) -> StmtResult<Expr> {
        let cond = self.parse_binary(0)?;
        if !self.cur.eat(TokenKind::Question) {
            return Ok(cond);
        }
        let then_expr = self.parse_expression()?;
        self.cur.expect(TokenKind::Colon, &mut self.sink, "expected `:` in conditional");
        let else_expr = self.parse_conditional()?;
        let range = Span::new(cond.range().start, self.cur.prev_end());
        Ok(Expr::Conditional(ConditionalExpr {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            range,
        }))
    }

    fn parse_binary(&mut self, min_bp: u8) -> StmtResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let kind = self.cur.peek();

            if kind == TokenKind::InstanceofKw {
                const INSTANCEOF_BP: u8 = 9;
                if INSTANCEOF_BP < min_bp {
                    break;
                }
                self.cur.bump();
                let Some(ty) = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Type)
                else {
                    return Err(StmtFail);
                };
                let binding = if self.cur.peek().is_identifier_like()
                    && self.cur.peek() != TokenKind::CompletionIdent
                {
                    let token = self.cur.bump();
                    gate_feature(
                        &mut self.sink,
                        self.options,
                        JavaFeature::PatternMatchingInstanceof,
                        token.range,
                    );
                    Some(self.cur.text(token).to_string())
                } else {
                    None
                };
                let range = Span::new(lhs.range().start, self.cur.prev_end());
                lhs = Expr::InstanceOf(InstanceOfExpr {
                    expr: Box::new(lhs),
                    ty,
                    binding,
                    range,
                });
                continue;
            }

            // A partial keyword at the cursor in operator position: the only
            // keyword that can follow a complete operand is `instanceof`.
            if kind == TokenKind::CompletionIdent {
                let token = self.cur.current();
                let prefix = self.cur.text(token);
                if !prefix.is_empty() && "instanceof".starts_with(prefix) {
                    let token = self.cur.bump();
                    let prefix = self.cur.text(token).to_string();
                    self.sink.capture(
                        CompletionRole::Keyword,
                        String::new(),
                        prefix.clone(),
                        token.range.start,
                        token.range,
                    );
                    lhs = Expr::Completion(CompletionExpr {
                        role: CompletionRole::Keyword,
                        qualifier: String::new(),
                        prefix,
                        range: Span::new(lhs.range().start, token.range.end),
                    });
                }
                break;
            }

            let Some((l_bp, r_bp, op)) = infix_binding_power(kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.cur.bump();
            let rhs = self.parse_binary(r_bp)?;
            lhs = self.fold_binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    /// Adjacent string-literal concatenation folds to one literal when
    /// `optimize_string_literals` is set; otherwise the binary tree stays.
    fn fold_binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        if op == BinaryOp::Add && self.options.optimize_string_literals {
            if let (Expr::Literal(a), Expr::Literal(b)) = (&lhs, &rhs) {
                if a.kind == LiteralKind::String && b.kind == LiteralKind::String {
                    let merged = format!(
                        "{}{}",
                        a.text.strip_suffix('"').unwrap_or(&a.text),
                        b.text.strip_prefix('"').unwrap_or(&b.text),
                    );
                    return Expr::Literal(LiteralExpr {
                        kind: LiteralKind::String,
                        text: merged,
                        range: Span::new(a.range.start, b.range.end),
                    });
                }
            }
        }
        let range = Span::new(lhs.range().start, rhs.range().end);
        Expr::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            range,
        })
    }

    fn parse_unary(&mut self) -> StmtResult<Expr> {
        let op = match self.cur.peek() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::PlusPlus => Some(UnaryOp::Inc),
            TokenKind::MinusMinus => Some(UnaryOp::Dec),
            _ => None,
        };
        if let Some(op) = op {
            let token = self.cur.bump();
            let operand = self.parse_unary()?;
            let range = Span::new(token.range.start, operand.range().end);
            return Ok(Expr::Unary(UnaryExpr {
                op,
                postfix: false,
                operand: Box::new(operand),
                range,
            }));
        }
        if self.cur.at(TokenKind::LParen) && self.is_cast_expression() {
            let start = self.cur.offset();
            self.cur.bump();
            let ty = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Type)
                .ok_or(StmtFail)?;
            self.cur.expect(TokenKind::RParen, &mut self.sink, "expected `)` after cast type");
            let expr = self.parse_unary()?;
            let range = Span::new(start, self.cur.prev_end());
            return Ok(Expr::Cast(CastExpr {
                ty,
                expr: Box::new(expr),
                range,
            }));
        }
        self.parse_postfix()
    }

    /// `(` is current: a cast when a type-shaped run reaches `)` and an
    /// operand can start right after. Primitive-typed parens are always
    /// casts.
    fn is_cast_expression(&self) -> bool {
        let Some(m) = scan_type(&self.cur, 1) else {
            return false;
        };
        if self.cur.nth(m) != TokenKind::RParen {
            return false;
        }
        if self.cur.nth(1).is_primitive_type() {
            return true;
        }
        let after = self.cur.nth(m + 1);
        after.is_identifier_like()
            || after.is_literal()
            || matches!(
                after,
                TokenKind::LParen
                    | TokenKind::ThisKw
                    | TokenKind::SuperKw
                    | TokenKind::NewKw
                    | TokenKind::Bang
                    | TokenKind::Tilde
            )
    }

    fn parse_postfix(&mut self) -> StmtResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            // The completion marker terminates any chain.
            if expr.is_completion() {
                break;
            }
            match self.cur.peek() {
                TokenKind::Dot => match self.cur.nth(1) {
                    TokenKind::ClassKw => {
                        self.cur.bump();
                        self.cur.bump();
                        let text = printer::expr_to_string(&expr);
                        let range = Span::new(expr.range().start, self.cur.prev_end());
                        expr = Expr::ClassLiteral(ClassLiteralExpr {
                            ty: TypeRef {
                                text,
                                range: expr.range(),
                            },
                            range,
                        });
                    }
                    TokenKind::NewKw => {
                        self.cur.bump();
                        expr = self.parse_new(Some(expr))?;
                    }
                    TokenKind::CompletionIdent => {
                        self.cur.bump();
                        let token = self.cur.bump();
                        let prefix = self.cur.text(token).to_string();
                        let qualifier = format!("{}.", printer::expr_to_string(&expr));
                        let chain_start = if is_name_chain(&expr) {
                            expr.range().start
                        } else {
                            token.range.start
                        };
                        self.sink.capture(
                            CompletionRole::Name,
                            qualifier.clone(),
                            prefix.clone(),
                            chain_start,
                            token.range,
                        );
                        expr = Expr::Completion(CompletionExpr {
                            role: CompletionRole::Name,
                            qualifier,
                            prefix,
                            range: Span::new(expr.range().start, token.range.end),
                        });
                    }
                    kind if kind.is_identifier_like() => {
                        self.cur.bump();
                        let token = self.cur.bump();
                        let name = self.cur.text(token).to_string();
                        if self.cur.at(TokenKind::LParen) {
                            let (args, closed) = self.parse_args()?;
                            let range = Span::new(expr.range().start, self.cur.prev_end());
                            let call = CallExpr {
                                receiver: Some(Box::new(expr)),
                                name,
                                name_range: token.range,
                                args,
                                closed,
                                range,
                            };
                            self.promote_message_send(&call);
                            expr = Expr::Call(call);
                        } else {
                            let range = Span::new(expr.range().start, token.range.end);
                            expr = Expr::FieldAccess(FieldAccessExpr {
                                receiver: Box::new(expr),
                                name,
                                name_range: token.range,
                                range,
                            });
                        }
                    }
                    _ => break,
                },
                TokenKind::LBracket => {
                    if self.cur.nth(1) == TokenKind::RBracket {
                        // `Type[].class` or a class-literal completion.
                        expr = self.parse_array_class_literal(expr)?;
                        continue;
                    }
                    self.cur.bump();
                    let index = self.parse_expression()?;
                    self.cur.expect(TokenKind::RBracket, &mut self.sink, "expected `]`");
                    let range = Span::new(expr.range().start, self.cur.prev_end());
                    expr = Expr::ArrayAccess(ArrayAccessExpr {
                        array: Box::new(expr),
                        index: Box::new(index),
                        range,
                    });
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let token = self.cur.bump();
                    let op = if token.kind == TokenKind::PlusPlus {
                        UnaryOp::Inc
                    } else {
                        UnaryOp::Dec
                    };
                    let range = Span::new(expr.range().start, token.range.end);
                    expr = Expr::Unary(UnaryExpr {
                        op,
                        postfix: true,
                        operand: Box::new(expr),
                        range,
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_array_class_literal(&mut self, base: Expr) -> StmtResult<Expr> {
        let mut text = printer::expr_to_string(&base);
        while self.cur.at(TokenKind::LBracket) && self.cur.nth(1) == TokenKind::RBracket {
            self.cur.bump();
            self.cur.bump();
            text.push_str("[]");
        }
        let ty = TypeRef {
            text: text.clone(),
            range: Span::new(base.range().start, self.cur.prev_end()),
        };
        if !self.cur.eat(TokenKind::Dot) {
            self.sink.error(
                "SYN_CLASS_LITERAL",
                "expected `.class` after array type",
                Span::empty(self.cur.offset()),
            );
            return Err(StmtFail);
        }
        match self.cur.peek() {
            TokenKind::ClassKw => {
                self.cur.bump();
                let range = Span::new(base.range().start, self.cur.prev_end());
                Ok(Expr::ClassLiteral(ClassLiteralExpr { ty, range }))
            }
            TokenKind::CompletionIdent => {
                let token = self.cur.bump();
                let prefix = self.cur.text(token).to_string();
                let qualifier = format!("{text}.");
                self.sink.capture(
                    CompletionRole::ClassLiteralAccess,
                    qualifier.clone(),
                    prefix.clone(),
                    base.range().start,
                    token.range,
                );
                Ok(Expr::Completion(CompletionExpr {
                    role: CompletionRole::ClassLiteralAccess,
                    qualifier,
                    prefix,
                    range: Span::new(base.range().start, token.range.end),
                }))
            }
            _ => {
                self.sink.error(
                    "SYN_CLASS_LITERAL",
                    "expected `class` after array type",
                    Span::empty(self.cur.offset()),
                );
                Err(StmtFail)
            }
        }
    }

    fn promote_message_send(&mut self, call: &CallExpr) {
        if !call.closed && call.args.iter().any(Expr::is_completion) {
            self.sink.promote(CompletionRole::MessageSend, call.range);
        }
    }

    fn parse_args(&mut self) -> StmtResult<(Vec<Expr>, bool)> {
        self.cur.bump();
        let mut args = Vec::new();
        let closed = loop {
            match self.cur.peek() {
                TokenKind::RParen => {
                    self.cur.bump();
                    break true;
                }
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::RBrace => {
                    self.sink.error(
                        "SYN_ARGS",
                        "argument list is missing its closing `)`",
                        Span::empty(self.cur.prev_end()),
                    );
                    break false;
                }
                _ => {}
            }
            match self.parse_expression() {
                Ok(arg) => args.push(arg),
                Err(_) => break false,
            }
            if !self.cur.eat(TokenKind::Comma) && !self.cur.at(TokenKind::RParen) {
                self.sink.error(
                    "SYN_ARGS",
                    "expected `,` or `)` in argument list",
                    Span::empty(self.cur.offset()),
                );
                break false;
            }
        };
        Ok((args, closed))
    }

    fn parse_new(&mut self, qualifier: Option<Expr>) -> StmtResult<Expr> {
        let start = qualifier
            .as_ref()
            .map(|q| q.range().start)
            .unwrap_or_else(|| self.cur.offset());
        self.cur.bump();
        let Some(ty) = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Type) else {
            self.sink.error(
                "SYN_NEW",
                "expected a type after `new`",
                Span::empty(self.cur.offset()),
            );
            return Err(StmtFail);
        };
        let ty_has_marker = self.sink.completion.as_ref().is_some_and(|c| {
            c.promote_span.is_none()
                && c.marker_span.start >= ty.range.start
                && c.marker_span.end <= ty.range.end
        });

        if self.cur.at(TokenKind::LBracket) {
            // Array allocation, with explicit or initializer-implied dims.
            let mut dims = Vec::new();
            while self.cur.eat(TokenKind::LBracket) {
                if self.cur.eat(TokenKind::RBracket) {
                    dims.push(None);
                    continue;
                }
                let dim = self.parse_expression()?;
                self.cur.expect(TokenKind::RBracket, &mut self.sink, "expected `]`");
                dims.push(Some(dim));
            }
            let initializer = if self.cur.at(TokenKind::LBrace) {
                Some(Box::new(self.parse_array_initializer()?))
            } else {
                None
            };
            let range = Span::new(start, self.cur.prev_end());
            return Ok(Expr::ArrayNew(ArrayNewExpr {
                ty,
                dims,
                initializer,
                range,
            }));
        }

        let (args, closed) = if self.cur.at(TokenKind::LParen) {
            self.parse_args()?
        } else {
            (Vec::new(), false)
        };
        let anon_body = if self.cur.at(TokenKind::LBrace) {
            self.cur.bump();
            self.cur.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
            if self.options.statements_recovery {
                Some(Vec::new())
            } else {
                None
            }
        } else {
            None
        };
        let range = Span::new(start, self.cur.prev_end());
        let new_expr = NewExpr {
            qualifier: qualifier.map(Box::new),
            ty,
            args,
            anon_body,
            closed,
            range,
        };
        if ty_has_marker || new_expr.args.iter().any(Expr::is_completion) {
            let role = if new_expr.qualifier.is_some() {
                CompletionRole::QualifiedAllocation
            } else {
                CompletionRole::Allocation
            };
            self.sink.promote(role, range);
        }
        Ok(Expr::New(new_expr))
    }

    fn parse_array_initializer(&mut self) -> StmtResult<Expr> {
        let start = self.cur.offset();
        self.cur.bump();
        let mut elements = Vec::new();
        loop {
            match self.cur.peek() {
                TokenKind::RBrace => {
                    self.cur.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.sink.error(
                        "SYN_ARRAY_INIT",
                        "array initializer is missing its closing `}`",
                        Span::empty(self.cur.prev_end()),
                    );
                    break;
                }
                TokenKind::Comma => {
                    self.cur.bump();
                }
                _ => elements.push(self.parse_expression()?),
            }
        }
        Ok(Expr::ArrayInit(ArrayInitExpr {
            elements,
            range: Span::new(start, self.cur.prev_end()),
        }))
    }

    fn parse_primary(&mut self) -> StmtResult<Expr> {
        let token = self.cur.current();
        if let Some(kind) = literal_kind_for(token.kind) {
            self.cur.bump();
            if token.kind == TokenKind::TextBlock {
                gate_feature(&mut self.sink, self.options, JavaFeature::TextBlocks, token.range);
            }
            return Ok(Expr::Literal(LiteralExpr {
                kind,
                text: token.text(self.cur.source).to_string(),
                range: token.range,
            }));
        }
        match token.kind {
            TokenKind::CompletionIdent => {
                self.cur.bump();
                let prefix = self.cur.text(token).to_string();
                self.sink.capture(
                    CompletionRole::Name,
                    String::new(),
                    prefix.clone(),
                    token.range.start,
                    token.range,
                );
                Ok(Expr::Completion(CompletionExpr {
                    role: CompletionRole::Name,
                    qualifier: String::new(),
                    prefix,
                    range: token.range,
                }))
            }
            kind if kind.is_identifier_like() => {
                self.cur.bump();
                let name = self.cur.text(token).to_string();
                if self.cur.at(TokenKind::LParen) {
                    let (args, closed) = self.parse_args()?;
                    let range = Span::new(token.range.start, self.cur.prev_end());
                    let call = CallExpr {
                        receiver: None,
                        name,
                        name_range: token.range,
                        args,
                        closed,
                        range,
                    };
                    self.promote_message_send(&call);
                    return Ok(Expr::Call(call));
                }
                Ok(Expr::Name(NameExpr {
                    name,
                    range: token.range,
                }))
            }
            kind if kind.is_primitive_type() || kind == TokenKind::VoidKw => {
                // Primitive primary: only valid as `int.class`, possibly
                // with array dims.
                let ty = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Type)
                    .ok_or(StmtFail)?;
                if !self.cur.eat(TokenKind::Dot) {
                    self.sink.error(
                        "SYN_PRIMITIVE",
                        "expected `.class` after primitive type",
                        Span::empty(self.cur.offset()),
                    );
                    return Err(StmtFail);
                }
                match self.cur.peek() {
                    TokenKind::ClassKw => {
                        self.cur.bump();
                        let range = Span::new(token.range.start, self.cur.prev_end());
                        Ok(Expr::ClassLiteral(ClassLiteralExpr { ty, range }))
                    }
                    TokenKind::CompletionIdent => {
                        let marker = self.cur.bump();
                        let prefix = self.cur.text(marker).to_string();
                        let qualifier = format!("{}.", ty.text);
                        self.sink.capture(
                            CompletionRole::ClassLiteralAccess,
                            qualifier.clone(),
                            prefix.clone(),
                            token.range.start,
                            marker.range,
                        );
                        Ok(Expr::Completion(CompletionExpr {
                            role: CompletionRole::ClassLiteralAccess,
                            qualifier,
                            prefix,
                            range: Span::new(token.range.start, marker.range.end),
                        }))
                    }
                    _ => Err(StmtFail),
                }
            }
            TokenKind::LParen => {
                self.cur.bump();
                let inner = self.parse_expression()?;
                self.cur.expect(TokenKind::RParen, &mut self.sink, "expected `)`");
                let range = Span::new(token.range.start, self.cur.prev_end());
                Ok(Expr::Paren(ParenExpr {
                    inner: Box::new(inner),
                    range,
                }))
            }
            TokenKind::ThisKw => {
                self.cur.bump();
                if self.cur.at(TokenKind::LParen) {
                    let (args, closed) = self.parse_args()?;
                    let range = Span::new(token.range.start, self.cur.prev_end());
                    return Ok(Expr::Call(CallExpr {
                        receiver: None,
                        name: "this".to_string(),
                        name_range: token.range,
                        args,
                        closed,
                        range,
                    }));
                }
                Ok(Expr::This(token.range))
            }
            TokenKind::SuperKw => {
                self.cur.bump();
                if self.cur.at(TokenKind::LParen) {
                    let (args, closed) = self.parse_args()?;
                    let range = Span::new(token.range.start, self.cur.prev_end());
                    return Ok(Expr::Call(CallExpr {
                        receiver: None,
                        name: "super".to_string(),
                        name_range: token.range,
                        args,
                        closed,
                        range,
                    }));
                }
                Ok(Expr::Super(token.range))
            }
            TokenKind::NewKw => self.parse_new(None),
            TokenKind::LBrace => self.parse_array_initializer(),
            _ => {
                self.sink.error(
                    "SYN_EXPRESSION",
                    "expected an expression",
                    token.range,
                );
                Err(StmtFail)
            }
        }
    }
}

/// Is this a pure dotted-name chain (the shape the qualified-name
/// replaced-source rule applies to)?
fn is_name_chain(expr: &Expr) -> bool {
    match expr {
        Expr::Name(_) => true,
        Expr::FieldAccess(access) => is_name_chain(&access.receiver),
        _ => false,
    }
}

fn literal_kind_for(kind: TokenKind) -> Option<LiteralKind> {
    Some(match kind {
        TokenKind::IntLiteral => LiteralKind::Int,
        TokenKind::LongLiteral => LiteralKind::Long,
        TokenKind::FloatLiteral => LiteralKind::Float,
        TokenKind::DoubleLiteral => LiteralKind::Double,
        TokenKind::CharLiteral => LiteralKind::Char,
        TokenKind::StringLiteral => LiteralKind::String,
        TokenKind::TextBlock => LiteralKind::TextBlock,
        TokenKind::TrueKw | TokenKind::FalseKw => LiteralKind::Bool,
        TokenKind::NullKw => LiteralKind::Null,
        _ => return None,
    })
}

fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8, BinaryOp)> {
    let (bp, op) = match kind {
        TokenKind::PipePipe => (3, BinaryOp::Or),
        TokenKind::AmpAmp => (4, BinaryOp::And),
        TokenKind::Pipe => (5, BinaryOp::BitOr),
        TokenKind::Caret => (6, BinaryOp::BitXor),
        TokenKind::Amp => (7, BinaryOp::BitAnd),
        TokenKind::EqEq => (8, BinaryOp::Eq),
        TokenKind::BangEq => (8, BinaryOp::Ne),
        TokenKind::Less => (9, BinaryOp::Lt),
        TokenKind::Greater => (9, BinaryOp::Gt),
        TokenKind::LessEq => (9, BinaryOp::Le),
        TokenKind::GreaterEq => (9, BinaryOp::Ge),
        TokenKind::LeftShift => (10, BinaryOp::Shl),
        TokenKind::RightShift => (10, BinaryOp::Shr),
        TokenKind::UnsignedRightShift => (10, BinaryOp::UShr),
        TokenKind::Plus => (11, BinaryOp::Add),
        TokenKind::Minus => (11, BinaryOp::Sub),
        TokenKind::Star => (12, BinaryOp::Mul),
        TokenKind::Slash => (12, BinaryOp::Div),
        TokenKind::Percent => (12, BinaryOp::Rem),
        _ => return None,
    };
    Some((bp, bp + 1, op))
}

fn assign_op_for(kind: TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::Add,
        TokenKind::MinusEq => AssignOp::Sub,
        TokenKind::StarEq => AssignOp::Mul,
        TokenKind::SlashEq => AssignOp::Div,
        TokenKind::PercentEq => AssignOp::Rem,
        TokenKind::AmpEq => AssignOp::And,
        TokenKind::PipeEq => AssignOp::Or,
        TokenKind::CaretEq => AssignOp::Xor,
        TokenKind::LeftShiftEq => AssignOp::Shl,
        TokenKind::RightShiftEq => AssignOp::Shr,
        TokenKind::UnsignedRightShiftEq => AssignOp::UShr,
        _ => return None,
    })
}
