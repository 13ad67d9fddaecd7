//! Diet pass: declaration structure only.
//!
//! Recognizes package/import clauses and declaration headers, skips
//! method/initializer bodies in balanced-brace mode, and records each
//! skipped span so a later body pass can re-enter it. Malformed headers go
//! through checkpoint recovery instead of aborting; the pass always yields a
//! compilation unit.

use quill_core::{Diagnostic, Span};

use crate::ast::*;
use crate::language_level::JavaFeature;
use crate::token::{Token, TokenKind};
use crate::ParseOptions;

use super::recovery::{self, FrameKind, RecoveryContext};
use super::{gate_feature, parse_modifiers, parse_type_ref, CompletionCapture, Cursor, Sink};

pub(crate) struct DietOutput {
    pub unit: CompilationUnit,
    pub skipped: Vec<SkippedBodySpan>,
    pub diagnostics: Vec<Diagnostic>,
    pub completion: Option<CompletionCapture>,
}

pub(crate) fn run(source: &str, tokens: &[Token], options: &ParseOptions) -> DietOutput {
    let mut parser = DietParser {
        cur: Cursor::full(source, tokens),
        sink: Sink::default(),
        ctx: RecoveryContext::default(),
        options,
        skipped: Vec::new(),
    };
    let unit = parser.parse_unit();
    DietOutput {
        unit,
        skipped: parser.skipped,
        diagnostics: parser.sink.diagnostics,
        completion: parser.sink.completion,
    }
}

struct DietParser<'a> {
    cur: Cursor<'a>,
    sink: Sink,
    ctx: RecoveryContext,
    options: &'a ParseOptions,
    skipped: Vec<SkippedBodySpan>,
}

impl<'a> DietParser<'a> {
    fn parse_unit(&mut self) -> CompilationUnit {
        let mut unit = CompilationUnit {
            package: None,
            imports: Vec::new(),
            types: Vec::new(),
            range: Span::new(0, self.cur.source.len()),
        };

        // Leading annotations (package annotations) are balanced away.
        if self.cur.at(TokenKind::At) && self.cur.nth(1) != TokenKind::InterfaceKw {
            let probe = super::scan_type(&self.cur, 1);
            if probe.is_some() {
                parse_modifiers(&mut self.cur, &mut self.sink);
            }
        }

        if self.cur.at(TokenKind::PackageKw) {
            let start = self.cur.offset();
            self.cur.bump();
            let (name, _) = self.qualified_name();
            self.cur
                .expect(TokenKind::Semicolon, &mut self.sink, "expected `;` after package name");
            unit.package = Some(PackageDecl {
                name,
                range: Span::new(start, self.cur.prev_end()),
            });
        }

        while self.cur.at(TokenKind::ImportKw) {
            let start = self.cur.offset();
            self.cur.bump();
            let is_static = self.cur.eat(TokenKind::StaticKw);
            let (path, _) = self.qualified_name();
            let is_star = if self.cur.at(TokenKind::Dot) && self.cur.nth(1) == TokenKind::Star {
                self.cur.bump();
                self.cur.bump();
                true
            } else {
                self.cur.at(TokenKind::Star) && {
                    self.cur.bump();
                    true
                }
            };
            self.cur
                .expect(TokenKind::Semicolon, &mut self.sink, "expected `;` after import");
            unit.imports.push(ImportDecl {
                is_static,
                is_star,
                path,
                range: Span::new(start, self.cur.prev_end()),
            });
        }

        loop {
            match self.cur.peek() {
                TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.cur.bump();
                }
                TokenKind::CompletionIdent => {
                    // Top-level cursor: completing a declaration keyword.
                    let token = self.cur.bump();
                    let prefix = self.cur.text(token).to_string();
                    self.sink.capture(
                        CompletionRole::Keyword,
                        String::new(),
                        prefix,
                        token.range.start,
                        token.range,
                    );
                }
                _ => {
                    if let Some(decl) = self.parse_type_decl() {
                        unit.types.push(decl);
                    } else {
                        let span = self.cur.current().range;
                        self.sink
                            .error("SYN_TOP_LEVEL", "expected a type declaration", span);
                        recovery::recover_to_member_checkpoint(&mut self.cur);
                    }
                }
            }
        }

        unit
    }

    fn qualified_name(&mut self) -> (String, Span) {
        let start = self.cur.offset();
        let mut name = String::new();
        while self.cur.peek().is_identifier_like() {
            if self.cur.at(TokenKind::CompletionIdent) {
                let token = self.cur.bump();
                let prefix = self.cur.text(token).to_string();
                self.sink.capture(
                    CompletionRole::Name,
                    name.clone(),
                    prefix.clone(),
                    start,
                    token.range,
                );
                name = format!("<{}:{}{}>", CompletionRole::Name.tag(), name, prefix);
                break;
            }
            let token = self.cur.bump();
            name.push_str(self.cur.text(token));
            if self.cur.at(TokenKind::Dot) && self.cur.nth(1).is_identifier_like() {
                self.cur.bump();
                name.push('.');
            } else {
                break;
            }
        }
        (name, Span::new(start, self.cur.prev_end()))
    }

    fn at_type_decl_keyword(&self) -> bool {
        match self.cur.peek() {
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => true,
            TokenKind::At => self.cur.nth(1) == TokenKind::InterfaceKw,
            TokenKind::RecordKw => {
                self.cur.nth(1).is_identifier_like() && self.cur.nth(2) == TokenKind::LParen
            }
            _ => false,
        }
    }

    fn parse_type_decl(&mut self) -> Option<TypeDecl> {
        let start = self.cur.offset();
        let modifiers = parse_modifiers(&mut self.cur, &mut self.sink);
        self.parse_type_decl_tail(start, modifiers)
    }

    fn parse_type_decl_tail(&mut self, start: usize, modifiers: Vec<Modifier>) -> Option<TypeDecl> {
        let kind = match self.cur.peek() {
            TokenKind::ClassKw => {
                self.cur.bump();
                TypeKind::Class
            }
            TokenKind::InterfaceKw => {
                self.cur.bump();
                TypeKind::Interface
            }
            TokenKind::EnumKw => {
                self.cur.bump();
                TypeKind::Enum
            }
            TokenKind::RecordKw
                if self.cur.nth(1).is_identifier_like() && self.cur.nth(2) == TokenKind::LParen =>
            {
                let token = self.cur.bump();
                gate_feature(&mut self.sink, self.options, JavaFeature::Records, token.range);
                TypeKind::Record
            }
            TokenKind::At if self.cur.nth(1) == TokenKind::InterfaceKw => {
                self.cur.bump();
                self.cur.bump();
                TypeKind::Annotation
            }
            _ => return None,
        };

        if modifiers
            .iter()
            .any(|m| matches!(m, Modifier::Sealed | Modifier::NonSealed))
        {
            gate_feature(
                &mut self.sink,
                self.options,
                JavaFeature::SealedClasses,
                Span::new(start, self.cur.prev_end()),
            );
        }

        let (name, name_range) = match self.cur.peek() {
            TokenKind::CompletionIdent => {
                let token = self.cur.bump();
                let prefix = self.cur.text(token).to_string();
                self.sink.capture(
                    CompletionRole::Type,
                    String::new(),
                    prefix.clone(),
                    token.range.start,
                    token.range,
                );
                (
                    format!("<{}:{}>", CompletionRole::Type.tag(), prefix),
                    token.range,
                )
            }
            kind if kind.is_identifier_like() => {
                let token = self.cur.bump();
                (self.cur.text(token).to_string(), token.range)
            }
            _ => {
                // No name at all: not a declaration worth keeping.
                let span = self.cur.current().range;
                self.sink
                    .error("SYN_TYPE_NAME", "expected a type name", span);
                if !matches!(self.cur.peek(), TokenKind::RBrace | TokenKind::Eof) {
                    recovery::recover_to_member_checkpoint(&mut self.cur);
                }
                return None;
            }
        };

        let frame = self.ctx.push(FrameKind::Type, Some(name.clone()));

        if self.cur.at(TokenKind::Less) {
            let mut scratch = String::new();
            super::consume_type_args(&mut self.cur, &mut scratch);
        }

        let mut components = Vec::new();
        if kind == TypeKind::Record && self.cur.at(TokenKind::LParen) {
            components = self.parse_params();
        }

        let extends_role = if kind == TypeKind::Interface {
            CompletionRole::Interface
        } else {
            CompletionRole::Class
        };
        let mut extends = Vec::new();
        if self.cur.eat(TokenKind::ExtendsKw) {
            extends = self.type_ref_list(extends_role);
        }
        let mut implements = Vec::new();
        if self.cur.eat(TokenKind::ImplementsKw) {
            implements = self.type_ref_list(CompletionRole::Interface);
        }
        let mut permits = Vec::new();
        if self.cur.eat(TokenKind::PermitsKw) {
            permits = self.type_ref_list(CompletionRole::Class);
        }

        let body_start = self.cur.offset();
        if !self.cur.eat(TokenKind::LBrace) {
            // Missing-brace inference: treat what follows as the body anyway
            // and close at the next unambiguous `}` or end of input.
            self.sink.error(
                "SYN_TYPE_BODY",
                format!("expected `{{` to open the body of `{name}`"),
                Span::empty(body_start),
            );
        }

        let mut constants = Vec::new();
        if kind == TypeKind::Enum {
            constants = self.parse_enum_constants();
        }

        let mut members = Vec::new();
        loop {
            match self.cur.peek() {
                TokenKind::RBrace => {
                    self.cur.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.sink.error(
                        "SYN_UNCLOSED_TYPE",
                        format!("`{name}` is missing its closing `}}`"),
                        Span::empty(self.cur.prev_end()),
                    );
                    break;
                }
                TokenKind::Semicolon => {
                    self.cur.bump();
                }
                _ => self.parse_member(&name, &mut members),
            }
        }

        self.ctx.close(frame);
        let end = self.cur.prev_end();
        Some(TypeDecl {
            kind,
            modifiers,
            name,
            name_range,
            extends,
            implements,
            permits,
            components,
            constants,
            members,
            body_range: Span::new(body_start, end),
            range: Span::new(start, end),
        })
    }

    fn type_ref_list(&mut self, role: CompletionRole) -> Vec<TypeRef> {
        let mut list = Vec::new();
        loop {
            match parse_type_ref(&mut self.cur, &mut self.sink, role) {
                Some(ty) => list.push(ty),
                None => break,
            }
            if !self.cur.eat(TokenKind::Comma) {
                break;
            }
        }
        list
    }

    fn parse_enum_constants(&mut self) -> Vec<EnumConstant> {
        let mut constants = Vec::new();
        while self.cur.peek().is_identifier_like() {
            // A constant followed by declaration punctuation is really the
            // first member of the body.
            if !matches!(
                self.cur.nth(1),
                TokenKind::Comma
                    | TokenKind::Semicolon
                    | TokenKind::LParen
                    | TokenKind::LBrace
                    | TokenKind::RBrace
            ) {
                break;
            }
            let token = self.cur.bump();
            constants.push(EnumConstant {
                name: self.cur.text(token).to_string(),
                range: token.range,
            });
            if self.cur.at(TokenKind::LParen) {
                self.cur.bump();
                self.cur.skip_balanced(TokenKind::LParen, TokenKind::RParen);
            }
            if self.cur.at(TokenKind::LBrace) {
                // Constant class body: balanced, suppressed in diet mode.
                self.cur.bump();
                self.cur.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
            }
            if self.cur.eat(TokenKind::Comma) {
                continue;
            }
            self.cur.eat(TokenKind::Semicolon);
            break;
        }
        constants
    }

    fn parse_member(&mut self, enclosing: &str, members: &mut Vec<MemberDecl>) {
        let start = self.cur.offset();

        // Initializer blocks, static or instance.
        if self.cur.at(TokenKind::LBrace) {
            let body = self.skip_body(enclosing);
            members.push(MemberDecl::Initializer(InitializerDecl {
                is_static: false,
                body: BodyRef::Skipped(body),
                range: Span::new(start, self.cur.prev_end()),
            }));
            return;
        }
        if self.cur.at(TokenKind::StaticKw) && self.cur.nth(1) == TokenKind::LBrace {
            self.cur.bump();
            let body = self.skip_body(enclosing);
            members.push(MemberDecl::Initializer(InitializerDecl {
                is_static: true,
                body: BodyRef::Skipped(body),
                range: Span::new(start, self.cur.prev_end()),
            }));
            return;
        }

        let modifiers = parse_modifiers(&mut self.cur, &mut self.sink);

        if self.at_type_decl_keyword() {
            if let Some(decl) = self.parse_type_decl_tail(start, modifiers) {
                members.push(MemberDecl::Type(decl));
            }
            return;
        }

        // Generic method/constructor header: the type-parameter list is
        // balanced over, it never reaches the declared type text.
        if self.cur.at(TokenKind::Less) {
            let mut scratch = String::new();
            super::consume_type_args(&mut self.cur, &mut scratch);
        }

        // Constructor: the name must match the enclosing type, otherwise a
        // bare `name(...)` run is a stray message send, never a constructor.
        if self.cur.peek().is_identifier_like()
            && self.cur.nth(1) == TokenKind::LParen
            && self.cur.nth_token(0).is_some_and(|t| self.cur.text(t) == enclosing)
        {
            let name_token = self.cur.bump();
            let frame = self.ctx.push(FrameKind::Constructor, Some(enclosing.to_string()));
            let params = self.parse_params();
            let throws = self.parse_throws();
            let body = self.member_body(enclosing, "constructor");
            self.ctx.close(frame);
            members.push(MemberDecl::Constructor(ConstructorDecl {
                modifiers,
                name: enclosing.to_string(),
                name_range: name_token.range,
                params,
                throws,
                body,
                range: Span::new(start, self.cur.prev_end()),
            }));
            return;
        }

        let Some(ty) = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Type) else {
            let span = self.cur.current().range;
            self.sink
                .error("SYN_MEMBER", "expected a member declaration", span);
            recovery::recover_to_member_checkpoint(&mut self.cur);
            return;
        };

        let (name, name_range) = match self.cur.peek() {
            TokenKind::CompletionIdent => {
                let role = if self.cur.nth(1) == TokenKind::LParen {
                    CompletionRole::MethodName
                } else {
                    CompletionRole::FieldName
                };
                let token = self.cur.bump();
                let prefix = self.cur.text(token).to_string();
                self.sink
                    .capture(role, String::new(), prefix.clone(), token.range.start, token.range);
                (format!("<{}:{}>", role.tag(), prefix), token.range)
            }
            kind if kind.is_identifier_like() => {
                let token = self.cur.bump();
                (self.cur.text(token).to_string(), token.range)
            }
            _ => {
                // `Type` followed by garbage. Never fabricate a nameless
                // declaration; resynchronize instead.
                let span = self.cur.current().range;
                self.sink
                    .error("SYN_MEMBER_NAME", "expected a field or method name", span);
                if !matches!(self.cur.peek(), TokenKind::RBrace | TokenKind::Eof) {
                    recovery::recover_to_member_checkpoint(&mut self.cur);
                }
                return;
            }
        };

        if self.cur.at(TokenKind::LParen) {
            let frame = self.ctx.push(FrameKind::Method, Some(name.clone()));
            let params = self.parse_params();
            let throws = self.parse_throws();
            let body = self.member_body(enclosing, "method");
            self.ctx.close(frame);
            members.push(MemberDecl::Method(MethodDecl {
                modifiers,
                return_ty: ty,
                name,
                name_range,
                params,
                throws,
                body,
                range: Span::new(start, self.cur.prev_end()),
            }));
            return;
        }

        // Field, possibly multi-declarator. Each declarator gets its own
        // node sharing type and modifiers; C-style array suffixes normalize
        // onto that declarator only.
        let mut decl_start = start;
        let mut decl_name = name;
        let mut decl_name_range = name_range;
        loop {
            let mut decl_ty = ty.clone();
            while self.cur.at(TokenKind::LBracket) && self.cur.nth(1) == TokenKind::RBracket {
                self.cur.bump();
                self.cur.bump();
                decl_ty.text.push_str("[]");
            }
            let init = if self.cur.eat(TokenKind::Eq) {
                self.skip_field_initializer()
            } else {
                FieldInit::None
            };
            members.push(MemberDecl::Field(FieldDecl {
                modifiers: modifiers.clone(),
                ty: decl_ty,
                name: decl_name,
                name_range: decl_name_range,
                init,
                range: Span::new(decl_start, self.cur.prev_end()),
            }));

            if !self.cur.eat(TokenKind::Comma) {
                break;
            }
            decl_start = self.cur.offset();
            match self.cur.peek() {
                TokenKind::CompletionIdent => {
                    let token = self.cur.bump();
                    let prefix = self.cur.text(token).to_string();
                    self.sink.capture(
                        CompletionRole::FieldName,
                        String::new(),
                        prefix.clone(),
                        token.range.start,
                        token.range,
                    );
                    decl_name = format!("<{}:{}>", CompletionRole::FieldName.tag(), prefix);
                    decl_name_range = token.range;
                }
                kind if kind.is_identifier_like() => {
                    let token = self.cur.bump();
                    decl_name = self.cur.text(token).to_string();
                    decl_name_range = token.range;
                }
                _ => {
                    let span = self.cur.current().range;
                    self.sink
                        .error("SYN_DECLARATOR", "expected another declarator after `,`", span);
                    break;
                }
            }
        }
        self.cur
            .expect(TokenKind::Semicolon, &mut self.sink, "expected `;` after field declaration");
    }

    /// Balance over a field initializer without parsing it, recording the
    /// token range for the body pass. Stops at a top-level `,` or `;` (or a
    /// `}` / end of input when the terminator is missing).
    fn skip_field_initializer(&mut self) -> FieldInit {
        let token_start = self.cur.token_index();
        let span_start = self.cur.offset();
        let mut parens = 0i32;
        let mut brackets = 0i32;
        let mut braces = 0i32;
        loop {
            let kind = self.cur.peek();
            let balanced = parens == 0 && brackets == 0 && braces == 0;
            match kind {
                TokenKind::Eof => break,
                TokenKind::Comma | TokenKind::Semicolon if balanced => break,
                TokenKind::RBrace if balanced => break,
                TokenKind::LParen => parens += 1,
                TokenKind::RParen => parens -= 1,
                TokenKind::LBracket => brackets += 1,
                TokenKind::RBracket => brackets -= 1,
                TokenKind::LBrace => braces += 1,
                TokenKind::RBrace => braces -= 1,
                _ => {}
            }
            self.cur.bump();
        }
        FieldInit::Skipped {
            tokens: (token_start, self.cur.token_index()),
            span: Span::new(span_start, self.cur.prev_end()),
        }
    }

    fn parse_params(&mut self) -> Vec<ParamDecl> {
        let mut params = Vec::new();
        if !self.cur.eat(TokenKind::LParen) {
            return params;
        }
        loop {
            match self.cur.peek() {
                TokenKind::RParen => {
                    self.cur.bump();
                    break;
                }
                TokenKind::Eof | TokenKind::LBrace | TokenKind::Semicolon => {
                    self.sink.error(
                        "SYN_PARAMS",
                        "parameter list is missing its closing `)`",
                        Span::empty(self.cur.prev_end()),
                    );
                    break;
                }
                _ => {}
            }
            let start = self.cur.offset();
            let modifiers = parse_modifiers(&mut self.cur, &mut self.sink);
            let Some(ty) = parse_type_ref(&mut self.cur, &mut self.sink, CompletionRole::Type)
            else {
                recovery::recover_to_member_checkpoint(&mut self.cur);
                break;
            };
            let varargs = self.cur.eat(TokenKind::Ellipsis);
            let (name, name_range) = match self.cur.peek() {
                TokenKind::CompletionIdent => {
                    let token = self.cur.bump();
                    let prefix = self.cur.text(token).to_string();
                    self.sink.capture(
                        CompletionRole::Name,
                        String::new(),
                        prefix.clone(),
                        token.range.start,
                        token.range,
                    );
                    (format!("<{}:{}>", CompletionRole::Name.tag(), prefix), token.range)
                }
                kind if kind.is_identifier_like() => {
                    let token = self.cur.bump();
                    (self.cur.text(token).to_string(), token.range)
                }
                TokenKind::ThisKw => {
                    let token = self.cur.bump();
                    ("this".to_string(), token.range)
                }
                _ => {
                    let span = self.cur.current().range;
                    self.sink
                        .error("SYN_PARAM_NAME", "expected a parameter name", span);
                    (String::new(), Span::empty(self.cur.prev_end()))
                }
            };
            // Nameless fragments are diagnosed but not materialized.
            if !name.is_empty() {
                let mut ty = ty;
                while self.cur.at(TokenKind::LBracket) && self.cur.nth(1) == TokenKind::RBracket {
                    self.cur.bump();
                    self.cur.bump();
                    ty.text.push_str("[]");
                }
                params.push(ParamDecl {
                    modifiers,
                    ty,
                    name,
                    name_range,
                    varargs,
                    range: Span::new(start, self.cur.prev_end()),
                });
            }
            if !self.cur.eat(TokenKind::Comma) && !self.cur.at(TokenKind::RParen) {
                // Unexpected token inside the list; drop it and continue so
                // a single bad parameter cannot eat the whole header.
                if matches!(
                    self.cur.peek(),
                    TokenKind::Eof | TokenKind::LBrace | TokenKind::Semicolon
                ) {
                    continue;
                }
                self.cur.bump();
            }
        }
        params
    }

    fn parse_throws(&mut self) -> Vec<TypeRef> {
        if self.cur.eat(TokenKind::ThrowsKw) {
            self.type_ref_list(CompletionRole::Exception)
        } else {
            Vec::new()
        }
    }

    /// The body slot after a method/constructor header: `;` (no body), `{`
    /// (skip mode), or anything else (missing body, recovered by letting
    /// the member loop resynchronize on whatever follows).
    fn member_body(&mut self, enclosing: &str, what: &str) -> BodyRef {
        match self.cur.peek() {
            TokenKind::Semicolon => {
                self.cur.bump();
                BodyRef::None
            }
            TokenKind::LBrace => BodyRef::Skipped(self.skip_body(enclosing)),
            _ => {
                self.sink.error(
                    "SYN_MISSING_BODY",
                    format!("expected `{{` or `;` after {what} header"),
                    Span::empty(self.cur.prev_end()),
                );
                BodyRef::None
            }
        }
    }

    /// Skip mode: consume a `{...}` body tracking brace depth only. An
    /// unterminated body triggers the rescue scan, which can hand trailing
    /// member headers back to the enclosing type (the span shrinks to just
    /// before the promoted header).
    fn skip_body(&mut self, enclosing: &str) -> BodyId {
        let lbrace_index = self.cur.token_index();
        let span_start = self.cur.offset();
        self.cur.bump();
        let mut depth = 1usize;
        let (token_end, span_end, terminated) = loop {
            if self.cur.at_end() {
                let eof_index = self.cur.token_index();
                match recovery::scan_for_member_header(
                    self.cur.source,
                    self.cur.tokens,
                    lbrace_index + 1,
                    eof_index,
                    enclosing,
                ) {
                    Some(promoted) => {
                        tracing::debug!(promoted, "promoting trailing member header out of unterminated body");
                        self.cur.set_token_index(promoted);
                        break (promoted, self.cur.tokens[promoted].range.start, false);
                    }
                    None => break (eof_index, self.cur.prev_end(), false),
                }
            }
            let index = self.cur.token_index();
            match self.cur.bump().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        break (index, self.cur.prev_end(), true);
                    }
                }
                _ => {}
            }
        };
        if !terminated {
            self.sink.error(
                "SYN_UNCLOSED_BODY",
                "body is missing its closing `}`",
                Span::empty(span_end),
            );
        }
        let id = self.skipped.len();
        self.skipped.push(SkippedBodySpan {
            tokens: (lbrace_index, token_end),
            span: Span::new(span_start, span_end),
            terminated,
        });
        id
    }
}
