//! Cursor-directed completion parsing.
//!
//! Given a source text and a cursor offset, this crate injects a synthetic
//! completion token into the token stream, reuses the diet/body parsers, and
//! resolves the capture into the four completion outputs: the completion
//! node, its parent, the identifier prefix, and the replaced source region.
//! The outputs are all-or-nothing: either every one is `<NONE>` or none is
//! (the parent may stay `<NONE>` for a cursor at the very top level).
//!
//! The cursor offset is 0-based and inclusive: the character at the offset
//! counts as already typed.

#[cfg(test)]
mod tests;

use quill_core::{Diagnostic, Span};
use quill_syntax::ast::{
    Block, BodyId, BodyRef, CompilationUnit, CompletionRole, Expr, FieldInit, MemberDecl, Stmt,
    TypeDecl,
};
use quill_syntax::lexer::lex_with_errors;
use quill_syntax::literals::unescape_string_prefix;
use quill_syntax::token::{Token, TokenKind};
use quill_syntax::{parse_diet_tokens, printer, CompletionCapture, DietParse, ParseOptions};

pub const NONE: &str = "<NONE>";

/// How deep the completion parse goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Declaration headers only; a cursor inside a method body yields
    /// `<NONE>` everywhere.
    Diet,
    /// Re-enter the body around the cursor at statement level (with both
    /// recovery tiers forced on).
    Method,
}

/// Result of a completion parse. Never an error: unparseable input
/// degrades to `<NONE>` outputs around a best-effort tree.
#[derive(Debug)]
pub struct CompletionParse {
    /// `<CompleteOnXxx:...>`, or `<NONE>`.
    pub node: String,
    /// Printed enclosing statement or member, or `<NONE>`.
    pub parent: String,
    /// The partial identifier before the cursor (may be empty), or `<NONE>`.
    pub identifier: String,
    /// The source region the completion replaces, or `<NONE>`.
    pub replaced: String,
    /// Best-effort display tree (with the cursor's body attached in
    /// [`CompletionMode::Method`]).
    pub unit: CompilationUnit,
    pub diagnostics: Vec<Diagnostic>,
    pub capture: Option<CompletionCapture>,
}

pub fn completion_parse(
    source: &str,
    cursor: usize,
    mode: CompletionMode,
    options: &ParseOptions,
) -> CompletionParse {
    let end = inclusive_end(source, cursor);
    let (tokens, _lex_errors) = lex_with_errors(source);

    // A cursor inside a comment has nothing to complete.
    if tokens.iter().any(|t| {
        t.kind.is_trivia()
            && t.kind != TokenKind::Whitespace
            && t.range.start < end
            && end < t.range.end
    }) {
        let diet = parse_diet_tokens(source, tokens, options);
        return none_result(diet.unit, diet.diagnostics);
    }

    if let Some(token) = string_literal_at(&tokens, source, end) {
        return string_completion(source, tokens, token, end, mode, options);
    }

    // A cursor strictly inside a non-name token (a number, an operator) is
    // not a name in progress.
    if tokens.iter().any(|t| {
        !t.kind.is_trivia()
            && t.range.start < end
            && end < t.range.end
            && !starts_like_identifier(t.text(source))
    }) {
        let diet = parse_diet_tokens(source, tokens, options);
        return none_result(diet.unit, diet.diagnostics);
    }

    let (modified, marker_span, replaced_token_end) = inject_marker(source, &tokens, end);
    tracing::debug!(?marker_span, "completion marker injected");

    let diet = parse_diet_tokens(source, modified, options);
    let mut display_unit = diet.unit.clone();
    let mut diagnostics = diet.diagnostics.clone();
    let mut capture = diet.completion.clone();
    let probe = marker_span.start;

    if capture.is_none() {
        if let Some((id, _)) = diet
            .skipped
            .iter()
            .enumerate()
            .find(|(_, s)| s.contains_offset(probe))
        {
            match mode {
                CompletionMode::Diet => return none_result(display_unit, diagnostics),
                CompletionMode::Method => {
                    if let Some(body) = diet.parse_body(id, &forced_recovery(options)) {
                        diagnostics.extend(body.diagnostics.iter().cloned());
                        capture = body.completion;
                        attach_body(&mut display_unit, id, body.block);
                    }
                }
            }
        } else if let Some(parsed) = complete_field_initializer(&diet, probe, options) {
            diagnostics.extend(parsed.1.iter().cloned());
            capture = parsed.2;
            attach_initializer(&mut display_unit, probe, parsed.0);
        }
    }

    let Some(capture) = capture else {
        return none_result(display_unit, diagnostics);
    };

    let identifier = capture.prefix.clone();
    let replaced = replaced_source(source, &capture, end, replaced_token_end, options);
    let node = node_string(&display_unit, &capture);
    let parent = parent_string(&display_unit, capture.marker_span);

    CompletionParse {
        node,
        parent,
        identifier,
        replaced,
        unit: display_unit,
        diagnostics,
        capture: Some(capture),
    }
}

fn forced_recovery(options: &ParseOptions) -> ParseOptions {
    ParseOptions {
        methods_full_recovery: true,
        statements_recovery: true,
        ..options.clone()
    }
}

fn none_result(unit: CompilationUnit, diagnostics: Vec<Diagnostic>) -> CompletionParse {
    CompletionParse {
        node: NONE.to_string(),
        parent: NONE.to_string(),
        identifier: NONE.to_string(),
        replaced: NONE.to_string(),
        unit,
        diagnostics,
        capture: None,
    }
}

/// Byte offset just past the character at `cursor` (the cursor is
/// inclusive), clamped to the source and kept on a char boundary.
fn inclusive_end(source: &str, cursor: usize) -> usize {
    let mut end = cursor.saturating_add(1).min(source.len());
    while end < source.len() && !source.is_char_boundary(end) {
        end += 1;
    }
    end
}

fn starts_like_identifier(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c == '_' || c == '$' || c.is_alphabetic())
}

/// Build the completion token stream: either the token under the cursor is
/// replaced by a `CompletionIdent` carrying the typed prefix, or a
/// zero-width marker is inserted at the cursor (standing in for the next
/// identifier or literal token, which is dropped).
///
/// Returns the stream, the marker's span, and the original end of the
/// replaced token (equal to the cursor end when nothing was replaced).
fn inject_marker(source: &str, tokens: &[Token], end: usize) -> (Vec<Token>, Span, usize) {
    let mut out = Vec::with_capacity(tokens.len() + 1);
    let mut marker_span = Span::empty(end);
    let mut replaced_token_end = end;
    let mut injected = false;

    for &token in tokens {
        if token.kind.is_trivia() {
            out.push(token);
            continue;
        }
        if !injected
            && token.range.start < end
            && end <= token.range.end
            && starts_like_identifier(token.text(source))
        {
            marker_span = Span::new(token.range.start, end);
            replaced_token_end = token.range.end;
            out.push(Token {
                kind: TokenKind::CompletionIdent,
                range: marker_span,
            });
            injected = true;
            continue;
        }
        if !injected && token.range.start >= end {
            out.push(Token {
                kind: TokenKind::CompletionIdent,
                range: marker_span,
            });
            injected = true;
            // The marker stands in for whatever was here before.
            if token.kind.is_identifier_like() || token.kind.is_literal() {
                continue;
            }
        }
        out.push(token);
    }
    (out, marker_span, replaced_token_end)
}

fn string_literal_at(tokens: &[Token], source: &str, end: usize) -> Option<Token> {
    tokens.iter().copied().find(|t| {
        let text = t.text(source);
        match t.kind {
            TokenKind::StringLiteral => t.range.start < end && end < t.range.end,
            // Unterminated literal: the cursor may sit at its very end.
            TokenKind::Error => {
                text.starts_with('"') && t.range.start < end && end <= t.range.end
            }
            _ => false,
        }
    })
}

fn string_completion(
    source: &str,
    tokens: Vec<Token>,
    token: Token,
    end: usize,
    mode: CompletionMode,
    options: &ParseOptions,
) -> CompletionParse {
    let diet = parse_diet_tokens(source, tokens, options);
    let inside_body = diet
        .skipped
        .iter()
        .any(|s| s.contains_offset(token.range.start));
    if inside_body && mode == CompletionMode::Diet {
        return none_result(diet.unit.clone(), diet.diagnostics.clone());
    }

    let full = diet.with_bodies(&forced_recovery(options));
    let identifier = unescape_string_prefix(&source[token.range.start..end]);
    let node = format!("<{}:{}>", CompletionRole::StringLiteral.tag(), identifier);
    let parent = parent_string(&full.unit, token.range);
    let capture = CompletionCapture {
        role: CompletionRole::StringLiteral,
        qualifier: String::new(),
        prefix: identifier.clone(),
        chain_start: token.range.start,
        marker_span: token.range,
        promote_span: None,
    };
    CompletionParse {
        node,
        parent,
        identifier,
        replaced: token.text(source).to_string(),
        unit: full.unit,
        diagnostics: full.diagnostics,
        capture: Some(capture),
    }
}

/// Field initializers belong to the diet structure, so their completion
/// works in both modes.
fn complete_field_initializer(
    diet: &DietParse<'_>,
    probe: usize,
    options: &ParseOptions,
) -> Option<(Expr, Vec<Diagnostic>, Option<CompletionCapture>)> {
    fn find_init<'t>(members: &'t [MemberDecl], probe: usize) -> Option<&'t FieldInit> {
        for member in members {
            match member {
                MemberDecl::Field(field) => {
                    if let FieldInit::Skipped { span, .. } = &field.init {
                        if span.start <= probe && probe <= span.end {
                            return Some(&field.init);
                        }
                    }
                }
                MemberDecl::Type(decl) => {
                    if let Some(found) = find_init(&decl.members, probe) {
                        return Some(found);
                    }
                }
                _ => {}
            }
        }
        None
    }

    let init = diet
        .unit
        .types
        .iter()
        .find_map(|t| find_init(&t.members, probe))?;
    let parsed = diet.parse_initializer(init, &forced_recovery(options))?;
    Some((parsed.expr, parsed.diagnostics, parsed.completion))
}

fn attach_body(unit: &mut CompilationUnit, id: BodyId, block: Block) {
    fn visit(decl: &mut TypeDecl, id: BodyId, block: &mut Option<Block>) {
        for member in &mut decl.members {
            let slot = match member {
                MemberDecl::Method(m) => &mut m.body,
                MemberDecl::Constructor(c) => &mut c.body,
                MemberDecl::Initializer(i) => &mut i.body,
                MemberDecl::Type(nested) => {
                    visit(nested, id, block);
                    continue;
                }
                MemberDecl::Field(_) => continue,
            };
            if matches!(slot, BodyRef::Skipped(i) if *i == id) {
                if let Some(block) = block.take() {
                    *slot = BodyRef::Parsed(block);
                }
            }
        }
    }
    let mut block = Some(block);
    for decl in &mut unit.types {
        visit(decl, id, &mut block);
    }
}

fn attach_initializer(unit: &mut CompilationUnit, probe: usize, expr: Expr) {
    fn visit(decl: &mut TypeDecl, probe: usize, expr: &mut Option<Expr>) {
        for member in &mut decl.members {
            match member {
                MemberDecl::Field(field) => {
                    if let FieldInit::Skipped { span, .. } = &field.init {
                        if span.start <= probe && probe <= span.end {
                            if let Some(expr) = expr.take() {
                                field.init = FieldInit::Parsed(expr);
                            }
                        }
                    }
                }
                MemberDecl::Type(nested) => visit(nested, probe, expr),
                _ => {}
            }
        }
    }
    let mut expr = Some(expr);
    for decl in &mut unit.types {
        visit(decl, probe, &mut expr);
    }
}

// --- Capture resolution ---

fn replaced_source(
    source: &str,
    capture: &CompletionCapture,
    end: usize,
    replaced_token_end: usize,
    options: &ParseOptions,
) -> String {
    if let Some(span) = capture.promote_span {
        // The replaced region is the whole promoted expression; render it
        // through a normal parse of the original text so the output is the
        // canonical form, not the raw bytes.
        let snippet = &source[span.start..span.end.min(source.len())];
        return match quill_syntax::parse_expression(snippet, options) {
            Ok(fragment) => printer::expr_to_string(&fragment.expr),
            Err(_) => snippet.to_string(),
        };
    }
    let replace_end = if capture.prefix.is_empty() {
        end
    } else {
        replaced_token_end
    };
    source[capture.chain_start..replace_end.max(capture.chain_start)].to_string()
}

fn render_capture(capture: &CompletionCapture) -> String {
    format!(
        "<{}:{}{}>",
        capture.role.tag(),
        capture.qualifier,
        capture.prefix
    )
}

fn node_string(unit: &CompilationUnit, capture: &CompletionCapture) -> String {
    if let Some(span) = capture.promote_span {
        if let Some(expr) = find_expr_by_range(unit, span) {
            return format!("<{}:{}>", capture.role.tag(), printer::expr_to_string(expr));
        }
        return render_capture(capture);
    }
    if let Some(expr) = find_completion_expr(unit) {
        return printer::expr_to_string(expr);
    }
    // Header captures render into declaration names, not expression nodes.
    render_capture(capture)
}

fn parent_string(unit: &CompilationUnit, marker: Span) -> String {
    for import in &unit.imports {
        if covers(import.range, marker) {
            let mut text = format!("import {}", import.path);
            if import.is_star {
                text.push_str(".*");
            }
            text.push(';');
            return text;
        }
    }
    if let Some(pkg) = &unit.package {
        if covers(pkg.range, marker) {
            return format!("package {};", pkg.name);
        }
    }
    for decl in &unit.types {
        if let Some(parent) = parent_in_type(decl, marker) {
            return parent;
        }
    }
    NONE.to_string()
}

fn parent_in_type(decl: &TypeDecl, marker: Span) -> Option<String> {
    if !covers(decl.range, marker) {
        return None;
    }
    for member in &decl.members {
        if !covers(member.range(), marker) {
            continue;
        }
        if let MemberDecl::Type(nested) = member {
            return parent_in_type(nested, marker);
        }
        let body = match member {
            MemberDecl::Method(m) => Some(&m.body),
            MemberDecl::Constructor(c) => Some(&c.body),
            MemberDecl::Initializer(i) => Some(&i.body),
            _ => None,
        };
        if let Some(BodyRef::Parsed(block)) = body {
            if let Some(parent) = parent_in_block(block, marker) {
                return Some(parent);
            }
        }
        return Some(printer::member_to_string(member));
    }
    None
}

/// Innermost statement containing the marker. A bare completion expression
/// statement is skipped over: its parent is the next enclosing statement
/// (or the member, handled by the caller returning `None`).
fn parent_in_block(block: &Block, marker: Span) -> Option<String> {
    let mut path: Vec<&Stmt> = Vec::new();
    for stmt in &block.statements {
        if stmt_path(stmt, marker, &mut path) {
            break;
        }
    }
    while let Some(last) = path.last() {
        if let Stmt::Expr(es) = last {
            if es.expr.is_completion() {
                path.pop();
                continue;
            }
        }
        break;
    }
    path.last().map(|s| printer::stmt_to_string(s))
}

fn stmt_path<'t>(stmt: &'t Stmt, marker: Span, path: &mut Vec<&'t Stmt>) -> bool {
    if !covers(stmt.range(), marker) {
        return false;
    }
    path.push(stmt);
    for child in stmt_substmts(stmt) {
        if stmt_path(child, marker, path) {
            return true;
        }
    }
    true
}

fn covers(range: Span, marker: Span) -> bool {
    range.start <= marker.start && marker.end <= range.end
}

fn stmt_substmts(stmt: &Stmt) -> Vec<&Stmt> {
    match stmt {
        Stmt::Block(b) => b.statements.iter().collect(),
        Stmt::If(s) => {
            let mut out = vec![s.then_branch.as_ref()];
            if let Some(else_branch) = &s.else_branch {
                out.push(else_branch.as_ref());
            }
            out
        }
        Stmt::While(s) => vec![s.body.as_ref()],
        Stmt::DoWhile(s) => vec![s.body.as_ref()],
        Stmt::For(s) => s.init.iter().chain(std::iter::once(s.body.as_ref())).collect(),
        Stmt::ForEach(s) => vec![s.body.as_ref()],
        Stmt::Switch(s) => s.groups.iter().flat_map(|g| g.statements.iter()).collect(),
        Stmt::Labeled(s) => vec![s.stmt.as_ref()],
        Stmt::Synchronized(s) => s.body.statements.iter().collect(),
        Stmt::Try(s) => s
            .block
            .statements
            .iter()
            .chain(s.catches.iter().flat_map(|c| c.body.statements.iter()))
            .chain(s.finally.iter().flat_map(|b| b.statements.iter()))
            .collect(),
        _ => Vec::new(),
    }
}

fn stmt_exprs(stmt: &Stmt) -> Vec<&Expr> {
    match stmt {
        Stmt::LocalVar(s) => s.initializer.iter().collect(),
        Stmt::Expr(s) => vec![&s.expr],
        Stmt::If(s) => vec![&s.cond],
        Stmt::While(s) => vec![&s.cond],
        Stmt::DoWhile(s) => vec![&s.cond],
        Stmt::For(s) => s.cond.iter().chain(s.update.iter()).collect(),
        Stmt::ForEach(s) => vec![&s.iterable],
        Stmt::Switch(s) => {
            let mut out = vec![&s.scrutinee];
            for group in &s.groups {
                for label in &group.labels {
                    if let quill_syntax::ast::SwitchLabel::Case(expr) = label {
                        out.push(expr);
                    }
                }
            }
            out
        }
        Stmt::Return(s) => s.expr.iter().collect(),
        Stmt::Throw(s) => vec![&s.expr],
        Stmt::Synchronized(s) => vec![&s.lock],
        Stmt::Try(s) => s
            .resources
            .iter()
            .filter_map(|r| r.initializer.as_ref())
            .collect(),
        Stmt::Assert(s) => std::iter::once(&s.cond).chain(s.detail.iter()).collect(),
        _ => Vec::new(),
    }
}

fn expr_children(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::Call(e) => e
            .receiver
            .iter()
            .map(|b| b.as_ref())
            .chain(e.args.iter())
            .collect(),
        Expr::New(e) => e
            .qualifier
            .iter()
            .map(|b| b.as_ref())
            .chain(e.args.iter())
            .collect(),
        Expr::ArrayNew(e) => e
            .dims
            .iter()
            .flatten()
            .chain(e.initializer.as_deref())
            .collect(),
        Expr::ArrayInit(e) => e.elements.iter().collect(),
        Expr::FieldAccess(e) => vec![e.receiver.as_ref()],
        Expr::ArrayAccess(e) => vec![e.array.as_ref(), e.index.as_ref()],
        Expr::Unary(e) => vec![e.operand.as_ref()],
        Expr::Binary(e) => vec![e.lhs.as_ref(), e.rhs.as_ref()],
        Expr::Assign(e) => vec![e.lhs.as_ref(), e.rhs.as_ref()],
        Expr::Conditional(e) => vec![e.cond.as_ref(), e.then_expr.as_ref(), e.else_expr.as_ref()],
        Expr::Cast(e) => vec![e.expr.as_ref()],
        Expr::InstanceOf(e) => vec![e.expr.as_ref()],
        Expr::Paren(e) => vec![e.inner.as_ref()],
        _ => Vec::new(),
    }
}

fn find_expr<'t>(expr: &'t Expr, pred: &impl Fn(&Expr) -> bool) -> Option<&'t Expr> {
    if pred(expr) {
        return Some(expr);
    }
    for child in expr_children(expr) {
        if let Some(found) = find_expr(child, pred) {
            return Some(found);
        }
    }
    None
}

fn find_in_unit<'t>(
    unit: &'t CompilationUnit,
    pred: &impl Fn(&Expr) -> bool,
) -> Option<&'t Expr> {
    fn in_block<'t>(block: &'t Block, pred: &impl Fn(&Expr) -> bool) -> Option<&'t Expr> {
        for stmt in &block.statements {
            if let Some(found) = in_stmt(stmt, pred) {
                return Some(found);
            }
        }
        None
    }
    fn in_stmt<'t>(stmt: &'t Stmt, pred: &impl Fn(&Expr) -> bool) -> Option<&'t Expr> {
        for expr in stmt_exprs(stmt) {
            if let Some(found) = find_expr(expr, pred) {
                return Some(found);
            }
        }
        for child in stmt_substmts(stmt) {
            if let Some(found) = in_stmt(child, pred) {
                return Some(found);
            }
        }
        None
    }
    fn in_type<'t>(decl: &'t TypeDecl, pred: &impl Fn(&Expr) -> bool) -> Option<&'t Expr> {
        for member in &decl.members {
            let found = match member {
                MemberDecl::Field(field) => match &field.init {
                    FieldInit::Parsed(expr) => find_expr(expr, pred),
                    _ => None,
                },
                MemberDecl::Method(m) => match &m.body {
                    BodyRef::Parsed(block) => in_block(block, pred),
                    _ => None,
                },
                MemberDecl::Constructor(c) => match &c.body {
                    BodyRef::Parsed(block) => in_block(block, pred),
                    _ => None,
                },
                MemberDecl::Initializer(i) => match &i.body {
                    BodyRef::Parsed(block) => in_block(block, pred),
                    _ => None,
                },
                MemberDecl::Type(nested) => in_type(nested, pred),
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }
    unit.types.iter().find_map(|t| in_type(t, pred))
}

fn find_completion_expr(unit: &CompilationUnit) -> Option<&Expr> {
    find_in_unit(unit, &|e| e.is_completion())
}

fn find_expr_by_range(unit: &CompilationUnit, range: Span) -> Option<&Expr> {
    find_in_unit(unit, &move |e| e.range() == range)
}
