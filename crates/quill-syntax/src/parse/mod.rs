//! Parser infrastructure shared by the diet and body passes.
//!
//! Both passes walk the same immutable token array through a [`Cursor`]
//! bounded by absolute token indices, so skipped-body spans recorded by the
//! diet pass can be re-entered later without re-lexing (and without the two
//! passes ever disagreeing on token boundaries).

pub(crate) mod body;
pub(crate) mod diet;
pub(crate) mod recovery;

use quill_core::{Diagnostic, Span};

use crate::ast::{CompletionRole, Modifier, TypeRef};
use crate::language_level::JavaFeature;
use crate::token::{Token, TokenKind};
use crate::ParseOptions;

/// Report a feature-gate diagnostic when `feature` is below the configured
/// language level. Tree shape is never affected.
pub(crate) fn gate_feature(
    sink: &mut Sink,
    options: &ParseOptions,
    feature: JavaFeature,
    span: Span,
) {
    if !options.language_level.is_enabled(feature) {
        sink.diagnostics.push(Diagnostic::error(
            feature.diagnostic_code(),
            format!(
                "{} are not available below Java {}",
                feature.display_name(),
                feature.stable_since()
            ),
            span,
        ));
    }
}

/// What the parsers learned about the completion marker, if one was in the
/// token stream. At most one exists per parse; promotion (to an allocation
/// or message-send role) happens at most once, innermost production first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCapture {
    pub role: CompletionRole,
    /// Already-typed qualifier, including its trailing dot (`"a.b."`).
    pub qualifier: String,
    /// Partial identifier before the cursor; may be empty.
    pub prefix: String,
    /// Start offset of the qualified chain the marker terminates.
    pub chain_start: usize,
    pub marker_span: Span,
    /// Range of the enclosing expression the completion was promoted to
    /// (allocation / message send), when promotion applied.
    pub promote_span: Option<Span>,
}

/// Accumulates diagnostics and the completion capture during a parse pass.
/// Structural problems never abort the parse; they land here.
#[derive(Debug, Default)]
pub(crate) struct Sink {
    pub diagnostics: Vec<Diagnostic>,
    pub completion: Option<CompletionCapture>,
}

impl Sink {
    pub fn error(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::error(code, message.into(), span));
    }

    pub fn capture(
        &mut self,
        role: CompletionRole,
        qualifier: String,
        prefix: String,
        chain_start: usize,
        marker_span: Span,
    ) {
        if self.completion.is_none() {
            self.completion = Some(CompletionCapture {
                role,
                qualifier,
                prefix,
                chain_start,
                marker_span,
                promote_span: None,
            });
        }
    }

    /// Re-tag the pending capture with an enclosing-expression role. The
    /// first (innermost) promotion wins.
    pub fn promote(&mut self, role: CompletionRole, span: Span) {
        if let Some(capture) = &mut self.completion {
            if capture.promote_span.is_none() {
                tracing::debug!(?role, ?span, "promoting completion capture");
                capture.role = role;
                capture.promote_span = Some(span);
            }
        }
    }
}

/// Token cursor over a sub-range of the shared token array.
///
/// `pos`/`end` are absolute indices, so indices recorded by one pass stay
/// meaningful in another. Trivia stays in the array and is skipped on read.
pub(crate) struct Cursor<'a> {
    pub source: &'a str,
    pub tokens: &'a [Token],
    pos: usize,
    end: usize,
    prev_end: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token], start: usize, end: usize) -> Self {
        let prev_end = tokens
            .get(start.wrapping_sub(1))
            .map(|t| t.range.end)
            .unwrap_or(0);
        Cursor {
            source,
            tokens,
            pos: start,
            end,
            prev_end,
        }
    }

    pub fn full(source: &'a str, tokens: &'a [Token]) -> Self {
        Cursor::new(source, tokens, 0, tokens.len())
    }

    /// Absolute index of the n-th non-trivia token at or after `pos`, or
    /// `self.end` when exhausted.
    fn nth_index(&self, n: usize) -> usize {
        let mut idx = self.pos;
        let mut remaining = n;
        while idx < self.end {
            if !self.tokens[idx].kind.is_trivia() {
                if remaining == 0 {
                    return idx;
                }
                remaining -= 1;
            }
            idx += 1;
        }
        self.end
    }

    pub fn nth(&self, n: usize) -> TokenKind {
        match self.nth_token(n) {
            Some(token) => token.kind,
            None => TokenKind::Eof,
        }
    }

    pub fn nth_token(&self, n: usize) -> Option<Token> {
        let idx = self.nth_index(n);
        if idx < self.end {
            Some(self.tokens[idx])
        } else {
            None
        }
    }

    pub fn peek(&self) -> TokenKind {
        self.nth(0)
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    pub fn at_end(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    /// The current token, or a synthetic zero-width `Eof` at the range end.
    pub fn current(&self) -> Token {
        self.nth_token(0).unwrap_or(Token {
            kind: TokenKind::Eof,
            range: Span::empty(self.prev_end),
        })
    }

    /// Byte offset where the next token begins (or the previous token ended,
    /// at end of range).
    pub fn offset(&self) -> usize {
        match self.nth_token(0) {
            Some(token) => token.range.start,
            None => self.prev_end,
        }
    }

    pub fn prev_end(&self) -> usize {
        self.prev_end
    }

    /// Absolute token index of the current non-trivia token.
    pub fn token_index(&self) -> usize {
        self.nth_index(0)
    }

    pub fn set_token_index(&mut self, idx: usize) {
        self.pos = idx.min(self.end);
        self.prev_end = self
            .tokens
            .get(self.pos.wrapping_sub(1))
            .map(|t| t.range.end)
            .unwrap_or(self.prev_end);
    }

    pub fn bump(&mut self) -> Token {
        let idx = self.nth_index(0);
        if idx >= self.end {
            return self.current();
        }
        let token = self.tokens[idx];
        self.pos = idx + 1;
        self.prev_end = token.range.end;
        token
    }

    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: TokenKind, sink: &mut Sink, message: &str) -> bool {
        if self.eat(kind) {
            true
        } else {
            sink.error("SYN_EXPECTED", message.to_string(), Span::empty(self.offset()));
            false
        }
    }

    pub fn text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    /// Consume tokens until the matching `close` for an already-consumed
    /// `open`, tracking nesting of the same pair. Stops at end of range.
    pub fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        let mut depth = 1usize;
        while !self.at_end() {
            let kind = self.bump().kind;
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }
}

pub(crate) fn modifier_for(kind: TokenKind) -> Option<Modifier> {
    Some(match kind {
        TokenKind::PublicKw => Modifier::Public,
        TokenKind::ProtectedKw => Modifier::Protected,
        TokenKind::PrivateKw => Modifier::Private,
        TokenKind::StaticKw => Modifier::Static,
        TokenKind::AbstractKw => Modifier::Abstract,
        TokenKind::FinalKw => Modifier::Final,
        TokenKind::NativeKw => Modifier::Native,
        TokenKind::SynchronizedKw => Modifier::Synchronized,
        TokenKind::TransientKw => Modifier::Transient,
        TokenKind::VolatileKw => Modifier::Volatile,
        TokenKind::StrictfpKw => Modifier::Strictfp,
        TokenKind::DefaultKw => Modifier::Default,
        TokenKind::SealedKw => Modifier::Sealed,
        TokenKind::NonSealedKw => Modifier::NonSealed,
        _ => return None,
    })
}

/// Consume leading modifiers and annotations. `@interface` is left alone so
/// annotation type declarations still parse. Annotation arguments are
/// balanced, not interpreted.
pub(crate) fn parse_modifiers(cur: &mut Cursor<'_>, _sink: &mut Sink) -> Vec<Modifier> {
    let mut modifiers = Vec::new();
    loop {
        if let Some(modifier) = modifier_for(cur.peek()) {
            // `default` is a modifier only in member position; inside a
            // switch the statement parser never calls this.
            cur.bump();
            modifiers.push(modifier);
            continue;
        }
        if cur.at(TokenKind::At) && cur.nth(1) != TokenKind::InterfaceKw {
            cur.bump();
            while cur.peek().is_identifier_like() {
                cur.bump();
                if cur.at(TokenKind::Dot) && cur.nth(1).is_identifier_like() {
                    cur.bump();
                } else {
                    break;
                }
            }
            if cur.eat(TokenKind::LParen) {
                cur.skip_balanced(TokenKind::LParen, TokenKind::RParen);
            }
            continue;
        }
        break;
    }
    modifiers
}

fn render_marker(role: CompletionRole, qualifier: &str, prefix: &str) -> String {
    format!("<{}:{}{}>", role.tag(), qualifier, prefix)
}

/// Parse a type reference into its canonical text form. Returns `None` when
/// the cursor is not at a type start. A completion marker inside the chain
/// is captured with the given `role` and rendered into the text, and always
/// terminates the chain.
pub(crate) fn parse_type_ref(
    cur: &mut Cursor<'_>,
    sink: &mut Sink,
    role: CompletionRole,
) -> Option<TypeRef> {
    let start = cur.offset();
    let mut text = String::new();

    let kind = cur.peek();
    if kind.is_primitive_type() || kind == TokenKind::VoidKw {
        let token = cur.bump();
        text.push_str(cur.text(token));
    } else if kind.is_identifier_like() {
        loop {
            if cur.at(TokenKind::CompletionIdent) {
                let token = cur.bump();
                let prefix = cur.text(token).to_string();
                let rendered = render_marker(role, &text, &prefix);
                sink.capture(role, text.clone(), prefix, start, token.range);
                text.push_str(&rendered);
                break;
            }
            let token = cur.bump();
            text.push_str(cur.text(token));
            if cur.at(TokenKind::Less) {
                consume_type_args(cur, &mut text);
            }
            if cur.at(TokenKind::Dot) && cur.nth(1).is_identifier_like() {
                cur.bump();
                text.push('.');
            } else {
                break;
            }
        }
    } else {
        return None;
    }

    while cur.at(TokenKind::LBracket) && cur.nth(1) == TokenKind::RBracket {
        cur.bump();
        cur.bump();
        text.push_str("[]");
    }

    Some(TypeRef {
        text,
        range: Span::new(start, cur.prev_end()),
    })
}

/// Consume a balanced `<...>` type-argument list, appending canonical text.
/// Shift tokens close two or three levels at once.
pub(crate) fn consume_type_args(cur: &mut Cursor<'_>, text: &mut String) {
    cur.bump();
    text.push('<');
    let mut depth = 1i32;
    while depth > 0 && !cur.at_end() {
        match cur.peek() {
            TokenKind::Less => {
                cur.bump();
                depth += 1;
                text.push('<');
            }
            TokenKind::Greater => {
                cur.bump();
                depth -= 1;
                text.push('>');
            }
            TokenKind::RightShift => {
                cur.bump();
                depth -= 2;
                text.push_str(">>");
            }
            TokenKind::UnsignedRightShift => {
                cur.bump();
                depth -= 3;
                text.push_str(">>>");
            }
            TokenKind::Comma => {
                cur.bump();
                text.push_str(", ");
            }
            TokenKind::Question => {
                cur.bump();
                text.push('?');
            }
            TokenKind::ExtendsKw => {
                cur.bump();
                text.push_str(" extends ");
            }
            TokenKind::SuperKw => {
                cur.bump();
                text.push_str(" super ");
            }
            TokenKind::Dot => {
                cur.bump();
                text.push('.');
            }
            kind if kind.is_identifier_like() || kind.is_primitive_type() => {
                let token = cur.bump();
                text.push_str(cur.text(token));
            }
            TokenKind::LBracket | TokenKind::RBracket => {
                let token = cur.bump();
                text.push_str(cur.text(token));
            }
            // Anything else means this was not a type-argument list after
            // all; stop rather than swallow the body.
            _ => break,
        }
    }
}

/// Token-count lookahead: does a type reference start at non-trivia
/// position `n`? Returns the position just past the type on success.
/// Mirrors the consuming walk in [`parse_type_ref`] without side effects.
pub(crate) fn scan_type(cur: &Cursor<'_>, n: usize) -> Option<usize> {
    let kind = cur.nth(n);
    let mut m;
    if kind.is_primitive_type() || kind == TokenKind::VoidKw {
        m = n + 1;
    } else if kind.is_identifier_like() {
        m = n + 1;
        loop {
            if cur.nth(m) == TokenKind::Less {
                m = scan_type_args(cur, m)?;
            }
            if cur.nth(m) == TokenKind::Dot && cur.nth(m + 1).is_identifier_like() {
                m += 2;
            } else {
                break;
            }
        }
    } else {
        return None;
    }
    while cur.nth(m) == TokenKind::LBracket && cur.nth(m + 1) == TokenKind::RBracket {
        m += 2;
    }
    Some(m)
}

fn scan_type_args(cur: &Cursor<'_>, n: usize) -> Option<usize> {
    debug_assert_eq!(cur.nth(n), TokenKind::Less);
    let mut m = n + 1;
    let mut depth = 1i32;
    while depth > 0 {
        match cur.nth(m) {
            TokenKind::Less => depth += 1,
            TokenKind::Greater => depth -= 1,
            TokenKind::RightShift => depth -= 2,
            TokenKind::UnsignedRightShift => depth -= 3,
            TokenKind::Comma
            | TokenKind::Question
            | TokenKind::ExtendsKw
            | TokenKind::SuperKw
            | TokenKind::Dot
            | TokenKind::LBracket
            | TokenKind::RBracket => {}
            kind if kind.is_identifier_like() || kind.is_primitive_type() => {}
            _ => return None,
        }
        m += 1;
    }
    Some(m)
}
