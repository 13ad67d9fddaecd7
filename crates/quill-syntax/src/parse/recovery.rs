//! Structural recovery for malformed or truncated input.
//!
//! The diet parser drives this: it keeps a stack of recovered frames (one
//! per open declaration), resynchronizes at checkpoint tokens after a failed
//! header, and when a skipped body runs off the end of input, rescans the
//! span for member-header-shaped token runs to promote back into the
//! enclosing type.

use crate::token::{Token, TokenKind};

use super::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    Type,
    Method,
    Constructor,
}

#[derive(Debug)]
pub(crate) struct RecoveryFrame {
    pub kind: FrameKind,
    pub name: Option<String>,
}

/// Stack of open declaration frames threaded through the diet pass; the
/// depth and names feed the recovery trace events. Never global.
#[derive(Debug, Default)]
pub(crate) struct RecoveryContext {
    frames: Vec<RecoveryFrame>,
}

impl RecoveryContext {
    pub fn push(&mut self, kind: FrameKind, name: Option<String>) -> usize {
        tracing::debug!(?kind, ?name, depth = self.frames.len(), "open frame");
        self.frames.push(RecoveryFrame { kind, name });
        self.frames.len() - 1
    }

    /// Pop the frame at `index` and everything above it. Children above
    /// `index` were already closed by the recursive structure.
    pub fn close(&mut self, index: usize) {
        if let Some(frame) = self.frames.get(index) {
            tracing::debug!(kind = ?frame.kind, name = ?frame.name, "close frame");
        }
        self.frames.truncate(index);
    }
}

/// Tokens at which member-level recovery resynchronizes after a malformed
/// header: a new header can plausibly start here, or the type body ends.
pub(crate) fn at_member_checkpoint(kind: TokenKind) -> bool {
    kind.is_modifier_keyword()
        || kind.is_primitive_type()
        || matches!(
            kind,
            TokenKind::Semicolon
                | TokenKind::RBrace
                | TokenKind::LBrace
                | TokenKind::ClassKw
                | TokenKind::InterfaceKw
                | TokenKind::EnumKw
                | TokenKind::RecordKw
                | TokenKind::At
                | TokenKind::VoidKw
                | TokenKind::Eof
        )
}

/// Skip forward to the next member checkpoint. Always consumes at least one
/// token so recovery cannot loop; a checkpoint semicolon is swallowed as the
/// end of the malformed run.
pub(crate) fn recover_to_member_checkpoint(cur: &mut Cursor<'_>) {
    if cur.at_end() {
        return;
    }
    cur.bump();
    while !at_member_checkpoint(cur.peek()) && !cur.at_end() {
        // Stray opener would desynchronize brace depth; balance it away.
        match cur.peek() {
            TokenKind::LParen => {
                cur.bump();
                cur.skip_balanced(TokenKind::LParen, TokenKind::RParen);
            }
            _ => {
                cur.bump();
            }
        }
    }
    cur.eat(TokenKind::Semicolon);
}

/// Scan the raw token range of an *unterminated* skipped body for the first
/// member-header-shaped run, returning its token index. The enclosing type
/// recovers those members as its own (the body span shrinks to just before
/// the header).
///
/// Local and anonymous type bodies inside the range are balanced over, never
/// matched into (diet mode suppresses them). Bare `name(...)` runs only
/// count when `name` equals the enclosing type name, so message sends are
/// never mistaken for constructors.
pub(crate) fn scan_for_member_header(
    source: &str,
    tokens: &[Token],
    start: usize,
    end: usize,
    enclosing_type: &str,
) -> Option<usize> {
    let significant = |idx: usize| -> Option<(usize, TokenKind)> {
        let mut i = idx;
        while i < end {
            if !tokens[i].kind.is_trivia() {
                return Some((i, tokens[i].kind));
            }
            i += 1;
        }
        None
    };

    let mut prev: Option<TokenKind> = None;
    let mut idx = start;
    while idx < end {
        let Some((i, kind)) = significant(idx) else { break };

        // Suppressed regions: local types at statement level and anonymous
        // class bodies are balanced over, never promoted in diet mode.
        match kind {
            TokenKind::NewKw => {
                idx = skip_allocation(tokens, i + 1, end);
                prev = Some(TokenKind::NewKw);
                continue;
            }
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => {
                idx = skip_past_braced_body(tokens, i + 1, end);
                prev = Some(kind);
                continue;
            }
            _ => {}
        }

        if header_starts_here(source, tokens, i, end, prev, enclosing_type) {
            return Some(i);
        }
        prev = Some(kind);
        idx = i + 1;
    }
    None
}

fn header_starts_here(
    source: &str,
    tokens: &[Token],
    i: usize,
    end: usize,
    prev: Option<TokenKind>,
    enclosing_type: &str,
) -> bool {
    let nth = |n: usize| -> TokenKind {
        let mut idx = i;
        let mut remaining = n;
        while idx < end {
            if !tokens[idx].kind.is_trivia() {
                if remaining == 0 {
                    return tokens[idx].kind;
                }
                remaining -= 1;
            }
            idx += 1;
        }
        TokenKind::Eof
    };
    let nth_text = |n: usize| -> &str {
        let mut idx = i;
        let mut remaining = n;
        while idx < end {
            if !tokens[idx].kind.is_trivia() {
                if remaining == 0 {
                    return tokens[idx].text(source);
                }
                remaining -= 1;
            }
            idx += 1;
        }
        ""
    };

    let t0 = nth(0);
    // A receiver position (`a.b(`) or allocation (`new X(`) never opens a
    // member header.
    let receiver_context = matches!(prev, Some(TokenKind::Dot | TokenKind::NewKw));

    if t0.is_modifier_keyword() || t0 == TokenKind::At {
        return true;
    }
    let type_start = t0.is_primitive_type() || t0 == TokenKind::VoidKw;
    if (type_start || t0 == TokenKind::Identifier && !receiver_context)
        && nth(1) == TokenKind::Identifier
        && nth(2) == TokenKind::LParen
    {
        return true;
    }
    // Constructor guard: a bare `name(` run is only a constructor when the
    // name matches the enclosing type.
    if t0 == TokenKind::Identifier
        && !receiver_context
        && nth(1) == TokenKind::LParen
        && nth_text(0) == enclosing_type
    {
        return true;
    }
    false
}

/// Skip an allocation's type, argument list and (anonymous) class body,
/// returning the index just past it.
fn skip_allocation(tokens: &[Token], mut idx: usize, end: usize) -> usize {
    // Type tokens until `(`, `{`, or something that ends the allocation.
    while idx < end {
        match tokens[idx].kind {
            TokenKind::LParen => {
                idx = skip_balanced_raw(tokens, idx, end, TokenKind::LParen, TokenKind::RParen);
                break;
            }
            TokenKind::LBrace | TokenKind::Semicolon | TokenKind::RBrace => break,
            _ => idx += 1,
        }
    }
    // Anonymous class body.
    let mut i = idx;
    while i < end && tokens[i].kind.is_trivia() {
        i += 1;
    }
    if i < end && tokens[i].kind == TokenKind::LBrace {
        return skip_balanced_raw(tokens, i, end, TokenKind::LBrace, TokenKind::RBrace);
    }
    idx
}

/// Skip forward past the next balanced `{...}` (a local type's body).
fn skip_past_braced_body(tokens: &[Token], mut idx: usize, end: usize) -> usize {
    while idx < end {
        match tokens[idx].kind {
            TokenKind::LBrace => {
                return skip_balanced_raw(tokens, idx, end, TokenKind::LBrace, TokenKind::RBrace)
            }
            TokenKind::Semicolon => return idx + 1,
            _ => idx += 1,
        }
    }
    idx
}

/// `idx` points at `open`; returns the index just past its matching close
/// (or `end`).
fn skip_balanced_raw(
    tokens: &[Token],
    idx: usize,
    end: usize,
    open: TokenKind,
    close: TokenKind,
) -> usize {
    let mut depth = 0usize;
    let mut i = idx;
    while i < end {
        let kind = tokens[i].kind;
        if kind == open {
            depth += 1;
        } else if kind == close {
            depth -= 1;
            if depth == 0 {
                return i + 1;
            }
        }
        i += 1;
    }
    end
}
