use quill_core::Span;

use crate::token::{Token, TokenKind};

/// A lexical error. Most of these still produce an `Error` token so the
/// parsers can keep going; only [`crate::FatalLexError`] aborts a parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub range: Span,
    /// Set when the error swallows the rest of the input (unterminated
    /// block comment or text block), leaving nothing for a parse to use.
    pub fatal: bool,
}

/// Lex `input` into a token vector ending with a zero-width `Eof` token.
///
/// Trivia (whitespace and comments) is kept in the stream; the parsers skip
/// it by kind. Tokens store byte ranges into `input`.
pub fn lex(input: &str) -> Vec<Token> {
    lex_with_errors(input).0
}

pub fn lex_with_errors(input: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        range: Span::empty(input.len()),
    });
    (tokens, lexer.errors)
}

pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Lexer {
            text,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_char2(&self) -> Option<char> {
        let mut chars = self.remaining().chars();
        chars.next();
        chars.next()
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&mut self, message: impl Into<String>, range: Span) {
        self.errors.push(LexError {
            message: message.into(),
            range,
            fatal: false,
        });
    }

    fn fatal_error(&mut self, message: impl Into<String>, range: Span) {
        self.errors.push(LexError {
            message: message.into(),
            range,
            fatal: true,
        });
    }

    fn next_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let ch = self.peek_char()?;

        let kind = if ch.is_whitespace() {
            self.lex_whitespace()
        } else if self.remaining().starts_with("//") {
            self.lex_line_comment()
        } else if self.remaining().starts_with("/*") {
            self.lex_block_comment(start)
        } else if self.remaining().starts_with("\"\"\"") {
            self.lex_text_block(start)
        } else if ch == '"' {
            self.lex_string_literal(start)
        } else if ch == '\'' {
            self.lex_char_literal(start)
        } else if ch.is_ascii_digit() || (ch == '.' && self.peek_char2().is_some_and(|c| c.is_ascii_digit())) {
            self.lex_number()
        } else if is_ident_start(ch) {
            self.lex_identifier_or_keyword(start)
        } else {
            self.lex_operator(start)
        };

        Some(Token {
            kind,
            range: Span::new(start, self.pos),
        })
    }

    fn lex_whitespace(&mut self) -> TokenKind {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.bump_char();
        }
        TokenKind::Whitespace
    }

    fn lex_line_comment(&mut self) -> TokenKind {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.bump_char();
        }
        TokenKind::LineComment
    }

    fn lex_block_comment(&mut self, start: usize) -> TokenKind {
        let is_doc = self.remaining().starts_with("/**") && !self.remaining().starts_with("/**/");
        self.bump_char();
        self.bump_char();
        loop {
            if self.remaining().is_empty() {
                self.fatal_error("unterminated block comment", Span::new(start, self.pos));
                return TokenKind::Error;
            }
            if self.remaining().starts_with("*/") {
                self.bump_char();
                self.bump_char();
                break;
            }
            self.bump_char();
        }
        if is_doc {
            TokenKind::DocComment
        } else {
            TokenKind::BlockComment
        }
    }

    fn lex_string_literal(&mut self, start: usize) -> TokenKind {
        self.bump_char(); // opening quote
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    self.error("unterminated string literal", Span::new(start, self.pos));
                    return TokenKind::Error;
                }
                Some('"') => {
                    self.bump_char();
                    return TokenKind::StringLiteral;
                }
                Some('\\') => {
                    self.bump_char();
                    self.bump_char();
                }
                Some(_) => {
                    self.bump_char();
                }
            }
        }
    }

    fn lex_text_block(&mut self, start: usize) -> TokenKind {
        self.pos += 3;
        loop {
            if self.remaining().is_empty() {
                self.fatal_error("unterminated text block", Span::new(start, self.pos));
                return TokenKind::Error;
            }
            if self.remaining().starts_with("\"\"\"") {
                self.pos += 3;
                return TokenKind::TextBlock;
            }
            if self.remaining().starts_with('\\') {
                self.bump_char();
            }
            self.bump_char();
        }
    }

    fn lex_char_literal(&mut self, start: usize) -> TokenKind {
        self.bump_char(); // opening quote
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    self.error("unterminated character literal", Span::new(start, self.pos));
                    return TokenKind::Error;
                }
                Some('\'') => {
                    self.bump_char();
                    return TokenKind::CharLiteral;
                }
                Some('\\') => {
                    self.bump_char();
                    self.bump_char();
                }
                Some(_) => {
                    self.bump_char();
                }
            }
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let mut is_float = false;

        if self.remaining().starts_with("0x") || self.remaining().starts_with("0X") {
            self.bump_char();
            self.bump_char();
            self.eat_digits(16);
        } else if self.remaining().starts_with("0b") || self.remaining().starts_with("0B") {
            self.bump_char();
            self.bump_char();
            self.eat_digits(2);
        } else {
            self.eat_digits(10);
            if self.peek_char() == Some('.') && self.peek_char2().is_none_or(|c| c.is_ascii_digit()) {
                is_float = true;
                self.bump_char();
                self.eat_digits(10);
            }
            if matches!(self.peek_char(), Some('e' | 'E')) {
                let save = self.pos;
                self.bump_char();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.bump_char();
                }
                if matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                    is_float = true;
                    self.eat_digits(10);
                } else {
                    self.pos = save;
                }
            }
        }

        match self.peek_char() {
            Some('l' | 'L') => {
                self.bump_char();
                TokenKind::LongLiteral
            }
            Some('f' | 'F') => {
                self.bump_char();
                TokenKind::FloatLiteral
            }
            Some('d' | 'D') => {
                self.bump_char();
                TokenKind::DoubleLiteral
            }
            _ if is_float => TokenKind::DoubleLiteral,
            _ => TokenKind::IntLiteral,
        }
    }

    fn eat_digits(&mut self, radix: u32) {
        while let Some(c) = self.peek_char() {
            if c.is_digit(radix) || c == '_' {
                self.bump_char();
            } else {
                break;
            }
        }
    }

    fn lex_identifier_or_keyword(&mut self, start: usize) -> TokenKind {
        self.bump_char();
        while matches!(self.peek_char(), Some(c) if is_ident_continue(c)) {
            self.bump_char();
        }
        let text = &self.text[start..self.pos];
        // `non-sealed` is the only hyphenated keyword; stitch it here so the
        // parsers never have to look across three tokens.
        if text == "non"
            && self.peek_char() == Some('-')
            && self.remaining()[1..].starts_with("sealed")
            && !self.remaining()[1 + "sealed".len()..]
                .chars()
                .next()
                .is_some_and(is_ident_continue)
        {
            self.pos += 1 + "sealed".len();
            return TokenKind::NonSealedKw;
        }
        TokenKind::from_keyword(text).unwrap_or(TokenKind::Identifier)
    }

    fn lex_operator(&mut self, start: usize) -> TokenKind {
        let ch = self.bump_char().expect("caller checked non-empty");
        let followed_by = |lexer: &Self, s: &str| lexer.remaining().starts_with(s);

        match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '@' => TokenKind::At,
            '?' => TokenKind::Question,
            '~' => TokenKind::Tilde,
            '.' => {
                if followed_by(self, "..") {
                    self.pos += 2;
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            ':' => {
                if followed_by(self, ":") {
                    self.pos += 1;
                    TokenKind::DoubleColon
                } else {
                    TokenKind::Colon
                }
            }
            '+' => self.op2([("+", TokenKind::PlusPlus), ("=", TokenKind::PlusEq)], TokenKind::Plus),
            '-' => {
                if followed_by(self, ">") {
                    self.pos += 1;
                    TokenKind::Arrow
                } else {
                    self.op2([("-", TokenKind::MinusMinus), ("=", TokenKind::MinusEq)], TokenKind::Minus)
                }
            }
            '*' => self.op2([("=", TokenKind::StarEq), ("", TokenKind::Star)], TokenKind::Star),
            '/' => self.op2([("=", TokenKind::SlashEq), ("", TokenKind::Slash)], TokenKind::Slash),
            '%' => self.op2([("=", TokenKind::PercentEq), ("", TokenKind::Percent)], TokenKind::Percent),
            '^' => self.op2([("=", TokenKind::CaretEq), ("", TokenKind::Caret)], TokenKind::Caret),
            '!' => self.op2([("=", TokenKind::BangEq), ("", TokenKind::Bang)], TokenKind::Bang),
            '=' => self.op2([("=", TokenKind::EqEq), ("", TokenKind::Eq)], TokenKind::Eq),
            '&' => self.op2([("&", TokenKind::AmpAmp), ("=", TokenKind::AmpEq)], TokenKind::Amp),
            '|' => self.op2([("|", TokenKind::PipePipe), ("=", TokenKind::PipeEq)], TokenKind::Pipe),
            '<' => {
                if followed_by(self, "<=") {
                    self.pos += 2;
                    TokenKind::LeftShiftEq
                } else if followed_by(self, "<") {
                    self.pos += 1;
                    TokenKind::LeftShift
                } else if followed_by(self, "=") {
                    self.pos += 1;
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if followed_by(self, ">>=") {
                    self.pos += 3;
                    TokenKind::UnsignedRightShiftEq
                } else if followed_by(self, ">>") {
                    self.pos += 2;
                    TokenKind::UnsignedRightShift
                } else if followed_by(self, ">=") {
                    self.pos += 2;
                    TokenKind::RightShiftEq
                } else if followed_by(self, ">") {
                    self.pos += 1;
                    TokenKind::RightShift
                } else if followed_by(self, "=") {
                    self.pos += 1;
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            _ => {
                self.error(
                    format!("unexpected character `{ch}`"),
                    Span::new(start, self.pos),
                );
                TokenKind::Error
            }
        }
    }

    fn op2(&mut self, options: [(&str, TokenKind); 2], fallback: TokenKind) -> TokenKind {
        for (suffix, kind) in options {
            if !suffix.is_empty() && self.remaining().starts_with(suffix) {
                self.pos += suffix.len();
                return kind;
            }
        }
        fallback
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}
