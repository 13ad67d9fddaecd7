//! Error-tolerant Java parsing in two passes.
//!
//! The diet pass ([`parse_diet`]) recognizes declaration structure and skips
//! method bodies in balanced-brace mode, recording each skipped span. Bodies
//! can then be attached individually ([`DietParse::parse_body`]) or all at
//! once ([`DietParse::with_bodies`] / [`parse_full`]). Every pass yields a
//! tree plus diagnostics; only a lexical error that swallows the rest of the
//! input aborts a parse.

pub mod ast;
pub mod language_level;
pub mod lexer;
pub mod literals;
mod parse;
pub mod printer;
pub mod token;

#[cfg(test)]
mod tests;

use quill_core::Diagnostic;

use ast::{Block, BodyRef, CompilationUnit, Expr, FieldInit, MemberDecl, SkippedBodySpan};
use lexer::LexError;
use token::Token;

pub use language_level::{JavaFeature, JavaLanguageLevel};
pub use parse::CompletionCapture;

/// Knobs for a single parse. The defaults give the most tolerant parse:
/// both recovery tiers on, string-literal folding on, newest language level.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Stop after the diet pass; bodies stay skipped.
    pub diet_only: bool,
    /// Keep the parsed prefix of a malformed body and resynchronize at
    /// statement boundaries. Off: a malformed body collapses to an empty
    /// block.
    pub methods_full_recovery: bool,
    /// Materialize local and anonymous type declarations inside bodies.
    pub statements_recovery: bool,
    /// Fold `"a" + "b"` into a single string literal node.
    pub optimize_string_literals: bool,
    pub language_level: JavaLanguageLevel,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            diet_only: false,
            methods_full_recovery: true,
            statements_recovery: true,
            optimize_string_literals: true,
            language_level: JavaLanguageLevel::default(),
        }
    }
}

/// A lexical error after which no useful token stream exists (unterminated
/// block comment or text block: the rest of the input is inside it).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FatalLexError(pub LexError);

/// Result of the diet pass. Holds the token array so skipped spans can be
/// re-entered without re-lexing.
#[derive(Debug)]
pub struct DietParse<'a> {
    pub source: &'a str,
    pub unit: CompilationUnit,
    pub skipped: Vec<SkippedBodySpan>,
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
    pub completion: Option<CompletionCapture>,
}

/// One body, re-parsed out of a [`DietParse`].
#[derive(Debug)]
pub struct BodyParse {
    pub block: Block,
    pub diagnostics: Vec<Diagnostic>,
    pub completion: Option<CompletionCapture>,
}

/// A fully-attached (or deliberately diet) parse.
#[derive(Debug)]
pub struct Parse {
    pub unit: CompilationUnit,
    pub diagnostics: Vec<Diagnostic>,
    pub completion: Option<CompletionCapture>,
}

/// An expression fragment parse (field initializers, detached snippets).
#[derive(Debug)]
pub struct ExprParse {
    pub expr: Expr,
    pub diagnostics: Vec<Diagnostic>,
    pub completion: Option<CompletionCapture>,
}

/// Run the diet pass over `source`.
pub fn parse_diet<'a>(source: &'a str, options: &ParseOptions) -> Result<DietParse<'a>, FatalLexError> {
    let (tokens, lex_errors) = lexer::lex_with_errors(source);
    if let Some(fatal) = lex_errors.iter().find(|e| e.fatal) {
        return Err(FatalLexError(fatal.clone()));
    }
    let mut parsed = parse_diet_tokens(source, tokens, options);
    let mut diagnostics: Vec<Diagnostic> = lex_errors
        .into_iter()
        .map(|e| Diagnostic::error("LEX", e.message, e.range))
        .collect();
    diagnostics.append(&mut parsed.diagnostics);
    parsed.diagnostics = diagnostics;
    Ok(parsed)
}

/// Diet pass over an already-lexed (possibly synthetically modified) token
/// stream. The stream must end with a zero-width `Eof` token. Never fails:
/// callers that alter the stream have already decided to parse it.
pub fn parse_diet_tokens<'a>(
    source: &'a str,
    tokens: Vec<Token>,
    options: &ParseOptions,
) -> DietParse<'a> {
    let output = parse::diet::run(source, &tokens, options);
    DietParse {
        source,
        unit: output.unit,
        skipped: output.skipped,
        tokens,
        diagnostics: output.diagnostics,
        completion: output.completion,
    }
}

impl<'a> DietParse<'a> {
    /// Re-parse one skipped body at statement level. `None` for an unknown
    /// id. The diet tree is untouched; attachment is the caller's move.
    pub fn parse_body(&self, id: ast::BodyId, options: &ParseOptions) -> Option<BodyParse> {
        let span = self.skipped.get(id)?;
        let output = parse::body::parse_block_range(
            self.source,
            &self.tokens,
            (span.tokens.0 + 1, span.tokens.1),
            span.span,
            options,
        );
        Some(BodyParse {
            block: output.block,
            diagnostics: output.diagnostics,
            completion: output.completion,
        })
    }

    /// Parse a field initializer recorded by the diet pass. `None` when the
    /// initializer is absent or already parsed.
    pub fn parse_initializer(&self, init: &FieldInit, options: &ParseOptions) -> Option<ExprParse> {
        let FieldInit::Skipped { tokens, .. } = init else {
            return None;
        };
        let (expr, diagnostics, completion) =
            parse::body::parse_expr_range(self.source, &self.tokens, *tokens, options);
        Some(ExprParse {
            expr,
            diagnostics,
            completion,
        })
    }

    /// Attach every skipped body and field initializer, yielding a full
    /// tree. The diet result stays usable afterwards.
    pub fn with_bodies(&self, options: &ParseOptions) -> Parse {
        let mut unit = self.unit.clone();
        let mut diagnostics = self.diagnostics.clone();
        let mut completion = self.completion.clone();
        for decl in &mut unit.types {
            self.attach_type(decl, options, &mut diagnostics, &mut completion);
        }
        Parse {
            unit,
            diagnostics,
            completion,
        }
    }

    fn attach_type(
        &self,
        decl: &mut ast::TypeDecl,
        options: &ParseOptions,
        diagnostics: &mut Vec<Diagnostic>,
        completion: &mut Option<CompletionCapture>,
    ) {
        for member in &mut decl.members {
            match member {
                MemberDecl::Field(field) => {
                    if let Some(parsed) = self.parse_initializer(&field.init, options) {
                        diagnostics.extend(parsed.diagnostics);
                        if completion.is_none() {
                            *completion = parsed.completion;
                        }
                        field.init = FieldInit::Parsed(parsed.expr);
                    }
                }
                MemberDecl::Method(method) => {
                    self.attach_body(&mut method.body, options, diagnostics, completion);
                }
                MemberDecl::Constructor(ctor) => {
                    self.attach_body(&mut ctor.body, options, diagnostics, completion);
                }
                MemberDecl::Initializer(init) => {
                    self.attach_body(&mut init.body, options, diagnostics, completion);
                }
                MemberDecl::Type(nested) => {
                    self.attach_type(nested, options, diagnostics, completion);
                }
            }
        }
    }

    fn attach_body(
        &self,
        body: &mut BodyRef,
        options: &ParseOptions,
        diagnostics: &mut Vec<Diagnostic>,
        completion: &mut Option<CompletionCapture>,
    ) {
        let BodyRef::Skipped(id) = *body else {
            return;
        };
        let Some(parsed) = self.parse_body(id, options) else {
            return;
        };
        diagnostics.extend(parsed.diagnostics);
        if completion.is_none() {
            *completion = parsed.completion;
        }
        *body = BodyRef::Parsed(parsed.block);
    }
}

/// Diet pass plus attachment of every body, in one call.
pub fn parse_full(source: &str, options: &ParseOptions) -> Result<Parse, FatalLexError> {
    let diet = parse_diet(source, options)?;
    Ok(diet.with_bodies(options))
}

/// Parse honoring [`ParseOptions::diet_only`].
pub fn parse(source: &str, options: &ParseOptions) -> Result<Parse, FatalLexError> {
    if options.diet_only {
        let diet = parse_diet(source, options)?;
        Ok(Parse {
            unit: diet.unit,
            diagnostics: diet.diagnostics,
            completion: diet.completion,
        })
    } else {
        parse_full(source, options)
    }
}

/// Parse a standalone expression snippet.
pub fn parse_expression(source: &str, options: &ParseOptions) -> Result<ExprParse, FatalLexError> {
    let (tokens, lex_errors) = lexer::lex_with_errors(source);
    if let Some(fatal) = lex_errors.iter().find(|e| e.fatal) {
        return Err(FatalLexError(fatal.clone()));
    }
    let end = tokens.len();
    let (expr, mut diagnostics, completion) =
        parse::body::parse_expr_range(source, &tokens, (0, end), options);
    let mut all: Vec<Diagnostic> = lex_errors
        .into_iter()
        .map(|e| Diagnostic::error("LEX", e.message, e.range))
        .collect();
    all.append(&mut diagnostics);
    Ok(ExprParse {
        expr,
        diagnostics: all,
        completion,
    })
}

