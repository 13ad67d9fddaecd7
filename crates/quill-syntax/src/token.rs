use quill_core::Span;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Token kind produced by the lexer.
///
/// This enum is intentionally "fat": a stable, closed set of kinds is a
/// prerequisite for the multi-pass parsers, which key skipped-body spans by
/// token index and must agree on token boundaries across passes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr, Deserialize_repr,
)]
#[repr(u16)]
pub enum TokenKind {
    // --- Trivia ---
    Whitespace,
    LineComment,
    BlockComment,
    DocComment,

    // --- Identifiers & literals ---
    Identifier,
    IntLiteral,
    LongLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    StringLiteral,
    TextBlock,

    // --- Keywords (reserved) ---
    AbstractKw,
    AssertKw,
    BooleanKw,
    BreakKw,
    ByteKw,
    CaseKw,
    CatchKw,
    CharKw,
    ClassKw,
    ConstKw,
    ContinueKw,
    DefaultKw,
    DoKw,
    DoubleKw,
    ElseKw,
    EnumKw,
    ExtendsKw,
    FinalKw,
    FinallyKw,
    FloatKw,
    ForKw,
    GotoKw,
    IfKw,
    ImplementsKw,
    ImportKw,
    InstanceofKw,
    IntKw,
    InterfaceKw,
    LongKw,
    NativeKw,
    NewKw,
    PackageKw,
    PrivateKw,
    ProtectedKw,
    PublicKw,
    ReturnKw,
    ShortKw,
    StaticKw,
    StrictfpKw,
    SuperKw,
    SwitchKw,
    SynchronizedKw,
    ThisKw,
    ThrowKw,
    ThrowsKw,
    TransientKw,
    TryKw,
    VoidKw,
    VolatileKw,
    WhileKw,

    // Literal keywords.
    TrueKw,
    FalseKw,
    NullKw,

    // --- Contextual / restricted keywords ---
    VarKw,
    YieldKw,
    RecordKw,
    SealedKw,
    PermitsKw,
    NonSealedKw,

    // --- Operators / punctuation ---
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Ellipsis,
    At,
    Question,
    Colon,
    DoubleColon,
    Arrow,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Tilde,
    Bang,

    Eq,
    EqEq,
    BangEq,

    Less,
    LessEq,
    Greater,
    GreaterEq,

    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,

    PlusPlus,
    MinusMinus,

    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    LeftShift,
    RightShift,
    UnsignedRightShift,
    LeftShiftEq,
    RightShiftEq,
    UnsignedRightShiftEq,

    // --- Special ---
    /// Synthetic identifier standing in for whatever is being typed at the
    /// completion cursor. Never produced by the lexer; injected by the
    /// completion driver. Its text is the partial identifier prefix.
    CompletionIdent,
    Error,
    Eof,

    __Last,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::DocComment
        )
    }

    pub fn is_contextual_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::VarKw
                | TokenKind::YieldKw
                | TokenKind::RecordKw
                | TokenKind::SealedKw
                | TokenKind::PermitsKw
                | TokenKind::NonSealedKw
        )
    }

    pub fn is_identifier_like(self) -> bool {
        self == TokenKind::Identifier
            || self == TokenKind::CompletionIdent
            || self.is_contextual_keyword()
    }

    pub fn is_modifier_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::PublicKw
                | TokenKind::PrivateKw
                | TokenKind::ProtectedKw
                | TokenKind::StaticKw
                | TokenKind::AbstractKw
                | TokenKind::FinalKw
                | TokenKind::NativeKw
                | TokenKind::SynchronizedKw
                | TokenKind::TransientKw
                | TokenKind::VolatileKw
                | TokenKind::StrictfpKw
                | TokenKind::DefaultKw
                | TokenKind::SealedKw
                | TokenKind::NonSealedKw
        )
    }

    pub fn is_primitive_type(self) -> bool {
        matches!(
            self,
            TokenKind::BooleanKw
                | TokenKind::ByteKw
                | TokenKind::ShortKw
                | TokenKind::IntKw
                | TokenKind::LongKw
                | TokenKind::CharKw
                | TokenKind::FloatKw
                | TokenKind::DoubleKw
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::CharLiteral
                | TokenKind::StringLiteral
                | TokenKind::TextBlock
                | TokenKind::TrueKw
                | TokenKind::FalseKw
                | TokenKind::NullKw
        )
    }

    pub fn from_keyword(text: &str) -> Option<TokenKind> {
        Some(match text {
            "abstract" => TokenKind::AbstractKw,
            "assert" => TokenKind::AssertKw,
            "boolean" => TokenKind::BooleanKw,
            "break" => TokenKind::BreakKw,
            "byte" => TokenKind::ByteKw,
            "case" => TokenKind::CaseKw,
            "catch" => TokenKind::CatchKw,
            "char" => TokenKind::CharKw,
            "class" => TokenKind::ClassKw,
            "const" => TokenKind::ConstKw,
            "continue" => TokenKind::ContinueKw,
            "default" => TokenKind::DefaultKw,
            "do" => TokenKind::DoKw,
            "double" => TokenKind::DoubleKw,
            "else" => TokenKind::ElseKw,
            "enum" => TokenKind::EnumKw,
            "extends" => TokenKind::ExtendsKw,
            "final" => TokenKind::FinalKw,
            "finally" => TokenKind::FinallyKw,
            "float" => TokenKind::FloatKw,
            "for" => TokenKind::ForKw,
            "goto" => TokenKind::GotoKw,
            "if" => TokenKind::IfKw,
            "implements" => TokenKind::ImplementsKw,
            "import" => TokenKind::ImportKw,
            "instanceof" => TokenKind::InstanceofKw,
            "int" => TokenKind::IntKw,
            "interface" => TokenKind::InterfaceKw,
            "long" => TokenKind::LongKw,
            "native" => TokenKind::NativeKw,
            "new" => TokenKind::NewKw,
            "package" => TokenKind::PackageKw,
            "private" => TokenKind::PrivateKw,
            "protected" => TokenKind::ProtectedKw,
            "public" => TokenKind::PublicKw,
            "return" => TokenKind::ReturnKw,
            "short" => TokenKind::ShortKw,
            "static" => TokenKind::StaticKw,
            "strictfp" => TokenKind::StrictfpKw,
            "super" => TokenKind::SuperKw,
            "switch" => TokenKind::SwitchKw,
            "synchronized" => TokenKind::SynchronizedKw,
            "this" => TokenKind::ThisKw,
            "throw" => TokenKind::ThrowKw,
            "throws" => TokenKind::ThrowsKw,
            "transient" => TokenKind::TransientKw,
            "try" => TokenKind::TryKw,
            "void" => TokenKind::VoidKw,
            "volatile" => TokenKind::VolatileKw,
            "while" => TokenKind::WhileKw,

            "true" => TokenKind::TrueKw,
            "false" => TokenKind::FalseKw,
            "null" => TokenKind::NullKw,

            "var" => TokenKind::VarKw,
            "yield" => TokenKind::YieldKw,
            "record" => TokenKind::RecordKw,
            "sealed" => TokenKind::SealedKw,
            "permits" => TokenKind::PermitsKw,

            _ => return None,
        })
    }
}

/// A lexed token. Immutable once produced; text is a slice of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.start..self.range.end]
    }
}
