//! Token types for MiniCPU assembly.
//!
//! Tokens are the output of the lexer and input to the decoder. The lexer
//! does not classify bare words; telling a register from a literal or a
//! function name is the decoder's job.

/// Position of a token in source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset where this span starts.
    pub start: usize,
    /// Byte offset where this span ends (exclusive).
    pub end: usize,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Returns the text this span covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this token ends a line (newline or end of input).
    #[must_use]
    pub const fn is_line_end(&self) -> bool {
        matches!(self.kind, TokenKind::Newline | TokenKind::Eof)
    }
}

/// Token types for MiniCPU assembly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare word: opcode, register, number, or function name.
    Word(String),
    /// A double-quoted string with the quotes stripped.
    Str(String),
    /// `,` separating operands.
    Comma,
    /// End of a source line.
    Newline,
    /// End of input.
    Eof,
    /// Something the lexer could not read, with a description.
    Error(String),
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Word(w) => write!(f, "{w}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Comma => write!(f, ","),
            Self::Newline => write!(f, "newline"),
            Self::Eof => write!(f, "end of input"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}
