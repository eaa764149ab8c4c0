//! Lexer for MiniCPU assembly.
//!
//! The lexer converts source text into a stream of tokens. It is line
//! oriented: newlines are tokens, since every instruction occupies exactly
//! one line. Comments run from `;` to the end of the line and are dropped.

use crate::token::{Span, Token, TokenKind};

/// Lexer for MiniCPU assembly source.
pub struct Lexer<'src> {
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_blanks();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            '"' => self.scan_string(),
            _ => self.scan_word(),
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes the whole source, ending with an `Eof` token.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Skips spaces, tabs, carriage returns, and comments. Newlines stay.
    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == ';' {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else if c != '\n' && c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scans a string literal. No escape processing; the literal may not
    /// span lines.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    return TokenKind::Str(text);
                }
                Some('\n') | None => {
                    return TokenKind::Error("unterminated string literal".to_string());
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_word(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || matches!(c, ',' | ';' | '"') {
                break;
            }
            text.push(c);
            self.advance();
        }
        TokenKind::Word(text)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
