//! Decoder for MiniCPU assembly.
//!
//! The decoder turns source text into a [`Program`]. Each non-blank line
//! holds one instruction: an opcode followed by its operands, separated by
//! whitespace and/or commas.
//!
//! Jump operands are 1-based source line numbers. Once every line is read
//! they are resolved to the address of the first instruction on or after
//! that line; a line past the last instruction resolves to the program
//! length, so jumping there ends the program cleanly.

use minicpu_foundation::{Address, Error, ErrorContext, ErrorKind, Register, Result, Word};

use crate::instruction::{Condition, Instruction, Operand, PrintArg};
use crate::lexer::Lexer;
use crate::program::{LabelMap, Program};
use crate::token::{Span, Token, TokenKind};

/// Decoder for MiniCPU assembly source.
pub struct Decoder<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Source text (for error messages).
    source: &'src str,
}

impl<'src> Decoder<'src> {
    /// Creates a new decoder for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            source,
        }
    }

    /// Decodes the whole source into a program.
    ///
    /// # Errors
    /// Returns the first decode error: malformed text, an unknown opcode, a
    /// bad operand, an arity mismatch, a duplicate function, or a jump to
    /// line 0.
    pub fn decode(mut self) -> Result<Program> {
        let mut instructions = Vec::new();
        let mut lines = Vec::new();
        let mut labels = LabelMap::new();

        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                    continue;
                }
                _ => {}
            }

            let span = self.current.span;
            let instruction = self.decode_line()?;
            if let Instruction::Func(name) = &instruction {
                labels
                    .insert(name, instructions.len() + 1)
                    .map_err(|e| locate(e, span))?;
            }
            instructions.push(instruction);
            lines.push(span.line);
        }

        // Jump targets hold raw line numbers until every line is known.
        for instruction in &mut instructions {
            if let Instruction::Jmp(target) | Instruction::Branch(_, target) = instruction {
                *target = resolve_line(&lines, *target);
            }
        }

        Ok(Program::with_labels(instructions, labels).with_source_lines(lines))
    }

    /// Decodes one instruction line, consuming its terminating newline.
    fn decode_line(&mut self) -> Result<Instruction> {
        let span = self.current.span;
        let opcode = match &self.current.kind {
            TokenKind::Word(word) => word.clone(),
            TokenKind::Error(msg) => return Err(self.error_at(span, msg)),
            other => return Err(self.error_at(span, &format!("expected opcode, found {other}"))),
        };
        let mnemonic = opcode.to_ascii_lowercase();
        let expected = arity(&mnemonic)
            .ok_or_else(|| locate(Error::new(ErrorKind::UnknownOpcode(opcode.clone())), span))?;
        self.advance();

        let operands = self.operands()?;
        if operands.len() != expected {
            return Err(locate(
                Error::new(ErrorKind::ArityMismatch {
                    opcode: mnemonic,
                    expected,
                    actual: operands.len(),
                }),
                span,
            ));
        }

        let instruction = match mnemonic.as_str() {
            "start" => Instruction::Start,
            "stop" => Instruction::Stop,
            "ret" => Instruction::Ret,
            "mov" => Instruction::Mov(register(&operands[0])?, operand(&operands[1])?),
            "add" => Instruction::Add(register(&operands[0])?, operand(&operands[1])?),
            "sub" => Instruction::Sub(register(&operands[0])?, operand(&operands[1])?),
            "cmp" => Instruction::Cmp(register(&operands[0])?, operand(&operands[1])?),
            "jmp" => Instruction::Jmp(line_number(&operands[0])?),
            "prn" => Instruction::Prn(print_arg(&operands[0])?),
            "push" => Instruction::Push(register(&operands[0])?),
            "pop" => Instruction::Pop(register(&operands[0])?),
            "func" => Instruction::Func(function_name(&operands[0])?),
            "call" => Instruction::Call(function_name(&operands[0])?),
            other => match Condition::from_mnemonic(other) {
                Some(condition) => Instruction::Branch(condition, line_number(&operands[0])?),
                None => {
                    return Err(locate(Error::new(ErrorKind::UnknownOpcode(opcode)), span));
                }
            },
        };
        Ok(instruction)
    }

    /// Collects operand tokens up to the end of the line.
    fn operands(&mut self) -> Result<Vec<Token>> {
        let mut operands = Vec::new();
        loop {
            match &self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                    break;
                }
                TokenKind::Comma => self.advance(),
                TokenKind::Word(_) | TokenKind::Str(_) => {
                    operands.push(self.current.clone());
                    self.advance();
                }
                TokenKind::Error(msg) => return Err(self.error_at(self.current.span, msg)),
            }
        }
        Ok(operands)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    /// Creates a parse error at a specific span.
    fn error_at(&self, span: Span, message: &str) -> Error {
        Error::parse(message, span.line, span.column, &self.context_at(span))
    }

    /// Gets the source line containing a span.
    fn context_at(&self, span: Span) -> String {
        let start = span.start.min(self.source.len());
        let line_start = self.source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.source[start..]
            .find('\n')
            .map_or(self.source.len(), |i| start + i);

        self.source[line_start..line_end].to_string()
    }
}

/// Decodes source text into a program.
///
/// # Errors
/// Returns an error if the source cannot be decoded.
pub fn decode(source: &str) -> Result<Program> {
    Decoder::new(source).decode()
}

/// Number of operands an opcode takes, or `None` if it is not an opcode.
fn arity(mnemonic: &str) -> Option<usize> {
    match mnemonic {
        "start" | "stop" | "ret" => Some(0),
        "mov" | "add" | "sub" | "cmp" => Some(2),
        "jmp" | "prn" | "push" | "pop" | "func" | "call" => Some(1),
        other => Condition::from_mnemonic(other).map(|_| 1),
    }
}

/// Address of the first instruction on or after a source line.
fn resolve_line(lines: &[u32], line: Address) -> Address {
    lines.partition_point(|&l| (l as usize) < line)
}

/// Attaches a source position to an error.
fn locate(err: Error, span: Span) -> Error {
    err.with_context(ErrorContext::new().with_position(span.line as usize, span.column as usize))
}

fn invalid(token: &Token, expected: &'static str) -> Error {
    locate(
        Error::new(ErrorKind::InvalidOperand {
            operand: token.kind.to_string(),
            expected,
        }),
        token.span,
    )
}

fn word_text(token: &Token) -> Option<&str> {
    match &token.kind {
        TokenKind::Word(word) => Some(word),
        _ => None,
    }
}

fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn register(token: &Token) -> Result<Register> {
    word_text(token)
        .and_then(Register::from_name)
        .ok_or_else(|| invalid(token, "register"))
}

fn operand(token: &Token) -> Result<Operand> {
    let Some(text) = word_text(token) else {
        return Err(invalid(token, "register or integer"));
    };
    if let Some(reg) = Register::from_name(text) {
        return Ok(Operand::Register(reg));
    }
    if !is_integer(text) {
        return Err(invalid(token, "register or integer"));
    }
    text.parse::<Word>()
        .map(Operand::Literal)
        .map_err(|_| invalid(token, "integer within word range"))
}

fn line_number(token: &Token) -> Result<Address> {
    let Some(text) = word_text(token).filter(|t| is_integer(t)) else {
        return Err(invalid(token, "line number"));
    };
    match text.parse::<Address>() {
        Ok(line) if line >= 1 => Ok(line),
        _ => Err(locate(
            Error::new(ErrorKind::InvalidJumpTarget(text.to_string())),
            token.span,
        )),
    }
}

fn print_arg(token: &Token) -> Result<PrintArg> {
    match &token.kind {
        TokenKind::Str(text) => Ok(PrintArg::Text(text.clone())),
        _ => register(token)
            .map(PrintArg::Register)
            .map_err(|_| invalid(token, "string or register")),
    }
}

fn function_name(token: &Token) -> Result<String> {
    let valid = word_text(token).filter(|name| {
        let mut chars = name.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && name.len() >= 2
            && chars.all(|c| c.is_ascii_alphanumeric())
    });
    valid
        .map(str::to_ascii_uppercase)
        .ok_or_else(|| invalid(token, "function name"))
}
